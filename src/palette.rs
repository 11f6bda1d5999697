//! Fixed note colour palette.
//!
//! Notes only store the palette `id`; lookups are total and fall back to the
//! first entry for ids that are unknown or missing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub id: &'static str,
    pub background: &'static str,
    pub border: &'static str,
    /// Light backgrounds render with dark text
    pub is_light: bool,
}

const fn entry(
    id: &'static str,
    background: &'static str,
    border: &'static str,
    is_light: bool,
) -> PaletteEntry {
    PaletteEntry {
        id,
        background,
        border,
        is_light,
    }
}

pub const NOTE_COLORS: [PaletteEntry; 12] = [
    entry("slate", "#1e293b", "rgba(255,255,255,0.1)", false),
    entry("red", "#450a0a", "rgba(248, 113, 113, 0.2)", false),
    entry("amber", "#451a03", "rgba(251, 191, 36, 0.2)", false),
    entry("emerald", "#022c22", "rgba(52, 211, 153, 0.2)", false),
    entry("blue", "#172554", "rgba(96, 165, 250, 0.2)", false),
    entry("violet", "#2e1065", "rgba(167, 139, 250, 0.2)", false),
    entry("pink", "#500724", "rgba(244, 114, 182, 0.2)", false),
    entry("orange", "#431407", "rgba(251, 146, 60, 0.2)", false),
    entry("teal", "#134e4a", "rgba(45, 212, 191, 0.2)", false),
    entry("indigo", "#312e81", "rgba(129, 140, 248, 0.2)", false),
    entry("cool-gray", "#bdbdbd", "rgba(0, 0, 0, 0.1)", true),
    entry("off-white", "#efefef", "rgba(0, 0, 0, 0.1)", true),
];

/// Resolves a palette id, never failing
pub fn palette_lookup(id: &str) -> &'static PaletteEntry {
    NOTE_COLORS
        .iter()
        .find(|entry| entry.id == id)
        .unwrap_or(&NOTE_COLORS[0])
}

pub fn is_known_color(id: &str) -> bool {
    NOTE_COLORS.iter().any(|entry| entry.id == id)
}
