//! Core data structures for the memora application.
//!
//! This module contains the note entity, its window geometry, the partial
//! update record used by `NoteStore::update_note`, and the app-level settings.
use serde::{Deserialize, Serialize};

/// Width of a freshly created note window
pub const DEFAULT_NOTE_WIDTH: f64 = 320.0;
/// Height of a freshly created note window
pub const DEFAULT_NOTE_HEIGHT: f64 = 300.0;
/// Palette id given to new notes
pub const DEFAULT_COLOR: &str = "slate";

pub const MIN_OPACITY: f64 = 0.2;
pub const MAX_OPACITY: f64 = 1.0;

/// Window geometry and stacking order of a note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: i64,
}

/// Represents a single sticky note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, immutable after creation
    pub id: String,
    pub title: String,
    /// Formatted-text markup, stored as-is
    pub content: String,
    /// Palette entry id
    pub color: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub show_toolbar: bool,
    /// Set while the note sits in the trash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub position: NotePosition,
    /// Whether the floating window is visible
    #[serde(default)]
    pub is_open: bool,
}

fn default_opacity() -> f64 {
    MAX_OPACITY
}

fn default_true() -> bool {
    true
}

impl Note {
    /// Creates an empty, open note at the given position
    pub fn new(id: String, position: NotePosition, now: i64) -> Self {
        Note {
            id,
            title: String::new(),
            content: String::new(),
            color: DEFAULT_COLOR.to_string(),
            tags: Vec::new(),
            is_pinned: false,
            is_locked: false,
            opacity: MAX_OPACITY,
            show_toolbar: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            position,
            is_open: true,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Open and not in the trash, i.e. the window is on screen
    pub fn is_visible(&self) -> bool {
        self.is_open && !self.is_trashed()
    }

    /// Merges every field present in `patch` into this note.
    ///
    /// A position patch never changes `z_index`; stacking order is only
    /// assigned at creation and by `NoteStore::bring_to_front`.
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(is_pinned) = patch.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(is_locked) = patch.is_locked {
            self.is_locked = is_locked;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = clamp_opacity(opacity);
        }
        if let Some(show_toolbar) = patch.show_toolbar {
            self.show_toolbar = show_toolbar;
        }
        if let Some(position) = patch.position {
            self.position = NotePosition {
                z_index: self.position.z_index,
                ..position
            };
        }
        if let Some(is_open) = patch.is_open {
            self.is_open = is_open;
        }
    }
}

/// Clamps an opacity into the usable `[0.2, 1.0]` range. NaN maps to fully opaque.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return MAX_OPACITY;
    }
    opacity.clamp(MIN_OPACITY, MAX_OPACITY)
}

/// Partial update for a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
    pub opacity: Option<f64>,
    pub show_toolbar: Option<bool>,
    pub position: Option<NotePosition>,
    pub is_open: Option<bool>,
}

impl NotePatch {
    /// Patch carrying only new window geometry
    pub fn geometry(position: NotePosition) -> Self {
        NotePatch {
            position: Some(position),
            ..Default::default()
        }
    }

    /// Patch carrying only window visibility
    pub fn visibility(is_open: bool) -> Self {
        NotePatch {
            is_open: Some(is_open),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == NotePatch::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    Glass,
}

/// Process-wide UI state persisted alongside the notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_true")]
    pub show_dashboard: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            theme: ThemeMode::Glass,
            show_dashboard: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        Note::new(
            "n1".to_string(),
            NotePosition {
                x: 10.0,
                y: 20.0,
                width: DEFAULT_NOTE_WIDTH,
                height: DEFAULT_NOTE_HEIGHT,
                z_index: 4,
            },
            1_000,
        )
    }

    #[test]
    fn position_patch_keeps_stacking_order() {
        let mut note = sample();
        note.apply(NotePatch::geometry(NotePosition {
            x: 50.0,
            y: 60.0,
            width: 400.0,
            height: 300.0,
            z_index: 99,
        }));

        assert_eq!(note.position.x, 50.0);
        assert_eq!(note.position.width, 400.0);
        assert_eq!(note.position.z_index, 4);
    }

    #[test]
    fn opacity_is_clamped_when_applied() {
        let mut note = sample();
        note.apply(NotePatch {
            opacity: Some(0.05),
            ..Default::default()
        });
        assert_eq!(note.opacity, MIN_OPACITY);

        note.apply(NotePatch {
            opacity: Some(3.0),
            ..Default::default()
        });
        assert_eq!(note.opacity, MAX_OPACITY);
        assert_eq!(clamp_opacity(f64::NAN), MAX_OPACITY);
    }

    #[test]
    fn serializes_with_camel_case_and_omits_missing_deleted_at() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["showToolbar"], true);
        assert_eq!(json["position"]["zIndex"], 4);
        assert!(json.get("deletedAt").is_none());
    }

    #[test]
    fn deserializes_sparse_records_with_defaults() {
        let raw = r#"{
            "id": "a",
            "title": "t",
            "content": "<p>x</p>",
            "color": "blue",
            "createdAt": 1,
            "updatedAt": 2,
            "position": {"x": 1, "y": 2, "width": 320, "height": 300, "zIndex": 1},
            "someFutureField": {"nested": true}
        }"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.opacity, 1.0);
        assert!(note.show_toolbar);
        assert!(!note.is_open);
        assert!(note.tags.is_empty());
        assert_eq!(note.deleted_at, None);
    }
}
