//! Dashboard query derivation over the note collection.
//!
//! Pure functions: nothing here mutates the store.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{Note, TRASH_RETENTION_MS};

/// Notes edited within this window count as recent (24 hours)
pub const RECENT_WINDOW_MS: i64 = 86_400_000;

const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoteFilter {
    #[default]
    All,
    Pinned,
    Recent,
    Trash,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteQuery {
    pub search: String,
    pub filter: NoteFilter,
    pub color: Option<String>,
}

impl NoteQuery {
    pub fn new(search: impl Into<String>, filter: NoteFilter, color: Option<String>) -> Self {
        NoteQuery {
            search: search.into(),
            filter,
            color,
        }
    }

    /// Text, then colour, then the trash split, then the smart filter.
    /// The trash view skips the smart filters entirely.
    pub fn matches(&self, note: &Note, now: i64) -> bool {
        if !self.search.is_empty() {
            let haystack = format!("{}{}", note.title, note.content).to_lowercase();
            if !haystack.contains(&self.search.to_lowercase()) {
                return false;
            }
        }

        if let Some(color) = &self.color {
            if note.color != *color {
                return false;
            }
        }

        if self.filter == NoteFilter::Trash {
            return note.is_trashed();
        }
        if note.is_trashed() {
            return false;
        }

        match self.filter {
            NoteFilter::Pinned => note.is_pinned,
            NoteFilter::Recent => now - note.updated_at < RECENT_WINDOW_MS,
            NoteFilter::All | NoteFilter::Trash => true,
        }
    }
}

/// Notes matching `query`, in collection order
pub fn filter_notes<'a>(notes: &'a [Note], query: &NoteQuery, now: i64) -> Vec<&'a Note> {
    notes.iter().filter(|n| query.matches(n, now)).collect()
}

pub fn active_count(notes: &[Note]) -> usize {
    notes.iter().filter(|n| !n.is_trashed()).count()
}

pub fn trash_count(notes: &[Note]) -> usize {
    notes.iter().filter(|n| n.is_trashed()).count()
}

/// When a trashed note becomes eligible for purge
pub fn purge_due_at(note: &Note) -> Option<i64> {
    note.deleted_at.map(|deleted_at| deleted_at + TRASH_RETENTION_MS)
}

/// Whole days (rounded up) until a trashed note is purged, 0 once due
pub fn days_until_purge(note: &Note, now: i64) -> Option<i64> {
    purge_due_at(note).map(|due| {
        let remaining = (due - now).max(0);
        (remaining + DAY_MS - 1) / DAY_MS
    })
}

/// Heading and hint shown when a view has no notes
pub fn empty_state_message(filter: NoteFilter) -> (&'static str, &'static str) {
    match filter {
        NoteFilter::Trash => (
            "Trash is empty",
            "Items in trash are removed after 7 days",
        ),
        _ => (
            "No notes found",
            "Try adjusting your filters or create a new one",
        ),
    }
}
