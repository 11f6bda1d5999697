//! Dashboard: searchable grid over every note, active and trashed.
//!
//! Holds only view-local selection (filter and colour); all note changes are
//! issued through the store.
use log::debug;

use crate::{
    active_count, filter_notes, trash_count, Note, NoteFilter, NoteQuery, NoteStore,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    filter: NoteFilter,
    selected_color: Option<String>,
}

/// Sidebar counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub active: usize,
    pub trash: usize,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> NoteFilter {
        self.filter
    }

    pub fn selected_color(&self) -> Option<&str> {
        self.selected_color.as_deref()
    }

    /// Switching views clears the colour selection
    pub fn select_filter(&mut self, filter: NoteFilter) {
        self.filter = filter;
        self.selected_color = None;
    }

    /// Selecting the already-selected colour clears it
    pub fn toggle_color(&mut self, color: &str) {
        if self.selected_color.as_deref() == Some(color) {
            self.selected_color = None;
        } else {
            self.selected_color = Some(color.to_string());
        }
    }

    pub fn query(&self, store: &NoteStore) -> NoteQuery {
        NoteQuery::new(
            store.search_query(),
            self.filter,
            self.selected_color.clone(),
        )
    }

    /// Notes shown in the grid for the current selection
    pub fn visible_notes<'s>(&self, store: &'s NoteStore) -> Vec<&'s Note> {
        filter_notes(store.notes(), &self.query(store), store.now())
    }

    pub fn counts(&self, store: &NoteStore) -> DashboardCounts {
        DashboardCounts {
            active: active_count(store.notes()),
            trash: trash_count(store.notes()),
        }
    }

    /// Opens a note's window and hides the dashboard. Trashed notes are not
    /// opened.
    pub fn open_note(&self, store: &mut NoteStore, id: &str) -> bool {
        let Some(note) = store.note(id) else {
            return false;
        };
        if note.is_trashed() {
            debug!("Refusing to open trashed note {}", id);
            return false;
        }

        if !note.is_open {
            store.toggle_note_window(id);
        }
        if store.settings().show_dashboard {
            store.toggle_dashboard();
        }
        true
    }

    pub fn create_note(&self, store: &mut NoteStore) -> String {
        store.add_note(None)
    }

    pub fn trash_note(&self, store: &mut NoteStore, id: &str) -> bool {
        store.delete_note(id)
    }

    pub fn restore_note(&self, store: &mut NoteStore, id: &str) -> bool {
        store.restore_note(id)
    }

    /// Caller is expected to have confirmed with the user
    pub fn purge_note(&self, store: &mut NoteStore, id: &str) -> bool {
        store.permanently_delete_note(id)
    }

    pub fn close(&self, store: &mut NoteStore) {
        if store.settings().show_dashboard {
            store.toggle_dashboard();
        }
    }
}
