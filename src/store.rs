//! The note store: single owner of the note collection and app settings.
//!
//! Every mutation goes through an action method (or [`NoteStore::dispatch`]),
//! is applied synchronously, and hands a full snapshot to the configured
//! [`StateSink`] when it changed something. Unknown ids are silent no-ops.
use std::sync::Arc;

use log::{debug, error, info};
use rand::Rng;
use uuid::Uuid;

use crate::{
    AppSettings, Clock, MemoraError, Note, NotePatch, NotePosition, PersistedState, Result,
    StateFile, StateSink, ThemeMode, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
};

/// How long a trashed note is kept before it may be purged (7 days)
pub const TRASH_RETENTION_MS: i64 = 604_800_000;

/// Anchor of the jittered placement used when no position is given
const DEFAULT_PLACEMENT: f64 = 100.0;
const PLACEMENT_JITTER: f64 = 50.0;

/// A mutation request against the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    AddNote { at: Option<(f64, f64)> },
    UpdateNote { id: String, patch: NotePatch },
    DeleteNote { id: String },
    RestoreNote { id: String },
    PermanentlyDeleteNote { id: String },
    CleanupTrash,
    ToggleNoteWindow { id: String },
    BringToFront { id: String },
    SetSearchQuery { query: String },
    ToggleDashboard,
    SetTheme { theme: ThemeMode },
}

pub struct NoteStore {
    notes: Vec<Note>,
    settings: AppSettings,
    search_query: String,
    clock: Arc<dyn Clock>,
    sink: Option<Box<dyn StateSink>>,
    persistence_failure: Option<String>,
}

impl NoteStore {
    /// Empty store that is not persisted anywhere
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_state(PersistedState::default(), clock)
    }

    /// Store seeded from a previously persisted record
    pub fn from_state(state: PersistedState, clock: Arc<dyn Clock>) -> Self {
        NoteStore {
            notes: state.notes,
            settings: state.settings,
            search_query: state.search_query,
            clock,
            sink: None,
            persistence_failure: None,
        }
    }

    /// Loads the record from `file` (or starts empty) and persists back to it
    /// synchronously on every change.
    pub fn open(file: StateFile, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = file.load()?.unwrap_or_default();
        Ok(Self::from_state(state, clock).with_sink(Box::new(file)))
    }

    pub fn with_sink(mut self, sink: Box<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Process-start housekeeping: purges expired trash, then creates a
    /// first note at `seed_at` if the collection is completely empty.
    pub fn on_startup(&mut self, seed_at: Option<(f64, f64)>) {
        let purged = self.cleanup_trash();
        if purged > 0 {
            info!("Purged {} expired notes from trash", purged);
        }

        if self.notes.is_empty() {
            if let Some(at) = seed_at {
                let id = self.add_note(Some(at));
                info!("Created initial note {}", id);
            }
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Highest stacking order across every note, 0 when empty
    pub fn max_z_index(&self) -> i64 {
        self.notes
            .iter()
            .map(|n| n.position.z_index)
            .fold(0, i64::max)
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            notes: self.notes.clone(),
            settings: self.settings.clone(),
            search_query: self.search_query.clone(),
        }
    }

    /// Applies an action, returning whether state changed
    pub fn dispatch(&mut self, action: StoreAction) -> bool {
        match action {
            StoreAction::AddNote { at } => {
                self.add_note(at);
                true
            }
            StoreAction::UpdateNote { id, patch } => self.update_note(&id, patch),
            StoreAction::DeleteNote { id } => self.delete_note(&id),
            StoreAction::RestoreNote { id } => self.restore_note(&id),
            StoreAction::PermanentlyDeleteNote { id } => self.permanently_delete_note(&id),
            StoreAction::CleanupTrash => self.cleanup_trash() > 0,
            StoreAction::ToggleNoteWindow { id } => self.toggle_note_window(&id),
            StoreAction::BringToFront { id } => self.bring_to_front(&id),
            StoreAction::SetSearchQuery { query } => self.set_search_query(query),
            StoreAction::ToggleDashboard => {
                self.toggle_dashboard();
                true
            }
            StoreAction::SetTheme { theme } => self.set_theme(theme),
        }
    }

    /// Creates an empty note on top of every other note and hides the
    /// dashboard. Returns the new id.
    pub fn add_note(&mut self, at: Option<(f64, f64)>) -> String {
        let now = self.now();
        let id = Uuid::new_v4().to_string();
        let (x, y) = at.unwrap_or_else(|| {
            let mut rng = rand::thread_rng();
            (
                DEFAULT_PLACEMENT + rng.gen_range(0.0..PLACEMENT_JITTER),
                DEFAULT_PLACEMENT + rng.gen_range(0.0..PLACEMENT_JITTER),
            )
        });

        let position = NotePosition {
            x,
            y,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            z_index: self.max_z_index() + 1,
        };

        debug!("Adding note {} at ({}, {})", id, x, y);
        self.notes.push(Note::new(id.clone(), position, now));
        self.settings.show_dashboard = false;
        self.commit();
        id
    }

    /// Merges `patch` into the note and refreshes `updated_at`, even when the
    /// patch is empty. A trashed note stays closed and unpinned.
    pub fn update_note(&mut self, id: &str, mut patch: NotePatch) -> bool {
        let now = self.now();
        let Some(note) = self.find_mut(id) else {
            return false;
        };

        if note.is_trashed() {
            if patch.is_open == Some(true) {
                debug!("Note {} is in the trash, not opening it", id);
                patch.is_open = None;
            }
            if patch.is_pinned == Some(true) {
                debug!("Note {} is in the trash, not pinning it", id);
                patch.is_pinned = None;
            }
        }
        note.apply(patch);
        note.updated_at = now;
        self.commit();
        true
    }

    /// Moves a note to the trash, closing and unpinning it.
    /// `updated_at` is left alone: this is a lifecycle change, not an edit.
    pub fn delete_note(&mut self, id: &str) -> bool {
        let now = self.now();
        let Some(note) = self.find_mut(id) else {
            return false;
        };

        note.deleted_at = Some(now);
        note.is_open = false;
        note.is_pinned = false;
        debug!("Note {} moved to trash", id);
        self.commit();
        true
    }

    /// Takes a note out of the trash. The window stays closed and the pin is
    /// not restored.
    pub fn restore_note(&mut self, id: &str) -> bool {
        let Some(note) = self.find_mut(id) else {
            return false;
        };
        if note.deleted_at.take().is_none() {
            return false;
        }

        debug!("Note {} restored from trash", id);
        self.commit();
        true
    }

    pub fn permanently_delete_note(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!("Permanent delete ignored, no note {}", id);
            return false;
        }

        info!("Note {} permanently deleted", id);
        self.commit();
        true
    }

    /// Removes every trashed note whose retention window has run out.
    /// Returns how many were purged.
    pub fn cleanup_trash(&mut self) -> usize {
        let now = self.now();
        let before = self.notes.len();
        self.notes.retain(|n| match n.deleted_at {
            Some(deleted_at) => now - deleted_at < TRASH_RETENTION_MS,
            None => true,
        });

        let purged = before - self.notes.len();
        if purged > 0 {
            debug!("Trash cleanup removed {} notes", purged);
            self.commit();
        }
        purged
    }

    /// Flips window visibility without touching `updated_at`
    /// Trashed notes have no window and are left alone.
    pub fn toggle_note_window(&mut self, id: &str) -> bool {
        let Some(note) = self.find_mut(id) else {
            return false;
        };
        if note.is_trashed() {
            debug!("Note {} is in the trash, not toggling its window", id);
            return false;
        }

        note.is_open = !note.is_open;
        self.commit();
        true
    }

    /// Raises a note above every other one. No-op if it already holds the
    /// highest stacking order.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        let max_z = self.max_z_index();
        let Some(note) = self.find_mut(id) else {
            return false;
        };
        if note.position.z_index == max_z {
            return false;
        }

        note.position.z_index = max_z + 1;
        self.commit();
        true
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if self.search_query == query {
            return false;
        }
        self.search_query = query;
        self.commit();
        true
    }

    pub fn toggle_dashboard(&mut self) {
        self.settings.show_dashboard = !self.settings.show_dashboard;
        self.commit();
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> bool {
        if self.settings.theme == theme {
            return false;
        }
        self.settings.theme = theme;
        self.commit();
        true
    }

    /// Last durable write failure, if the most recent write did not succeed
    pub fn persistence_failure(&self) -> Option<String> {
        self.persistence_failure.clone().or_else(|| {
            self.sink
                .as_ref()
                .and_then(|sink| sink.last_failure())
        })
    }

    /// `Err(PersistenceFailure)` while changes may not survive a restart
    pub fn check_persistence(&self) -> Result<()> {
        match (self.persistence_failure(), self.sink.as_ref()) {
            (Some(message), Some(sink)) => Err(MemoraError::PersistenceFailure {
                path: sink.location(),
                message,
            }),
            _ => Ok(()),
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Note> {
        let note = self.notes.iter_mut().find(|n| n.id == id);
        if note.is_none() {
            debug!("No note with id {}, ignoring", id);
        }
        note
    }

    fn commit(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        match sink.persist(&self.snapshot()) {
            Ok(()) => self.persistence_failure = None,
            Err(e) => {
                error!("Failed to persist note state: {}", e);
                self.persistence_failure = Some(e.to_string());
            }
        }
    }
}
