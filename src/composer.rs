//! Window composer: the set of open note windows and their gestures.
//!
//! Each window owns its own [`GestureTracker`]. Pointer moves only touch the
//! tracker's live frame; the store is written once when a gesture ends.
use std::collections::HashMap;

use log::debug;

use crate::{
    can_drag, can_resize, clamp_opacity, palette_lookup, Frame, GesturePhase, GestureTracker,
    Note, NotePatch, NotePosition, NoteStore, PaletteEntry, Pointer,
};

/// Everything the rendering layer needs to draw one note window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowView<'a> {
    pub note: &'a Note,
    /// Live gesture frame while dragging or resizing, persisted geometry otherwise
    pub frame: Frame,
    pub z_index: i64,
    pub opacity: f64,
    pub palette: &'static PaletteEntry,
    pub draggable: bool,
    pub resizable: bool,
    pub gesture: GesturePhase,
}

#[derive(Debug, Default)]
pub struct WindowComposer {
    trackers: HashMap<String, GestureTracker>,
}

impl WindowComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open, non-trashed notes, bottom of the stack first
    pub fn windows<'s>(&self, store: &'s NoteStore) -> Vec<WindowView<'s>> {
        let mut views: Vec<WindowView<'s>> = store
            .notes()
            .iter()
            .filter(|n| n.is_visible())
            .map(|note| {
                let tracker = self.trackers.get(&note.id);
                let frame = tracker
                    .and_then(|t| t.live_frame())
                    .unwrap_or_else(|| Frame::from(note.position));

                WindowView {
                    note,
                    frame,
                    z_index: note.position.z_index,
                    opacity: clamp_opacity(note.opacity),
                    palette: palette_lookup(&note.color),
                    draggable: can_drag(note),
                    resizable: can_resize(note),
                    gesture: tracker.map_or(GesturePhase::Idle, |t| t.phase()),
                }
            })
            .collect();

        views.sort_by_key(|v| v.z_index);
        views
    }

    /// Id of the window with a gesture in flight
    pub fn active_window(&self) -> Option<&str> {
        self.trackers
            .iter()
            .find(|(_, t)| t.is_active())
            .map(|(id, _)| id.as_str())
    }

    /// Pointer-down anywhere on a window raises it
    pub fn focus(&mut self, store: &mut NoteStore, id: &str) -> bool {
        store.bring_to_front(id)
    }

    /// Pointer-down on a window header
    pub fn header_pointer_down(&mut self, store: &mut NoteStore, id: &str, pointer: Pointer) -> bool {
        self.begin(store, id, pointer, GestureTracker::begin_drag)
    }

    /// Pointer-down on a window's resize handle
    pub fn resize_pointer_down(&mut self, store: &mut NoteStore, id: &str, pointer: Pointer) -> bool {
        self.begin(store, id, pointer, GestureTracker::begin_resize)
    }

    fn begin(
        &mut self,
        store: &mut NoteStore,
        id: &str,
        pointer: Pointer,
        start: fn(&mut GestureTracker, &Note, Pointer) -> bool,
    ) -> bool {
        if self.active_window().is_some() {
            return false;
        }
        let Some(note) = store.note(id).filter(|n| n.is_visible()) else {
            debug!("No open window for note {}", id);
            return false;
        };
        if note.is_locked {
            debug!("Note {} is locked, ignoring pointer-down", id);
            return false;
        }

        store.bring_to_front(id);
        let Some(note) = store.note(id) else {
            return false;
        };
        let tracker = self.trackers.entry(id.to_string()).or_default();
        start(tracker, note, pointer)
    }

    /// Pointer moved anywhere on screen. Returns the new live frame of the
    /// window being dragged or resized.
    pub fn pointer_move(&mut self, pointer: Pointer) -> Option<Frame> {
        self.trackers
            .values_mut()
            .find(|t| t.is_active())
            .and_then(|t| t.pointer_move(pointer))
    }

    /// Pointer released: ends the gesture and commits its result once
    pub fn pointer_up(&mut self, store: &mut NoteStore, pointer: Pointer) -> Option<NotePosition> {
        let (id, position) = self
            .trackers
            .iter_mut()
            .find(|(_, t)| t.is_active())
            .and_then(|(id, t)| t.pointer_up(pointer).map(|p| (id.clone(), p)))?;
        Self::commit(store, &id, position)
    }

    /// Tracking was lost without a release event. The gesture still ends and
    /// commits at the last pointer position seen.
    pub fn pointer_lost(&mut self, store: &mut NoteStore) -> Option<NotePosition> {
        let (id, position) = self
            .trackers
            .iter_mut()
            .find(|(_, t)| t.is_active())
            .and_then(|(id, t)| t.abandon().map(|p| (id.clone(), p)))?;
        Self::commit(store, &id, position)
    }

    fn commit(store: &mut NoteStore, id: &str, position: NotePosition) -> Option<NotePosition> {
        match store.note(id) {
            Some(note) if !note.is_locked => {
                store.update_note(id, NotePatch::geometry(position));
                Some(position)
            }
            Some(_) => {
                debug!("Note {} was locked mid-gesture, dropping commit", id);
                None
            }
            None => None,
        }
    }

    /// Hides a window. The note itself is untouched apart from visibility.
    pub fn close_window(&mut self, store: &mut NoteStore, id: &str) -> bool {
        self.trackers.remove(id);
        store.update_note(id, NotePatch::visibility(false))
    }

    /// Drops trackers of windows that are no longer on screen
    pub fn prune(&mut self, store: &NoteStore) {
        self.trackers
            .retain(|id, _| store.note(id).is_some_and(|n| n.is_visible()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ManualClock, MemorySink, MIN_HEIGHT, MIN_WIDTH};

    fn setup() -> (NoteStore, MemorySink) {
        let sink = MemorySink::new();
        let store = NoteStore::new(Arc::new(ManualClock::new(0))).with_sink(Box::new(sink.clone()));
        (store, sink)
    }

    #[test]
    fn drag_writes_store_exactly_once_on_release() {
        let (mut store, sink) = setup();
        let id = store.add_note(Some((100.0, 100.0)));
        let mut composer = WindowComposer::new();

        assert!(composer.header_pointer_down(&mut store, &id, Pointer::new(200.0, 200.0)));
        let writes_at_start = sink.write_count();

        for step in 1..=10 {
            let s = step as f64;
            composer.pointer_move(Pointer::new(200.0 + 4.0 * s, 200.0 - s));
        }
        assert_eq!(sink.write_count(), writes_at_start);
        assert_eq!(store.note(&id).unwrap().position.x, 100.0);

        let views = composer.windows(&store);
        assert_eq!((views[0].frame.x, views[0].frame.y), (140.0, 90.0));
        assert_eq!(views[0].gesture, GesturePhase::Dragging);

        let committed = composer
            .pointer_up(&mut store, Pointer::new(240.0, 190.0))
            .unwrap();
        assert_eq!((committed.x, committed.y), (140.0, 90.0));
        assert_eq!(sink.write_count(), writes_at_start + 1);

        let note = store.note(&id).unwrap();
        assert_eq!((note.position.x, note.position.y), (140.0, 90.0));
        assert!(composer.active_window().is_none());
    }

    #[test]
    fn pointer_down_raises_window_before_gesture() {
        let (mut store, _) = setup();
        let bottom = store.add_note(None);
        let top = store.add_note(None);
        let mut composer = WindowComposer::new();

        composer.resize_pointer_down(&mut store, &bottom, Pointer::default());
        let bottom_z = store.note(&bottom).unwrap().position.z_index;
        assert!(bottom_z > store.note(&top).unwrap().position.z_index);

        let order: Vec<&str> = composer
            .windows(&store)
            .iter()
            .map(|v| v.note.id.as_str())
            .collect();
        assert_eq!(order, vec![top.as_str(), bottom.as_str()]);
    }

    #[test]
    fn resize_commit_is_clamped() {
        let (mut store, _) = setup();
        let id = store.add_note(Some((0.0, 0.0)));
        let mut composer = WindowComposer::new();

        composer.resize_pointer_down(&mut store, &id, Pointer::new(320.0, 300.0));
        composer.pointer_move(Pointer::new(0.0, 0.0));
        composer.pointer_up(&mut store, Pointer::new(0.0, 0.0));

        let position = store.note(&id).unwrap().position;
        assert_eq!((position.width, position.height), (MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn locked_window_ignores_gestures() {
        let (mut store, sink) = setup();
        let id = store.add_note(None);
        store.update_note(
            &id,
            NotePatch {
                is_locked: Some(true),
                ..Default::default()
            },
        );
        let writes = sink.write_count();
        let mut composer = WindowComposer::new();

        assert!(!composer.header_pointer_down(&mut store, &id, Pointer::default()));
        assert!(!composer.resize_pointer_down(&mut store, &id, Pointer::default()));
        assert!(composer.pointer_up(&mut store, Pointer::new(50.0, 50.0)).is_none());
        assert_eq!(sink.write_count(), writes);

        let views = composer.windows(&store);
        let view = &views[0];
        assert!(!view.draggable);
        assert!(!view.resizable);
    }

    #[test]
    fn lost_pointer_still_ends_gesture() {
        let (mut store, _) = setup();
        let id = store.add_note(Some((10.0, 10.0)));
        let mut composer = WindowComposer::new();

        composer.header_pointer_down(&mut store, &id, Pointer::new(0.0, 0.0));
        composer.pointer_move(Pointer::new(30.0, 40.0));
        let committed = composer.pointer_lost(&mut store).unwrap();

        assert_eq!((committed.x, committed.y), (40.0, 50.0));
        assert!(composer.active_window().is_none());
        assert!(composer.pointer_move(Pointer::new(90.0, 90.0)).is_none());
    }

    #[test]
    fn lock_during_gesture_drops_commit() {
        let (mut store, _) = setup();
        let id = store.add_note(Some((10.0, 10.0)));
        let mut composer = WindowComposer::new();

        composer.header_pointer_down(&mut store, &id, Pointer::new(0.0, 0.0));
        store.update_note(
            &id,
            NotePatch {
                is_locked: Some(true),
                ..Default::default()
            },
        );
        assert!(composer.pointer_up(&mut store, Pointer::new(30.0, 30.0)).is_none());
        assert_eq!(store.note(&id).unwrap().position.x, 10.0);
    }

    #[test]
    fn only_open_untrashed_notes_are_composed() {
        let (mut store, _) = setup();
        let open = store.add_note(None);
        let closed = store.add_note(None);
        let trashed = store.add_note(None);
        let mut composer = WindowComposer::new();

        composer.close_window(&mut store, &closed);
        store.delete_note(&trashed);
        composer.prune(&store);

        let views = composer.windows(&store);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].note.id, open);
        assert!(!composer.header_pointer_down(&mut store, &trashed, Pointer::default()));
    }

    #[test]
    fn view_resolves_palette_and_clamps_opacity() {
        let (mut store, _) = setup();
        let id = store.add_note(None);
        store.update_note(
            &id,
            NotePatch {
                color: Some("does-not-exist".to_string()),
                ..Default::default()
            },
        );
        let mut snapshot = store.snapshot();
        snapshot.notes[0].opacity = 0.0;
        let store = NoteStore::from_state(snapshot, Arc::new(ManualClock::new(0)));

        let composer = WindowComposer::new();
        let views = composer.windows(&store);
        let view = &views[0];
        assert_eq!(view.palette.id, "slate");
        assert_eq!(view.opacity, 0.2);
    }
}
