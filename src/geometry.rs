//! Drag and resize gesture tracking for a single note window.
//!
//! While a gesture is in flight the tracker keeps its own live frame that the
//! rendering layer reflects at pointer-move frequency. The persisted note is
//! only touched once, with the value returned when the gesture ends.
use log::{debug, trace};

use crate::{Note, NotePosition};

/// Smallest width a resize can produce
pub const MIN_WIDTH: f64 = 250.0;
/// Smallest height a resize can produce
pub const MIN_HEIGHT: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Pointer { x, y }
    }
}

/// Presentation geometry of a window, without stacking order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<NotePosition> for Frame {
    fn from(position: NotePosition) -> Self {
        Frame {
            x: position.x,
            y: position.y,
            width: position.width,
            height: position.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Resizing,
}

/// Locked notes never move
pub fn can_drag(note: &Note) -> bool {
    !note.is_locked
}

/// Locked notes hide their resize affordance
pub fn can_resize(note: &Note) -> bool {
    !note.is_locked
}

/// Scratch state owned by one in-flight gesture
#[derive(Debug, Clone, Copy)]
struct GestureSession {
    kind: GestureKind,
    pointer_start: Pointer,
    last_pointer: Pointer,
    position_start: NotePosition,
}

impl GestureSession {
    fn frame_at(&self, pointer: Pointer) -> Frame {
        let dx = pointer.x - self.pointer_start.x;
        let dy = pointer.y - self.pointer_start.y;
        let start = self.position_start;

        match self.kind {
            GestureKind::Drag => Frame {
                x: start.x + dx,
                y: start.y + dy,
                width: start.width,
                height: start.height,
            },
            GestureKind::Resize => Frame {
                x: start.x,
                y: start.y,
                width: (start.width + dx).max(MIN_WIDTH),
                height: (start.height + dy).max(MIN_HEIGHT),
            },
        }
    }

    fn position_at(&self, pointer: Pointer) -> NotePosition {
        let frame = self.frame_at(pointer);
        NotePosition {
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            z_index: self.position_start.z_index,
        }
    }
}

/// Gesture state machine for one window: `Idle -> Dragging|Resizing -> Idle`
#[derive(Debug, Default)]
pub struct GestureTracker {
    session: Option<GestureSession>,
    live: Option<Frame>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        match self.session.map(|s| s.kind) {
            None => GesturePhase::Idle,
            Some(GestureKind::Drag) => GesturePhase::Dragging,
            Some(GestureKind::Resize) => GesturePhase::Resizing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Live frame of the in-flight gesture, `None` when idle
    pub fn live_frame(&self) -> Option<Frame> {
        self.live
    }

    /// Pointer-down on the header. Returns `false` when the note is locked or
    /// another gesture is already running.
    pub fn begin_drag(&mut self, note: &Note, pointer: Pointer) -> bool {
        if !can_drag(note) {
            debug!("Ignoring drag on locked note {}", note.id);
            return false;
        }
        self.begin(GestureKind::Drag, note, pointer)
    }

    /// Pointer-down on the resize handle
    pub fn begin_resize(&mut self, note: &Note, pointer: Pointer) -> bool {
        if !can_resize(note) {
            debug!("Ignoring resize on locked note {}", note.id);
            return false;
        }
        self.begin(GestureKind::Resize, note, pointer)
    }

    fn begin(&mut self, kind: GestureKind, note: &Note, pointer: Pointer) -> bool {
        if self.session.is_some() {
            debug!("Gesture already active on note {}", note.id);
            return false;
        }

        debug!("Starting {:?} gesture on note {}", kind, note.id);
        self.session = Some(GestureSession {
            kind,
            pointer_start: pointer,
            last_pointer: pointer,
            position_start: note.position,
        });
        self.live = Some(Frame::from(note.position));
        true
    }

    /// Updates the live frame. Never produces a durable value.
    pub fn pointer_move(&mut self, pointer: Pointer) -> Option<Frame> {
        let session = self.session.as_mut()?;
        session.last_pointer = pointer;
        let frame = session.frame_at(pointer);
        trace!("Gesture frame: {:?}", frame);
        self.live = Some(frame);
        Some(frame)
    }

    /// Pointer-up: ends the gesture and returns the position to commit
    pub fn pointer_up(&mut self, pointer: Pointer) -> Option<NotePosition> {
        let session = self.session.take()?;
        self.live = None;
        let position = session.position_at(pointer);
        debug!("Committing {:?} gesture: {:?}", session.kind, position);
        Some(position)
    }

    /// Ends a gesture whose release was never observed, committing at the
    /// last pointer position seen.
    pub fn abandon(&mut self) -> Option<NotePosition> {
        let pointer = self.session.as_ref()?.last_pointer;
        self.pointer_up(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(x: f64, y: f64) -> Note {
        Note::new(
            "g".to_string(),
            NotePosition {
                x,
                y,
                width: 320.0,
                height: 300.0,
                z_index: 3,
            },
            0,
        )
    }

    #[test]
    fn drag_moves_live_frame_and_commits_on_release() {
        let note = note_at(100.0, 100.0);
        let mut tracker = GestureTracker::new();

        assert!(tracker.begin_drag(&note, Pointer::new(500.0, 500.0)));
        assert_eq!(tracker.phase(), GesturePhase::Dragging);

        let live = tracker.pointer_move(Pointer::new(520.0, 495.0)).unwrap();
        assert_eq!((live.x, live.y), (120.0, 95.0));

        let committed = tracker.pointer_up(Pointer::new(540.0, 490.0)).unwrap();
        assert_eq!((committed.x, committed.y), (140.0, 90.0));
        assert_eq!((committed.width, committed.height), (320.0, 300.0));
        assert_eq!(committed.z_index, 3);
        assert_eq!(tracker.phase(), GesturePhase::Idle);
        assert!(tracker.live_frame().is_none());
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let note = note_at(0.0, 0.0);
        let mut tracker = GestureTracker::new();

        assert!(tracker.begin_resize(&note, Pointer::new(0.0, 0.0)));
        let live = tracker.pointer_move(Pointer::new(-500.0, -500.0)).unwrap();
        assert_eq!((live.width, live.height), (MIN_WIDTH, MIN_HEIGHT));

        let committed = tracker.pointer_up(Pointer::new(-71.0, -101.0)).unwrap();
        assert_eq!(committed.width, MIN_WIDTH);
        assert_eq!(committed.height, MIN_HEIGHT);
        assert_eq!((committed.x, committed.y), (0.0, 0.0));
    }

    #[test]
    fn resize_grows_with_pointer() {
        let note = note_at(0.0, 0.0);
        let mut tracker = GestureTracker::new();

        tracker.begin_resize(&note, Pointer::new(10.0, 10.0));
        let committed = tracker.pointer_up(Pointer::new(40.0, 60.0)).unwrap();
        assert_eq!((committed.width, committed.height), (350.0, 350.0));
    }

    #[test]
    fn locked_notes_do_not_start_gestures() {
        let mut note = note_at(0.0, 0.0);
        note.is_locked = true;
        let mut tracker = GestureTracker::new();

        assert!(!tracker.begin_drag(&note, Pointer::default()));
        assert!(!tracker.begin_resize(&note, Pointer::default()));
        assert_eq!(tracker.phase(), GesturePhase::Idle);
        assert!(tracker.pointer_up(Pointer::default()).is_none());
    }

    #[test]
    fn second_gesture_is_rejected_while_one_is_active() {
        let note = note_at(0.0, 0.0);
        let mut tracker = GestureTracker::new();

        assert!(tracker.begin_drag(&note, Pointer::default()));
        assert!(!tracker.begin_resize(&note, Pointer::default()));
        assert_eq!(tracker.phase(), GesturePhase::Dragging);
    }

    #[test]
    fn abandoned_gesture_commits_last_seen_pointer() {
        let note = note_at(10.0, 10.0);
        let mut tracker = GestureTracker::new();

        tracker.begin_drag(&note, Pointer::new(0.0, 0.0));
        tracker.pointer_move(Pointer::new(5.0, 7.0));
        let committed = tracker.abandon().unwrap();

        assert_eq!((committed.x, committed.y), (15.0, 17.0));
        assert!(!tracker.is_active());
        assert!(tracker.abandon().is_none());
    }

    #[test]
    fn zero_delta_release_commits_start_position() {
        let note = note_at(42.0, 24.0);
        let mut tracker = GestureTracker::new();

        tracker.begin_drag(&note, Pointer::new(1.0, 1.0));
        let committed = tracker.pointer_up(Pointer::new(1.0, 1.0)).unwrap();
        assert_eq!(committed, note.position);
    }
}
