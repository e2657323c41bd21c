use std::collections::VecDeque;

use super::{BufferStore, UndoEntry};
use crate::error::{CanvasError, CanvasResult, HistoryDirection};
use crate::layer::LayerFrameId;
use crate::pixel_buffer::PixelBuffer;

/// Default number of entries kept on the undo stack
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Whether a gesture is currently being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPhase {
    Idle,
    GestureActive,
}

impl HistoryPhase {
    pub fn name(&self) -> &'static str {
        match self {
            HistoryPhase::Idle => "Idle",
            HistoryPhase::GestureActive => "GestureActive",
        }
    }
}

/// The buffer content captured when a gesture started
#[derive(Debug, Clone)]
struct Safepoint {
    target: LayerFrameId,
    before: PixelBuffer,
}

/// Manages the undo and redo stacks for pixel edits
#[derive(Debug)]
pub struct CommandHistory {
    /// Entries that can be undone, oldest first
    undo_stack: VecDeque<UndoEntry>,
    /// Entries that can be redone
    redo_stack: Vec<UndoEntry>,
    /// The open gesture, if any
    pending: Option<Safepoint>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    /// Creates a new empty history
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a history that keeps at most `limit` undo entries
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            pending: None,
            limit: limit.max(1),
        }
    }

    pub fn phase(&self) -> HistoryPhase {
        if self.pending.is_some() {
            HistoryPhase::GestureActive
        } else {
            HistoryPhase::Idle
        }
    }

    /// Opens a gesture on `target`, capturing `buffer` as its before state.
    ///
    /// Fails without touching anything when a gesture is already open.
    pub fn safepoint(&mut self, target: LayerFrameId, buffer: &PixelBuffer) -> CanvasResult<()> {
        if self.pending.is_some() {
            return Err(CanvasError::InvalidStateTransition {
                from: HistoryPhase::GestureActive.name(),
                to: HistoryPhase::GestureActive.name(),
            });
        }
        self.pending = Some(Safepoint {
            target,
            before: buffer.clone(),
        });
        Ok(())
    }

    /// The before state of the open gesture
    pub fn gesture_base(&self) -> Option<&PixelBuffer> {
        self.pending.as_ref().map(|p| &p.before)
    }

    /// Closes the open gesture with `buffer` as its after state.
    ///
    /// Returns `true` if an entry was recorded. A gesture that changed
    /// nothing records nothing but still invalidates the redo stack.
    pub fn commit(&mut self, buffer: &PixelBuffer) -> CanvasResult<bool> {
        let Some(safepoint) = self.pending.take() else {
            return Err(CanvasError::InvalidStateTransition {
                from: HistoryPhase::Idle.name(),
                to: "Commit",
            });
        };
        self.record(safepoint.target, &safepoint.before, buffer)
    }

    /// Closes the open gesture by restoring its before state into `buffer`
    pub fn abort(&mut self, buffer: &mut PixelBuffer) -> CanvasResult<()> {
        let Some(safepoint) = self.pending.take() else {
            return Err(CanvasError::InvalidStateTransition {
                from: HistoryPhase::Idle.name(),
                to: "Abort",
            });
        };
        *buffer = safepoint.before;
        Ok(())
    }

    /// Drops the open gesture without recording or restoring anything
    pub fn discard_gesture(&mut self) {
        self.pending = None;
    }

    /// Records a complete edit of `target` in one step.
    ///
    /// Any edit clears the redo stack, even one that changed nothing.
    pub fn record(
        &mut self,
        target: LayerFrameId,
        before: &PixelBuffer,
        after: &PixelBuffer,
    ) -> CanvasResult<bool> {
        let entry = UndoEntry::capture(target, before, after)?;
        self.redo_stack.clear();
        let Some(entry) = entry else {
            log::debug!("Edit of {} changed nothing, not recorded", target);
            return Ok(false);
        };
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
        Ok(true)
    }

    /// Restores the before state of the most recent entry.
    ///
    /// Entries whose layer-frame no longer exists are dropped and the next
    /// one is tried. Returns the restored layer-frame.
    pub fn undo(&mut self, store: &mut impl BufferStore) -> CanvasResult<LayerFrameId> {
        self.ensure_idle("Undo")?;
        while let Some(entry) = self.undo_stack.pop_back() {
            if Self::restore(&entry, store, HistoryDirection::Undo) {
                let target = entry.target();
                self.redo_stack.push(entry);
                return Ok(target);
            }
        }
        Err(CanvasError::EmptyStack(HistoryDirection::Undo))
    }

    /// Reapplies the most recently undone entry
    pub fn redo(&mut self, store: &mut impl BufferStore) -> CanvasResult<LayerFrameId> {
        self.ensure_idle("Redo")?;
        while let Some(entry) = self.redo_stack.pop() {
            if Self::restore(&entry, store, HistoryDirection::Redo) {
                let target = entry.target();
                self.undo_stack.push_back(entry);
                return Ok(target);
            }
        }
        Err(CanvasError::EmptyStack(HistoryDirection::Redo))
    }

    fn ensure_idle(&self, to: &'static str) -> CanvasResult<()> {
        match self.phase() {
            HistoryPhase::Idle => Ok(()),
            phase => Err(CanvasError::InvalidStateTransition {
                from: phase.name(),
                to,
            }),
        }
    }

    fn restore(entry: &UndoEntry, store: &mut impl BufferStore, direction: HistoryDirection) -> bool {
        let Some(buffer) = store.buffer_mut(entry.target()) else {
            log::warn!("Dropping {} entry for removed layer-frame {}", direction, entry.target());
            return false;
        };
        let restored = match direction {
            HistoryDirection::Undo => entry.restore_before(buffer),
            HistoryDirection::Redo => entry.restore_after(buffer),
        };
        match restored {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping {} entry for {}: {}", direction, entry.target(), e);
                false
            }
        }
    }

    /// Returns true if there are entries that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are entries that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Clear both stacks and forget any open gesture
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Store(HashMap<LayerFrameId, PixelBuffer>);

    impl BufferStore for Store {
        fn buffer_mut(&mut self, id: LayerFrameId) -> Option<&mut PixelBuffer> {
            self.0.get_mut(&id)
        }
    }

    fn store_with(id: LayerFrameId) -> Store {
        let mut store = Store::default();
        store.0.insert(id, PixelBuffer::new(4, 4));
        store
    }

    fn paint(store: &mut Store, id: LayerFrameId, x: u32, color: Color) {
        store.0.get_mut(&id).unwrap().set(x, 0, color).unwrap();
    }

    #[test]
    fn test_double_safepoint_is_rejected() {
        let id = LayerFrameId::new();
        let mut history = CommandHistory::new();
        let buffer = PixelBuffer::new(2, 2);
        history.safepoint(id, &buffer).unwrap();
        assert!(matches!(
            history.safepoint(id, &buffer),
            Err(CanvasError::InvalidStateTransition { .. })
        ));
        assert_eq!(history.phase(), HistoryPhase::GestureActive);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::new();
        let original = store.0[&id].clone();

        history.safepoint(id, &store.0[&id]).unwrap();
        paint(&mut store, id, 1, Color::RED);
        paint(&mut store, id, 3, Color::BLUE);
        assert!(history.commit(&store.0[&id]).unwrap());
        let painted = store.0[&id].clone();

        assert_eq!(history.undo(&mut store).unwrap(), id);
        assert_eq!(store.0[&id], original);
        assert_eq!(history.redo(&mut store).unwrap(), id);
        assert_eq!(store.0[&id], painted);
    }

    #[test]
    fn test_empty_stacks() {
        let mut store = Store::default();
        let mut history = CommandHistory::new();
        assert_eq!(
            history.undo(&mut store),
            Err(CanvasError::EmptyStack(HistoryDirection::Undo))
        );
        assert_eq!(
            history.redo(&mut store),
            Err(CanvasError::EmptyStack(HistoryDirection::Redo))
        );
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::new();

        history.safepoint(id, &store.0[&id]).unwrap();
        paint(&mut store, id, 0, Color::RED);
        history.commit(&store.0[&id]).unwrap();
        history.undo(&mut store).unwrap();
        assert!(history.can_redo());

        history.safepoint(id, &store.0[&id]).unwrap();
        paint(&mut store, id, 2, Color::GREEN);
        history.commit(&store.0[&id]).unwrap();
        assert!(!history.can_redo());
        assert!(history.redo(&mut store).is_err());
    }

    #[test]
    fn test_unchanged_gesture_records_nothing() {
        let id = LayerFrameId::new();
        let store = store_with(id);
        let mut history = CommandHistory::new();
        history.safepoint(id, &store.0[&id]).unwrap();
        assert!(!history.commit(&store.0[&id]).unwrap());
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.phase(), HistoryPhase::Idle);
    }

    #[test]
    fn test_unchanged_gesture_still_clears_redo() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::new();

        history.safepoint(id, &store.0[&id]).unwrap();
        paint(&mut store, id, 0, Color::RED);
        history.commit(&store.0[&id]).unwrap();
        history.undo(&mut store).unwrap();
        assert!(history.can_redo());

        history.safepoint(id, &store.0[&id]).unwrap();
        assert!(!history.commit(&store.0[&id]).unwrap());
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn test_abort_restores_before() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::new();
        let original = store.0[&id].clone();

        history.safepoint(id, &store.0[&id]).unwrap();
        paint(&mut store, id, 1, Color::RED);
        history.abort(store.0.get_mut(&id).unwrap()).unwrap();
        assert_eq!(store.0[&id], original);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_rejected_during_gesture() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::new();
        history.safepoint(id, &store.0[&id]).unwrap();
        assert!(matches!(
            history.undo(&mut store),
            Err(CanvasError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_missing_target_is_dropped() {
        let kept = LayerFrameId::new();
        let removed = LayerFrameId::new();
        let mut store = store_with(kept);
        store.0.insert(removed, PixelBuffer::new(4, 4));
        let mut history = CommandHistory::new();

        for id in [kept, removed] {
            let before = store.0[&id].clone();
            paint(&mut store, id, 0, Color::RED);
            history.record(id, &before, &store.0[&id]).unwrap();
        }
        store.0.remove(&removed);

        assert_eq!(history.undo(&mut store).unwrap(), kept);
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let id = LayerFrameId::new();
        let mut store = store_with(id);
        let mut history = CommandHistory::with_limit(2);
        for x in 0..4 {
            let before = store.0[&id].clone();
            paint(&mut store, id, x, Color::RED);
            history.record(id, &before, &store.0[&id]).unwrap();
        }
        assert_eq!(history.undo_len(), 2);
        history.undo(&mut store).unwrap();
        history.undo(&mut store).unwrap();
        // The first two pixels stay painted: their entries fell off the stack
        assert_eq!(store.0[&id].get(1, 0).unwrap(), Color::RED);
        assert_eq!(store.0[&id].get(2, 0).unwrap(), Color::TRANSPARENT);
    }
}
