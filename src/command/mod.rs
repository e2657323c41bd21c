//! Undo/redo history for pixel edits.
//!
//! Edits are recorded as before/after crops of one layer-frame. Pointer
//! gestures open a safepoint on press and commit it on release; one-shot
//! edits are recorded whole.

mod entry;
mod history;

pub use entry::UndoEntry;
pub use history::{CommandHistory, DEFAULT_HISTORY_LIMIT, HistoryPhase};

use crate::layer::LayerFrameId;
use crate::pixel_buffer::PixelBuffer;

/// Anything that can hand out layer-frame buffers by id
pub trait BufferStore {
    fn buffer_mut(&mut self, id: LayerFrameId) -> Option<&mut PixelBuffer>;
}
