use thiserror::Error;

use crate::layer::LayerId;

/// Which history stack an operation targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl std::fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
        }
    }
}

/// Errors raised by the canvas engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    IndexOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("layer {layer} has no frame {index} (it has {frame_count})")]
    FrameIndexOutOfRange {
        layer: LayerId,
        index: usize,
        frame_count: usize,
    },

    #[error("no layer at index {index} ({count} layers)")]
    LayerIndexOutOfRange { index: usize, count: usize },

    #[error("nothing to {0}")]
    EmptyStack(HistoryDirection),

    #[error("cannot transition from {from} to {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("a document needs at least one layer")]
    LastLayer,

    #[error("a document needs at least one frame")]
    LastFrame,
}

/// Result type for canvas operations
pub type CanvasResult<T> = Result<T, CanvasError>;
