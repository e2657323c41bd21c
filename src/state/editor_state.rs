//! The interaction state machine of the canvas.
//!
//! ```text
//!  ┌──────────┐   press    ┌───────────┐
//!  │          ├────────────►           │
//!  │   Idle   │            │  Drawing  │ ◄── motion
//!  │          ◄────────────┤           │
//!  └──────────┘  release   └───────────┘
//!                 / abort
//! ```
//!
//! While drawing, the tool, brush and color of the press are locked in; the
//! gesture keeps using them whatever later events carry.

use crate::brush::Brush;
use crate::color::Color;
use crate::layer::LayerFrameId;
use crate::pixel_buffer::PixelPos;
use crate::tools::ToolType;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    /// No gesture in progress
    #[default]
    Idle,
    /// A press landed and the pointer is still down
    Drawing {
        tool: ToolType,
        brush: Brush,
        color: Color,
        /// The layer-frame the gesture paints on
        target: LayerFrameId,
        /// Last pointer position, the start of the next line segment
        last: PixelPos,
    },
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Idle => "Idle",
            EditorState::Drawing { .. } => "Drawing",
        }
    }

    /// Returns true if no gesture is in progress
    pub fn is_idle(&self) -> bool {
        matches!(self, EditorState::Idle)
    }

    /// Returns true if a gesture is in progress
    pub fn is_drawing(&self) -> bool {
        matches!(self, EditorState::Drawing { .. })
    }

    /// The tool locked in by the current gesture
    pub fn current_tool(&self) -> Option<ToolType> {
        match self {
            EditorState::Drawing { tool, .. } => Some(*tool),
            EditorState::Idle => None,
        }
    }
}
