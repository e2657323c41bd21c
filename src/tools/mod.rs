use serde::{Deserialize, Serialize};

use crate::brush::Brush;
use crate::color::Color;

/// The tools that paint on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolType {
    #[default]
    Brush,
    Eraser,
}

impl ToolType {
    pub fn all() -> &'static [ToolType] {
        &[ToolType::Brush, ToolType::Eraser]
    }

    /// Return the name of the tool
    pub fn name(&self) -> &'static str {
        match self {
            ToolType::Brush => "Brush",
            ToolType::Eraser => "Eraser",
        }
    }
}

/// The session's current tool settings, passed along with every gesture
/// event instead of living in global state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContext {
    pub tool: ToolType,
    pub brush: Brush,
    /// Foreground color; the eraser ignores it
    pub color: Color,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            tool: ToolType::Brush,
            brush: Brush::default(),
            color: Color::BLACK,
        }
    }
}

impl ToolContext {
    pub fn new(tool: ToolType, brush: Brush, color: Color) -> Self {
        Self { tool, brush, color }
    }

    pub fn with_tool(&self, tool: ToolType) -> Self {
        Self {
            tool,
            ..self.clone()
        }
    }
}
