#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod brush;
pub mod canvas;
pub mod color;
pub mod command;
pub mod compositor;
pub mod config;
pub mod document;
pub mod draw_data;
pub mod error;
pub mod file_handler;
pub mod input;
pub mod layer;
pub mod line;
pub mod palette;
pub mod panels;
pub mod pixel_buffer;
pub mod state;
pub mod texture_manager;
pub mod tools;
pub mod transform;

pub use app::PaintApp;
pub use brush::{Brush, BrushShape};
pub use canvas::{Canvas, GestureStatus, HistoryStatus};
pub use color::Color;
pub use command::CommandHistory;
pub use config::CanvasConfig;
pub use document::Document;
pub use draw_data::DrawData;
pub use error::{CanvasError, CanvasResult};
pub use input::{GestureEvent, GesturePhase};
pub use layer::{BlendMode, Layer, LayerFrameId, LayerId};
pub use pixel_buffer::{Anchor, PixelBuffer, PixelPos};
pub use state::EditorState;
pub use tools::{ToolContext, ToolType};
