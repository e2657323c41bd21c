use egui::{Context, Pos2, PointerButton};

mod viewport;
pub use viewport::Viewport;

use crate::pixel_buffer::PixelPos;
use crate::tools::ToolContext;

/// Phase of a pointer gesture on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Press,
    Motion,
    Release,
}

/// One pointer sample, already mapped into pixel space, together with the
/// tool settings that were current when it happened
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    pub position: PixelPos,
    pub context: ToolContext,
}

impl GestureEvent {
    pub fn new(phase: GesturePhase, position: PixelPos, context: ToolContext) -> Self {
        Self {
            phase,
            position,
            context,
        }
    }

    pub fn press(position: PixelPos, context: ToolContext) -> Self {
        Self::new(GesturePhase::Press, position, context)
    }

    pub fn motion(position: PixelPos, context: ToolContext) -> Self {
        Self::new(GesturePhase::Motion, position, context)
    }

    pub fn release(position: PixelPos, context: ToolContext) -> Self {
        Self::new(GesturePhase::Release, position, context)
    }
}

/// Turns raw egui pointer input into gesture events for the canvas
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    /// Whether a press started on the canvas and has not been released yet
    pointer_down: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process this frame's pointer input.
    ///
    /// Presses only count on the visible part of the canvas; once a gesture
    /// started, the release is reported wherever it happens so the canvas
    /// never gets stuck mid-gesture.
    pub fn process_input(&mut self, ctx: &Context, viewport: &Viewport, tool: &ToolContext) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let pos = input.pointer.latest_pos().or(self.last_pointer_pos);
            let Some(pos) = pos else {
                return;
            };
            let pixel = viewport.screen_to_pixel(pos);

            if input.pointer.button_pressed(PointerButton::Primary)
                && !self.pointer_down
                && viewport.accepts_press(pos)
            {
                self.pointer_down = true;
                events.push(GestureEvent::press(pixel, tool.clone()));
            } else if self.pointer_down && Some(pos) != self.last_pointer_pos {
                events.push(GestureEvent::motion(pixel, tool.clone()));
            }

            if self.pointer_down && !input.pointer.button_down(PointerButton::Primary) {
                self.pointer_down = false;
                events.push(GestureEvent::release(pixel, tool.clone()));
            }

            self.last_pointer_pos = Some(pos);
        });

        events
    }
}
