//! The canvas controller: owns the document and its history and turns
//! gesture events into pixel edits.

use std::collections::HashMap;
use std::sync::Arc;

use crate::brush::Brush;
use crate::color::Color;
use crate::command::{BufferStore, CommandHistory};
use crate::compositor;
use crate::config::CanvasConfig;
use crate::document::Document;
use crate::draw_data::DrawData;
use crate::error::{CanvasError, CanvasResult, HistoryDirection};
use crate::input::{GestureEvent, GesturePhase};
use crate::layer::{BlendMode, Layer, LayerFrameId, LayerId};
use crate::line;
use crate::pixel_buffer::{Anchor, PixelBuffer, PixelPos};
use crate::state::EditorState;
use crate::tools::ToolType;
use crate::transform::ColorTransform;

/// What a gesture event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStatus {
    /// A press opened a gesture and stamped once
    Started,
    /// A motion painted a line segment
    Drawn,
    /// A release closed the gesture; `recorded` is false if nothing changed
    Committed { recorded: bool },
    /// The gesture was rolled back
    Aborted,
    /// The event did not fit the current state and was dropped
    Ignored,
}

/// Outcome of an undo or redo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    /// The layer-frame that was restored
    Applied(LayerFrameId),
    /// Nothing to undo or redo
    Empty,
    /// Refused because a gesture is in progress
    Busy,
}

#[derive(Debug)]
struct CachedComposite {
    revision: u64,
    buffer: Arc<PixelBuffer>,
}

#[derive(Debug)]
pub struct Canvas {
    document: Document,
    history: CommandHistory,
    state: EditorState,
    /// Every write of the current gesture
    stroke: DrawData,
    /// Bumped on every change that can affect a composite
    revision: u64,
    composites: HashMap<usize, CachedComposite>,
}

impl Canvas {
    pub fn new(document: Document) -> Self {
        Self::with_history(document, CommandHistory::new())
    }

    pub fn with_history(document: Document, history: CommandHistory) -> Self {
        Self {
            document,
            history,
            state: EditorState::Idle,
            stroke: DrawData::new(),
            revision: 0,
            composites: HashMap::new(),
        }
    }

    /// A fresh document laid out as `config` describes
    pub fn from_config(config: &CanvasConfig) -> CanvasResult<Self> {
        let mut document = Document::new(config.width, config.height, config.frame_count)?;
        if let Some(background) = config.background {
            for frame in &mut document.layer_mut(0)?.frames {
                frame.buffer.fill(background);
            }
        }
        document.palette.name = config.palette_name.clone();
        Ok(Self::with_history(
            document,
            CommandHistory::with_limit(config.history_limit),
        ))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state.is_drawing()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The writes of the gesture in progress
    pub fn stroke(&self) -> &DrawData {
        &self.stroke
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn ensure_idle(&self, to: &'static str) -> CanvasResult<()> {
        if self.state.is_drawing() {
            return Err(CanvasError::InvalidStateTransition {
                from: self.state.name(),
                to,
            });
        }
        Ok(())
    }

    /// Whether the front-end may change the current tool right now
    pub fn check_tool_switch(&self) -> CanvasResult<()> {
        self.ensure_idle("ToolSwitch")
    }

    /// Feeds one pointer event through the interaction state machine
    pub fn apply_gesture_event(&mut self, event: &GestureEvent) -> GestureStatus {
        match event.phase {
            GesturePhase::Press => self.press(event),
            GesturePhase::Motion => self.motion(event),
            GesturePhase::Release => self.release(),
        }
    }

    fn press(&mut self, event: &GestureEvent) -> GestureStatus {
        if self.state.is_drawing() {
            log::debug!("Press while drawing ignored");
            return GestureStatus::Ignored;
        }
        let (target, buffer) = match self.document.active_frame() {
            Ok(frame) => (frame.id, &frame.buffer),
            Err(e) => {
                log::warn!("No frame to draw on: {}", e);
                return GestureStatus::Ignored;
            }
        };
        if let Err(e) = self.history.safepoint(target, buffer) {
            log::debug!("Safepoint refused: {}", e);
            return GestureStatus::Ignored;
        }

        let ctx = &event.context;
        let pos = clamp_to_reach(event.position, &self.document, &ctx.brush);
        self.state = EditorState::Drawing {
            tool: ctx.tool,
            brush: ctx.brush.clone(),
            color: ctx.color,
            target,
            last: pos,
        };
        self.stroke.clear();
        self.paint_segment(pos, pos);
        GestureStatus::Started
    }

    fn motion(&mut self, event: &GestureEvent) -> GestureStatus {
        let EditorState::Drawing { tool, brush, last, .. } = &self.state else {
            log::debug!("Motion without a gesture ignored");
            return GestureStatus::Ignored;
        };
        if event.context.tool != *tool {
            log::debug!(
                "Switch to {} ignored until the {} gesture ends",
                event.context.tool.name(),
                tool.name()
            );
        }
        let from = *last;
        let to = clamp_to_reach(event.position, &self.document, brush);
        if from == to {
            return GestureStatus::Drawn;
        }
        self.paint_segment(from, to);
        if let EditorState::Drawing { last, .. } = &mut self.state {
            *last = to;
        }
        GestureStatus::Drawn
    }

    fn release(&mut self) -> GestureStatus {
        let EditorState::Drawing { target, .. } = self.state else {
            log::debug!("Release without a gesture ignored");
            return GestureStatus::Ignored;
        };
        self.state = EditorState::Idle;
        self.stroke.clear();

        let recorded = match self.document.find_buffer(target) {
            Some(buffer) => self.history.commit(buffer).unwrap_or_else(|e| {
                log::warn!("Commit failed: {}", e);
                false
            }),
            None => {
                log::warn!("Gesture target {} vanished, discarding gesture", target);
                self.history.discard_gesture();
                false
            }
        };
        if recorded {
            log::info!("Recorded stroke on {}", target);
        }
        GestureStatus::Committed { recorded }
    }

    /// Rolls the gesture in progress back to its safepoint
    pub fn abort_gesture(&mut self) -> GestureStatus {
        let EditorState::Drawing { target, .. } = self.state else {
            return GestureStatus::Ignored;
        };
        self.state = EditorState::Idle;
        self.stroke.clear();
        match self.document.buffer_mut(target) {
            Some(buffer) => {
                if let Err(e) = self.history.abort(buffer) {
                    log::warn!("Abort failed: {}", e);
                }
            }
            None => self.history.discard_gesture(),
        }
        self.touch();
        log::info!("Aborted gesture on {}", target);
        GestureStatus::Aborted
    }

    /// Stamps the locked brush from `from` to `to`, blending against the
    /// gesture's safepoint so repeated passes never stack
    fn paint_segment(&mut self, from: PixelPos, to: PixelPos) {
        let EditorState::Drawing {
            tool,
            brush,
            color,
            target,
            ..
        } = &self.state
        else {
            return;
        };
        let Some(base) = self.history.gesture_base() else {
            return;
        };
        let segment = match tool {
            ToolType::Brush => line::rasterize(base, from, to, brush, *color),
            ToolType::Eraser => line::rasterize_erase(base, from, to, brush),
        };
        let Some(buffer) = self.document.buffer_mut(*target) else {
            return;
        };
        buffer.apply(&segment);
        self.stroke.merge(segment);
        self.touch();
    }

    pub fn undo(&mut self) -> HistoryStatus {
        self.step_history(HistoryDirection::Undo)
    }

    pub fn redo(&mut self) -> HistoryStatus {
        self.step_history(HistoryDirection::Redo)
    }

    fn step_history(&mut self, direction: HistoryDirection) -> HistoryStatus {
        if self.state.is_drawing() {
            log::debug!("{} refused during a gesture", direction);
            return HistoryStatus::Busy;
        }
        let result = match direction {
            HistoryDirection::Undo => self.history.undo(&mut self.document),
            HistoryDirection::Redo => self.history.redo(&mut self.document),
        };
        match result {
            Ok(id) => {
                self.touch();
                log::info!("{} on {}", direction, id);
                HistoryStatus::Applied(id)
            }
            Err(CanvasError::EmptyStack(_)) => {
                log::info!("Nothing to {}", direction);
                HistoryStatus::Empty
            }
            Err(e) => {
                log::debug!("{} refused: {}", direction, e);
                HistoryStatus::Busy
            }
        }
    }

    /// The flattened image of `frame_index`.
    ///
    /// Recomputed only when something changed since the last call; the
    /// returned buffer is an immutable snapshot that can be handed to the
    /// renderer.
    pub fn composited_frame(&mut self, frame_index: usize) -> Arc<PixelBuffer> {
        if let Some(cached) = self.composites.get(&frame_index) {
            if cached.revision == self.revision {
                return Arc::clone(&cached.buffer);
            }
        }
        let result = compositor::composite(
            self.document.layers(),
            frame_index,
            self.document.width(),
            self.document.height(),
        );
        let buffer = Arc::new(result.buffer);
        self.composites.insert(
            frame_index,
            CachedComposite {
                revision: self.revision,
                buffer: Arc::clone(&buffer),
            },
        );
        buffer
    }

    /// Resizes every layer-frame. Any gesture is aborted and the history is
    /// cleared, since its regions no longer line up.
    pub fn resize_canvas(&mut self, width: u32, height: u32, anchor: Anchor) -> CanvasResult<()> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        if self.state.is_drawing() {
            self.abort_gesture();
        }
        self.document.resize(width, height, anchor)?;
        self.history.clear();
        self.composites.clear();
        self.touch();
        log::info!("Resized canvas to {}x{}", width, height);
        Ok(())
    }

    pub fn set_active_layer(&mut self, index: usize) -> CanvasResult<()> {
        self.ensure_idle("SetActiveLayer")?;
        self.document.set_active_layer(index)
    }

    pub fn set_active_frame(&mut self, index: usize) -> CanvasResult<()> {
        self.ensure_idle("SetActiveFrame")?;
        self.document.set_active_frame(index)
    }

    /// Applies `transform` to the active layer-frame as one undoable edit.
    ///
    /// Returns whether anything changed.
    pub fn apply_color_transform(&mut self, transform: ColorTransform) -> CanvasResult<bool> {
        self.ensure_idle("ColorTransform")?;
        log::info!("Applying {}", transform.name());
        self.edit_active(|buffer| transform.apply(buffer))
    }

    /// Erases the whole active layer-frame as one undoable edit
    pub fn clear_active(&mut self) -> CanvasResult<bool> {
        self.ensure_idle("Clear")?;
        self.edit_active(|buffer| PixelBuffer::new(buffer.width(), buffer.height()))
    }

    fn edit_active(&mut self, edit: impl FnOnce(&PixelBuffer) -> PixelBuffer) -> CanvasResult<bool> {
        let frame = self.document.active_frame_mut()?;
        let after = edit(&frame.buffer);
        let before = std::mem::replace(&mut frame.buffer, after);
        let id = frame.id;
        let recorded = self.history.record(id, &before, &frame.buffer)?;
        if recorded {
            self.touch();
        }
        Ok(recorded)
    }

    pub fn add_layer(&mut self, name: &str) -> CanvasResult<LayerId> {
        self.ensure_idle("AddLayer")?;
        let id = self.document.add_layer(name);
        self.touch();
        Ok(id)
    }

    /// Adds a prepared layer (e.g. an imported image) on top
    pub fn import_layer(&mut self, layer: Layer) -> CanvasResult<LayerId> {
        self.ensure_idle("ImportLayer")?;
        let id = self.document.push_layer(layer);
        self.touch();
        Ok(id)
    }

    pub fn remove_layer(&mut self, index: usize) -> CanvasResult<()> {
        self.ensure_idle("RemoveLayer")?;
        self.document.remove_layer(index)?;
        self.touch();
        Ok(())
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> CanvasResult<()> {
        self.ensure_idle("MoveLayer")?;
        self.document.move_layer(from, to)?;
        self.touch();
        Ok(())
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> CanvasResult<()> {
        self.document.layer_mut(index)?.visible = visible;
        self.touch();
        Ok(())
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> CanvasResult<()> {
        self.document.layer_mut(index)?.set_opacity(opacity);
        self.touch();
        Ok(())
    }

    pub fn set_layer_blend_mode(&mut self, index: usize, mode: BlendMode) -> CanvasResult<()> {
        self.document.layer_mut(index)?.blend_mode = mode;
        self.touch();
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: String) -> CanvasResult<()> {
        self.document.layer_mut(index)?.set_name(name);
        Ok(())
    }

    pub fn add_frame(&mut self) -> CanvasResult<usize> {
        self.ensure_idle("AddFrame")?;
        let index = self.document.add_frame();
        self.touch();
        Ok(index)
    }

    pub fn duplicate_frame(&mut self, index: usize) -> CanvasResult<usize> {
        self.ensure_idle("DuplicateFrame")?;
        let new_index = self.document.duplicate_frame(index)?;
        self.touch();
        Ok(new_index)
    }

    pub fn remove_frame(&mut self, index: usize) -> CanvasResult<()> {
        self.ensure_idle("RemoveFrame")?;
        self.document.remove_frame(index)?;
        self.composites.clear();
        self.touch();
        Ok(())
    }

    /// Swaps in another document, e.g. one loaded from disk
    pub fn replace_document(&mut self, document: Document) -> CanvasResult<()> {
        self.ensure_idle("ReplaceDocument")?;
        self.document = document;
        self.history.clear();
        self.composites.clear();
        self.touch();
        Ok(())
    }

    pub fn palette_mut(&mut self) -> &mut crate::palette::Palette {
        &mut self.document.palette
    }

    /// Color of the active layer-frame at `pos`, for an eyedropper
    pub fn pick_color(&self, pos: PixelPos) -> Option<Color> {
        self.document.active_frame().ok()?.buffer.get_pos(pos).ok()
    }
}

/// Clamps a pointer position to the canvas grown by the brush's reach, so
/// wild coordinates never turn into huge line walks
fn clamp_to_reach(pos: PixelPos, document: &Document, brush: &Brush) -> PixelPos {
    let reach = brush.extent() + 1;
    let max_x = document.width() as i32 - 1 + reach;
    let max_y = document.height() as i32 - 1 + reach;
    PixelPos::new(pos.x.clamp(-reach, max_x), pos.y.clamp(-reach, max_y))
}
