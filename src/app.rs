use std::path::PathBuf;

use egui::Rect;

use crate::canvas::{Canvas, GestureStatus, HistoryStatus};
use crate::color::Color;
use crate::config::CanvasConfig;
use crate::document::Document;
use crate::file_handler::{self, FileHandler};
use crate::input::{InputHandler, Viewport};
use crate::panels::{central_panel, tools_panel};
use crate::state::{StatePersistence, save_document};
use crate::texture_manager::TextureManager;
use crate::tools::{ToolContext, ToolType};

/// Storage key for the canvas config
const CONFIG_KEY: &str = "pixel_canvas_config";
/// Seconds between autosaves of a changed document
const AUTOSAVE_INTERVAL: f64 = 60.0;
const MAX_AUTOSAVES: usize = 5;

pub struct PaintApp {
    canvas: Canvas,
    config: CanvasConfig,
    tool: ToolContext,
    input: InputHandler,
    viewport: Option<Viewport>,
    textures: TextureManager,
    file_handler: FileHandler,
    persistence: StatePersistence,
    autosave_sequence: u64,
    last_autosave: (f64, u64),
    /// Last message for the status bar
    status: Option<String>,
}

impl Default for PaintApp {
    fn default() -> Self {
        Self::with_config(CanvasConfig::default())
    }
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = cc
            .storage
            .and_then(|storage| eframe::get_value::<CanvasConfig>(storage, CONFIG_KEY))
            .unwrap_or_default();
        Self::with_config(config)
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::error!("{}, using defaults", e);
                CanvasConfig::default()
            }
        };
        let canvas = Canvas::from_config(&config).unwrap_or_else(|e| {
            log::error!("Failed to create canvas: {}", e);
            Canvas::new(Document::default())
        });
        let tool = ToolContext::new(ToolType::Brush, config.brush(), Color::BLACK);
        Self {
            canvas,
            tool,
            input: InputHandler::new(),
            viewport: None,
            textures: TextureManager::new(8),
            file_handler: FileHandler::new(),
            persistence: StatePersistence::new(autosave_dir(), MAX_AUTOSAVES),
            autosave_sequence: 0,
            last_autosave: (0.0, 0),
            status: None,
            config,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn tool(&self) -> &ToolContext {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut ToolContext {
        &mut self.tool
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Switches tools unless a gesture is in progress
    pub fn set_active_tool(&mut self, tool: ToolType) {
        match self.canvas.check_tool_switch() {
            Ok(()) => {
                log::info!("Tool selected: {}", tool.name());
                self.tool.tool = tool;
            }
            Err(e) => log::debug!("Tool switch refused: {}", e),
        }
    }

    pub fn undo(&mut self) {
        if let HistoryStatus::Empty = self.canvas.undo() {
            self.set_status("Nothing to undo");
        }
    }

    pub fn redo(&mut self) {
        if let HistoryStatus::Empty = self.canvas.redo() {
            self.set_status("Nothing to redo");
        }
    }

    /// Starts over with a blank document from the current config
    pub fn new_document(&mut self) {
        match Canvas::from_config(&self.config) {
            Ok(canvas) => {
                self.canvas = canvas;
                self.textures.clear_cache();
                self.viewport = None;
            }
            Err(e) => self.set_status(format!("Cannot create document: {}", e)),
        }
    }

    /// Replaces the document with the most recent autosave
    pub fn restore_autosave(&mut self) {
        let restored = match self.persistence.restore_latest() {
            Ok(Some(document)) => self.canvas.replace_document(document),
            Ok(None) => {
                self.set_status("No autosave found");
                return;
            }
            Err(e) => {
                self.set_status(format!("Restore failed: {}", e));
                return;
            }
        };
        match restored {
            Ok(()) => {
                self.textures.clear_cache();
                self.viewport = None;
                self.set_status("Restored autosave");
            }
            Err(e) => self.set_status(format!("Restore failed: {}", e)),
        }
    }

    pub fn set_config(&mut self, config: CanvasConfig) {
        self.tool.brush = config.brush();
        self.config = config;
    }

    pub fn save_project(&mut self, path: PathBuf) {
        match save_document(self.canvas.document(), &path) {
            Ok(()) => self.set_status(format!("Saved {}", path.display())),
            Err(e) => self.set_status(format!("Save failed: {}", e)),
        }
    }

    pub fn export_frames(&mut self, dir: PathBuf) {
        match file_handler::export_frames(&mut self.canvas, &dir, "frame") {
            Ok(paths) => self.set_status(format!("Exported {} frame(s) to {}", paths.len(), dir.display())),
            Err(e) => self.set_status(format!("Export failed: {}", e)),
        }
    }

    /// Mutable access to everything the canvas view needs at once
    pub(crate) fn view_parts(
        &mut self,
    ) -> (&mut Canvas, &mut Option<Viewport>, &mut TextureManager) {
        (&mut self.canvas, &mut self.viewport, &mut self.textures)
    }

    /// Feeds this frame's pointer input to the canvas
    pub fn handle_input(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let document = self.canvas.document();
        let (width, height) = (document.width(), document.height());
        let viewport = self
            .viewport
            .get_or_insert_with(|| Viewport::fit(canvas_rect, width, height));
        viewport.update(canvas_rect, width, height);

        for event in self.input.process_input(ctx, viewport, &self.tool) {
            if let GestureStatus::Committed { recorded: true } = self.canvas.apply_gesture_event(&event) {
                self.status = None;
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (undo, redo, abort) = ctx.input(|i| {
            let command = i.modifiers.command;
            (
                command && !i.modifiers.shift && i.key_pressed(egui::Key::Z),
                command && (i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if abort {
            self.canvas.abort_gesture();
        }
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        self.file_handler.preview_files_being_dropped(ctx);
        if self.file_handler.check_for_dropped_files(ctx) {
            let loaded = self.file_handler.process_dropped_files(&mut self.canvas);
            if !loaded.is_empty() {
                self.textures.clear_cache();
                self.viewport = None;
                self.set_status(format!("Loaded {} file(s)", loaded.len()));
                ctx.request_repaint();
            }
        }
    }

    fn autosave(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let (last_time, last_revision) = self.last_autosave;
        let revision = self.canvas.revision();
        if self.canvas.is_drawing() || revision == last_revision || now - last_time < AUTOSAVE_INTERVAL {
            return;
        }
        self.autosave_sequence += 1;
        if let Err(e) = self.persistence.autosave(self.canvas.document(), self.autosave_sequence) {
            log::warn!("Autosave failed: {}", e);
        }
        self.last_autosave = (now, revision);
    }
}

fn autosave_dir() -> PathBuf {
    std::env::temp_dir().join("pixel_canvas")
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, CONFIG_KEY, &self.config);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame();
        self.handle_shortcuts(ctx);
        tools_panel(self, ctx);
        central_panel(self, ctx);
        self.handle_dropped_files(ctx);
        self.autosave(ctx);
    }
}
