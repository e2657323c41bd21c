use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use eframe::egui;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::canvas::Canvas;
use crate::error::CanvasError;
use crate::layer::Layer;
use crate::pixel_buffer::PixelBuffer;
use crate::state::{PersistenceError, load_document};

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),
    #[error("Project error: {0}")]
    Project(#[from] PersistenceError),
    #[error("Unsupported file: {0}")]
    Unsupported(String),
}

pub type FileResult<T> = Result<T, FileError>;

fn rgba_image(buffer: &PixelBuffer) -> FileResult<RgbaImage> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8()).ok_or(FileError::Canvas(
        CanvasError::InvalidDimensions {
            width: buffer.width(),
            height: buffer.height(),
        },
    ))
}

/// Encodes `buffer` as PNG bytes
pub fn encode_png(buffer: &PixelBuffer) -> FileResult<Vec<u8>> {
    let mut bytes = Vec::new();
    rgba_image(buffer)?.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decodes any format the image crate understands into a buffer
pub fn decode_image(bytes: &[u8]) -> FileResult<PixelBuffer> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    log::debug!("Decoded image: {}x{}", img.width(), img.height());
    let (width, height) = img.dimensions();
    Ok(PixelBuffer::from_rgba8(width, height, &img.into_raw())?)
}

pub fn export_png(buffer: &PixelBuffer, path: &Path) -> FileResult<()> {
    rgba_image(buffer)?.save_with_format(path, ImageFormat::Png)?;
    log::info!("Exported {}x{} PNG to {}", buffer.width(), buffer.height(), path.display());
    Ok(())
}

pub fn import_png(path: &Path) -> FileResult<PixelBuffer> {
    decode_image(&fs::read(path)?)
}

/// Writes every composited frame as `<stem>_<index>.png` into `dir`
pub fn export_frames(canvas: &mut Canvas, dir: &Path, stem: &str) -> FileResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for index in 0..canvas.document().frame_count() {
        let path = dir.join(format!("{}_{:03}.png", stem, index));
        export_png(&canvas.composited_frame(index), &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Wraps an imported image in a new layer; the canvas crops or pads it to
/// its own size
pub fn layer_from_image(name: &str, buffer: PixelBuffer, frame_count: usize) -> Layer {
    let mut layer = Layer::new(name, buffer.width(), buffer.height(), frame_count.max(1));
    if let Some(frame) = layer.frame_mut(0) {
        frame.buffer = buffer;
    }
    layer
}

/// What a dropped file turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedContent {
    ImageLayer(String),
    Project(String),
}

pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            dropped_files: Vec::new(),
        }
    }

    /// Picks up newly dropped files from the UI context.
    /// Returns true if there is something to process.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let mut new_dropped_files = false;
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
                new_dropped_files = true;
            }
        });
        new_dropped_files
    }

    /// Turns dropped images into layers and dropped projects into the open
    /// document.
    ///
    /// A file listed twice in one drop is loaded once; dropping it again
    /// later loads it again.
    pub fn process_dropped_files(&mut self, canvas: &mut Canvas) -> Vec<DroppedContent> {
        let mut loaded = Vec::new();
        let mut seen = HashSet::new();
        for file in std::mem::take(&mut self.dropped_files) {
            let file_name = display_name(&file);
            if !seen.insert(file_name.clone()) {
                log::info!("Skipping duplicate dropped file {}", file_name);
                continue;
            }
            match self.load_dropped(&file, &file_name, canvas) {
                Ok(content) => loaded.push(content),
                Err(err) => log::error!("Failed to load dropped file {}: {}", file_name, err),
            }
        }
        loaded
    }

    fn load_dropped(
        &self,
        file: &egui::DroppedFile,
        file_name: &str,
        canvas: &mut Canvas,
    ) -> FileResult<DroppedContent> {
        if is_project_file(file) {
            let Some(path) = &file.path else {
                return Err(FileError::Unsupported(format!("{} has no path", file_name)));
            };
            canvas.replace_document(load_document(path)?)?;
            return Ok(DroppedContent::Project(file_name.to_owned()));
        }
        if !is_image_file(file) {
            return Err(FileError::Unsupported(file_name.to_owned()));
        }

        let buffer = if let Some(bytes) = &file.bytes {
            log::info!("Processing image from memory: {} ({} bytes)", file_name, bytes.len());
            decode_image(bytes)?
        } else if let Some(path) = &file.path {
            log::info!("Processing image from path: {}", path.display());
            import_png(path)?
        } else {
            return Err(FileError::Unsupported(format!("{} has no data", file_name)));
        };
        let name = file
            .path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_owned());
        let layer = layer_from_image(&name, buffer, canvas.document().frame_count());
        canvas.import_layer(layer)?;
        Ok(DroppedContent::ImageLayer(name))
    }

    /// Shows an overlay while files are dragged over the window
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Dropping files:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None => text += "\n(Path not available)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

fn extension(file: &egui::DroppedFile) -> Option<String> {
    let from_path = file.path.as_deref().and_then(Path::extension);
    let from_name = Path::new(&file.name).extension();
    from_path
        .or(from_name)
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    matches!(
        extension(file).as_deref(),
        Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
    )
}

fn is_project_file(file: &egui::DroppedFile) -> bool {
    file.mime == "application/json" || extension(file).as_deref() == Some("json")
}
