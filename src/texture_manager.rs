use std::collections::HashMap;
use std::sync::Arc;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;

use crate::pixel_buffer::PixelBuffer;

/// Errors that can occur during texture upload
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TextureGenerationError {
    #[error("Invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Converts a composite to an egui image; straight alpha is kept as is
pub fn color_image(buffer: &PixelBuffer) -> Result<ColorImage, TextureGenerationError> {
    if buffer.width() == 0 || buffer.height() == 0 {
        return Err(TextureGenerationError::InvalidDimensions {
            width: buffer.width(),
            height: buffer.height(),
        });
    }
    Ok(ColorImage::from_rgba_unmultiplied(buffer.size(), &buffer.to_rgba8()))
}

/// One uploaded frame. Dropping it releases the GPU texture.
struct CachedTexture {
    revision: u64,
    handle: TextureHandle,
    last_used: u64,
}

/// Keeps one GPU texture per animation frame and re-uploads it only when
/// the canvas revision moves on
pub struct TextureManager {
    textures: HashMap<usize, CachedTexture>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    max_cache_size: usize,
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            textures: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Increments the frame counter, should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Texture for `frame_index` at `revision`, uploading `composite` if the
    /// cached one is stale
    pub fn texture_for(
        &mut self,
        ctx: &Context,
        frame_index: usize,
        revision: u64,
        composite: &Arc<PixelBuffer>,
    ) -> Result<TextureId, TextureGenerationError> {
        if let Some(cached) = self.textures.get_mut(&frame_index) {
            if cached.revision != revision {
                cached.handle.set(color_image(composite)?, TextureOptions::NEAREST);
                cached.revision = revision;
            }
            cached.last_used = self.current_frame;
            return Ok(cached.handle.id());
        }

        self.prune_cache_if_needed();

        let name = format!("canvas_frame_{}", frame_index);
        let handle = ctx.load_texture(name, color_image(composite)?, TextureOptions::NEAREST);
        let id = handle.id();
        self.textures.insert(
            frame_index,
            CachedTexture {
                revision,
                handle,
                last_used: self.current_frame,
            },
        );
        Ok(id)
    }

    /// Drops the oldest textures until there is room for one more
    fn prune_cache_if_needed(&mut self) {
        while self.textures.len() >= self.max_cache_size {
            let Some(oldest) = self
                .textures
                .iter()
                .min_by_key(|(_, t)| t.last_used)
                .map(|(index, _)| *index)
            else {
                return;
            };
            self.textures.remove(&oldest);
        }
    }

    /// Frees every texture, e.g. after the canvas was resized
    pub fn clear_cache(&mut self) {
        self.textures.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.textures.len()
    }

    #[cfg(test)]
    fn cached_revision(&self, frame_index: usize) -> Option<u64> {
        self.textures.get(&frame_index).map(|t| t.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn composite() -> Arc<PixelBuffer> {
        Arc::new(PixelBuffer::filled(4, 4, Color::RED))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);
        let buffer = composite();

        let first = manager.texture_for(&ctx, 0, 1, &buffer).unwrap();
        let second = manager.texture_for(&ctx, 0, 1, &buffer).unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_new_revision_reuses_handle() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);
        let first = manager.texture_for(&ctx, 0, 1, &composite()).unwrap();
        let second = manager.texture_for(&ctx, 0, 2, &composite()).unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.cached_revision(0), Some(2));
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        manager.texture_for(&ctx, 0, 1, &composite()).unwrap();
        manager.begin_frame();
        manager.texture_for(&ctx, 1, 1, &composite()).unwrap();
        manager.begin_frame();
        manager.texture_for(&ctx, 2, 1, &composite()).unwrap();

        assert_eq!(manager.cache_size(), 2);
        assert_eq!(manager.cached_revision(0), None);
        assert!(manager.cached_revision(1).is_some());
        assert!(manager.cached_revision(2).is_some());
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let empty = PixelBuffer::new(0, 3);
        assert_eq!(
            color_image(&empty).unwrap_err(),
            TextureGenerationError::InvalidDimensions { width: 0, height: 3 }
        );
    }

    #[test]
    fn test_color_image_keeps_straight_alpha() {
        let buffer = PixelBuffer::filled(1, 1, Color::new(1.0, 0.0, 0.0, 0.5));
        let image = color_image(&buffer).unwrap();
        assert_eq!(image.size, [1, 1]);
        let [r, _, _, a] = image.pixels[0].to_srgba_unmultiplied();
        assert_eq!(a, 128);
        assert!(r >= 254);
    }
}
