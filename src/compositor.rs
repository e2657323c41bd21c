//! Flattens a layer stack into one displayable buffer per animation frame.

use crate::error::CanvasError;
use crate::layer::Layer;
use crate::pixel_buffer::PixelBuffer;

/// Output of [`composite`]: the flattened buffer plus any layers that had to
/// be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub buffer: PixelBuffer,
    pub errors: Vec<CanvasError>,
}

/// Blends `layers` (bottom first) for `frame_index` onto a transparent
/// `width` x `height` buffer.
///
/// Invisible layers are skipped. A layer without the requested frame is
/// reported in [`Composite::errors`] and skipped instead of failing the whole
/// composite. Inputs are never modified.
pub fn composite(layers: &[Layer], frame_index: usize, width: u32, height: u32) -> Composite {
    let mut out = PixelBuffer::new(width, height);
    let mut errors = Vec::new();

    for layer in layers.iter().filter(|l| l.visible) {
        let Some(frame) = layer.frame(frame_index) else {
            log::warn!(
                "Layer '{}' has {} frames, skipping it for frame {}",
                layer.name,
                layer.frame_count(),
                frame_index
            );
            errors.push(CanvasError::FrameIndexOutOfRange {
                layer: layer.id,
                index: frame_index,
                frame_count: layer.frame_count(),
            });
            continue;
        };
        if layer.opacity <= 0.0 {
            continue;
        }
        blend_onto(&mut out, &frame.buffer, layer);
    }

    Composite { buffer: out, errors }
}

/// Blends the top-left overlap of `src` onto `dst`, row by row
fn blend_onto(dst: &mut PixelBuffer, src: &PixelBuffer, layer: &Layer) {
    let width = dst.width().min(src.width()) as usize;
    let height = dst.height().min(src.height()) as usize;
    if width == 0 || height == 0 {
        return;
    }
    let (dst_stride, src_stride) = (dst.width() as usize, src.width() as usize);
    let dst_rows = dst.pixels_mut().chunks_exact_mut(dst_stride);
    let src_rows = src.pixels().chunks_exact(src_stride);
    for (dst_row, src_row) in dst_rows.zip(src_rows).take(height) {
        for (d, &s) in dst_row[..width].iter_mut().zip(&src_row[..width]) {
            if !s.is_transparent() {
                *d = layer.blend_mode.blend(s, *d, layer.opacity);
            }
        }
    }
}
