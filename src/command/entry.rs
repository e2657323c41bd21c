use crate::error::CanvasResult;
use crate::layer::LayerFrameId;
use crate::pixel_buffer::{PixelBuffer, PixelRect};

/// One undoable change to a single layer-frame
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    target: LayerFrameId,
    region: PixelRect,
    before: PixelBuffer,
    after: PixelBuffer,
}

impl UndoEntry {
    /// Captures the part of `before`/`after` that differs.
    ///
    /// Returns `None` when the two buffers are identical.
    pub fn capture(
        target: LayerFrameId,
        before: &PixelBuffer,
        after: &PixelBuffer,
    ) -> CanvasResult<Option<Self>> {
        let Some(region) = before.diff_bounds(after) else {
            return Ok(None);
        };
        Ok(Some(Self {
            target,
            region,
            before: before.crop(region)?,
            after: after.crop(region)?,
        }))
    }

    pub fn target(&self) -> LayerFrameId {
        self.target
    }

    pub fn region(&self) -> PixelRect {
        self.region
    }

    pub fn restore_before(&self, buffer: &mut PixelBuffer) -> CanvasResult<()> {
        buffer.blit(&self.before, self.region.x, self.region.y)
    }

    pub fn restore_after(&self, buffer: &mut PixelBuffer) -> CanvasResult<()> {
        buffer.blit(&self.after, self.region.x, self.region.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_capture_crops_to_changes() {
        let before = PixelBuffer::new(8, 8);
        let mut after = before.clone();
        after.set(2, 3, Color::RED).unwrap();
        after.set(4, 3, Color::RED).unwrap();

        let entry = UndoEntry::capture(LayerFrameId::new(), &before, &after)
            .unwrap()
            .unwrap();
        assert_eq!(entry.region(), PixelRect::new(2, 3, 3, 1));

        let mut buffer = after.clone();
        entry.restore_before(&mut buffer).unwrap();
        assert_eq!(buffer, before);
        entry.restore_after(&mut buffer).unwrap();
        assert_eq!(buffer, after);
    }

    #[test]
    fn test_capture_without_changes() {
        let buffer = PixelBuffer::filled(2, 2, Color::WHITE);
        assert!(UndoEntry::capture(LayerFrameId::new(), &buffer, &buffer).unwrap().is_none());
    }
}
