use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::command::BufferStore;
use crate::error::{CanvasError, CanvasResult};
use crate::layer::{Frame, Layer, LayerFrameId, LayerId};
use crate::palette::Palette;
use crate::pixel_buffer::{Anchor, PixelBuffer};

/// The project being edited: canvas size, the layer stack and the palette.
///
/// Every layer always has the same number of frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    width: u32,
    height: u32,
    /// Layers, bottom first
    layers: Vec<Layer>,
    active_layer: usize,
    active_frame: usize,
    pub palette: Palette,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            layers: vec![Layer::new("Layer 1", 64, 64, 1)],
            active_layer: 0,
            active_frame: 0,
            palette: Palette::default(),
        }
    }
}

impl Document {
    /// A document with one blank layer and `frame_count` frames
    pub fn new(width: u32, height: u32, frame_count: usize) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            layers: vec![Layer::new("Layer 1", width, height, frame_count.max(1))],
            active_layer: 0,
            active_frame: 0,
            palette: Palette::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> CanvasResult<&mut Layer> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(CanvasError::LayerIndexOutOfRange { index, count })
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn frame_count(&self) -> usize {
        self.layers.first().map_or(0, Layer::frame_count)
    }

    pub fn active_layer_index(&self) -> usize {
        self.active_layer
    }

    pub fn active_frame_index(&self) -> usize {
        self.active_frame
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_layer)
    }

    pub fn set_active_layer(&mut self, index: usize) -> CanvasResult<()> {
        if index >= self.layers.len() {
            return Err(CanvasError::LayerIndexOutOfRange {
                index,
                count: self.layers.len(),
            });
        }
        self.active_layer = index;
        Ok(())
    }

    pub fn set_active_frame(&mut self, index: usize) -> CanvasResult<()> {
        if index >= self.frame_count() {
            let layer = self.layers.first().map(|l| l.id).unwrap_or_default();
            return Err(CanvasError::FrameIndexOutOfRange {
                layer,
                index,
                frame_count: self.frame_count(),
            });
        }
        self.active_frame = index;
        Ok(())
    }

    /// The frame being edited
    pub fn active_frame(&self) -> CanvasResult<&Frame> {
        let (layer, frame) = (self.active_layer, self.active_frame);
        self.frame_at(layer, frame)
    }

    pub fn active_frame_mut(&mut self) -> CanvasResult<&mut Frame> {
        let (layer, frame) = (self.active_layer, self.active_frame);
        self.frame_at_mut(layer, frame)
    }

    pub fn frame_at(&self, layer: usize, frame: usize) -> CanvasResult<&Frame> {
        let l = self.layers.get(layer).ok_or(CanvasError::LayerIndexOutOfRange {
            index: layer,
            count: self.layers.len(),
        })?;
        l.frame(frame).ok_or(CanvasError::FrameIndexOutOfRange {
            layer: l.id,
            index: frame,
            frame_count: l.frame_count(),
        })
    }

    pub fn frame_at_mut(&mut self, layer: usize, frame: usize) -> CanvasResult<&mut Frame> {
        let l = self.layer_mut(layer)?;
        let (id, frame_count) = (l.id, l.frame_count());
        l.frame_mut(frame).ok_or(CanvasError::FrameIndexOutOfRange {
            layer: id,
            index: frame,
            frame_count,
        })
    }

    pub fn find_buffer(&self, id: LayerFrameId) -> Option<&PixelBuffer> {
        self.layers
            .iter()
            .flat_map(|l| l.frames.iter())
            .find(|f| f.id == id)
            .map(|f| &f.buffer)
    }

    /// Inserts a blank layer above the active one and makes it active
    pub fn add_layer(&mut self, name: &str) -> LayerId {
        let layer = Layer::new(name, self.width, self.height, self.frame_count().max(1));
        let id = layer.id;
        let index = (self.active_layer + 1).min(self.layers.len());
        self.layers.insert(index, layer);
        self.active_layer = index;
        log::info!("Added layer '{}' at {}", name, index);
        id
    }

    /// Inserts an existing layer on top, resizing its frames to match
    pub fn push_layer(&mut self, mut layer: Layer) -> LayerId {
        let frame_count = self.frame_count().max(1);
        layer.frames.truncate(frame_count);
        while layer.frames.len() < frame_count {
            layer.frames.push(Frame::blank(self.width, self.height));
        }
        for frame in &mut layer.frames {
            if frame.buffer.width() != self.width || frame.buffer.height() != self.height {
                frame.buffer.resize(self.width, self.height, Color::TRANSPARENT);
            }
        }
        let id = layer.id;
        self.layers.push(layer);
        self.active_layer = self.layers.len() - 1;
        id
    }

    pub fn remove_layer(&mut self, index: usize) -> CanvasResult<Layer> {
        if index >= self.layers.len() {
            return Err(CanvasError::LayerIndexOutOfRange {
                index,
                count: self.layers.len(),
            });
        }
        if self.layers.len() == 1 {
            return Err(CanvasError::LastLayer);
        }
        let layer = self.layers.remove(index);
        if self.active_layer >= self.layers.len() || self.active_layer > index {
            self.active_layer = self.active_layer.saturating_sub(1);
        }
        log::info!("Removed layer '{}'", layer.name);
        Ok(layer)
    }

    /// Moves the layer at `from` to position `to`, keeping it active if it was
    pub fn move_layer(&mut self, from: usize, to: usize) -> CanvasResult<()> {
        let count = self.layers.len();
        if from >= count || to >= count {
            return Err(CanvasError::LayerIndexOutOfRange {
                index: from.max(to),
                count,
            });
        }
        let active_id = self.layers[self.active_layer].id;
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.active_layer = self.layer_index(active_id).unwrap_or(0);
        Ok(())
    }

    /// Appends a blank frame to every layer; returns its index
    pub fn add_frame(&mut self) -> usize {
        for layer in &mut self.layers {
            layer.frames.push(Frame::blank(self.width, self.height));
        }
        self.frame_count() - 1
    }

    /// Inserts a copy of frame `index` after it in every layer
    pub fn duplicate_frame(&mut self, index: usize) -> CanvasResult<usize> {
        self.check_frame(index)?;
        for layer in &mut self.layers {
            let copy = Frame::new(layer.frames[index].buffer.clone());
            layer.frames.insert(index + 1, copy);
        }
        Ok(index + 1)
    }

    pub fn remove_frame(&mut self, index: usize) -> CanvasResult<()> {
        self.check_frame(index)?;
        if self.frame_count() == 1 {
            return Err(CanvasError::LastFrame);
        }
        for layer in &mut self.layers {
            layer.frames.remove(index);
        }
        if self.active_frame >= self.frame_count() || self.active_frame > index {
            self.active_frame = self.active_frame.saturating_sub(1);
        }
        Ok(())
    }

    fn check_frame(&self, index: usize) -> CanvasResult<()> {
        if index < self.frame_count() {
            return Ok(());
        }
        let layer = self.layers.first().map(|l| l.id).unwrap_or_default();
        Err(CanvasError::FrameIndexOutOfRange {
            layer,
            index,
            frame_count: self.frame_count(),
        })
    }

    /// Resizes every layer-frame, placing existing content by `anchor`
    pub fn resize(&mut self, width: u32, height: u32, anchor: Anchor) -> CanvasResult<()> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        for frame in self.layers.iter_mut().flat_map(|l| l.frames.iter_mut()) {
            frame.buffer.resize_anchored(width, height, anchor, Color::TRANSPARENT);
        }
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl BufferStore for Document {
    fn buffer_mut(&mut self, id: LayerFrameId) -> Option<&mut PixelBuffer> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.frames.iter_mut())
            .find(|f| f.id == id)
            .map(|f| &mut f.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document() {
        let doc = Document::new(16, 8, 2).unwrap();
        assert_eq!(doc.layers().len(), 1);
        assert_eq!(doc.frame_count(), 2);
        assert_eq!(doc.active_frame().unwrap().buffer.width(), 16);
        assert!(Document::new(0, 8, 1).is_err());
    }

    #[test]
    fn test_add_and_remove_layers() {
        let mut doc = Document::new(4, 4, 2).unwrap();
        doc.add_layer("Top");
        assert_eq!(doc.active_layer_index(), 1);
        assert_eq!(doc.layer(1).unwrap().frame_count(), 2);

        doc.remove_layer(1).unwrap();
        assert_eq!(doc.active_layer_index(), 0);
        assert_eq!(doc.remove_layer(0), Err(CanvasError::LastLayer));
    }

    #[test]
    fn test_move_layer_keeps_active() {
        let mut doc = Document::new(4, 4, 1).unwrap();
        let bottom = doc.layers()[0].id;
        doc.add_layer("Middle");
        doc.add_layer("Top");
        doc.set_active_layer(0).unwrap();

        doc.move_layer(0, 2).unwrap();
        assert_eq!(doc.layers()[2].id, bottom);
        assert_eq!(doc.active_layer_index(), 2);
    }

    #[test]
    fn test_frames_stay_in_sync() {
        let mut doc = Document::new(4, 4, 1).unwrap();
        doc.add_layer("Top");
        doc.frame_at_mut(1, 0).unwrap().buffer.fill(Color::RED);

        assert_eq!(doc.add_frame(), 1);
        assert_eq!(doc.duplicate_frame(0).unwrap(), 1);
        assert_eq!(doc.frame_count(), 3);
        assert!(doc.layers().iter().all(|l| l.frame_count() == 3));
        assert_eq!(doc.frame_at(1, 1).unwrap().buffer.get(0, 0).unwrap(), Color::RED);
        assert_ne!(doc.frame_at(1, 0).unwrap().id, doc.frame_at(1, 1).unwrap().id);

        doc.set_active_frame(2).unwrap();
        doc.remove_frame(2).unwrap();
        assert_eq!(doc.active_frame_index(), 1);
        assert!(doc.set_active_frame(5).is_err());
    }

    #[test]
    fn test_push_layer_normalizes_frames() {
        let mut doc = Document::new(4, 4, 2).unwrap();
        let layer = Layer::new("Imported", 2, 2, 1);
        doc.push_layer(layer);
        let imported = doc.layer(1).unwrap();
        assert_eq!(imported.frame_count(), 2);
        assert!(imported.frames.iter().all(|f| f.buffer.width() == 4));
    }

    #[test]
    fn test_buffer_store_lookup() {
        let mut doc = Document::new(4, 4, 1).unwrap();
        let id = doc.active_frame().unwrap().id;
        doc.buffer_mut(id).unwrap().set(1, 1, Color::BLUE).unwrap();
        assert_eq!(doc.find_buffer(id).unwrap().get(1, 1).unwrap(), Color::BLUE);
        assert!(doc.buffer_mut(LayerFrameId::new()).is_none());
    }

    #[test]
    fn test_resize_all_frames() {
        let mut doc = Document::new(4, 4, 2).unwrap();
        doc.resize(6, 2, Anchor::TopLeft).unwrap();
        assert_eq!((doc.width(), doc.height()), (6, 2));
        assert!(doc.layers()[0].frames.iter().all(|f| f.buffer.size() == [6, 2]));
    }
}
