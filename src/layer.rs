use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::color::Color;
use crate::pixel_buffer::PixelBuffer;

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one cell of the layer/frame grid, i.e. one pixel buffer.
///
/// Stable across layer reordering and frame insertion, which is what undo
/// entries need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerFrameId(pub Uuid);

impl LayerFrameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerFrameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerFrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a layer combines with what is below it.
///
/// Each mode is a per-channel function `B(s, d)` of the source and
/// destination color; see [`BlendMode::blend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Subtract,
    ReverseSubtract,
    Multiply,
    Min,
    Max,
}

impl BlendMode {
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Add,
            BlendMode::Subtract,
            BlendMode::ReverseSubtract,
            BlendMode::Multiply,
            BlendMode::Min,
            BlendMode::Max,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Add => "Add",
            BlendMode::Subtract => "Subtract",
            BlendMode::ReverseSubtract => "Reverse subtract",
            BlendMode::Multiply => "Multiply",
            BlendMode::Min => "Min",
            BlendMode::Max => "Max",
        }
    }

    fn channel(self, s: f32, d: f32) -> f32 {
        match self {
            BlendMode::Normal => s,
            BlendMode::Add => (s + d).min(1.0),
            BlendMode::Subtract => (s - d).max(0.0),
            BlendMode::ReverseSubtract => (d - s).max(0.0),
            BlendMode::Multiply => s * d,
            BlendMode::Min => s.min(d),
            BlendMode::Max => s.max(d),
        }
    }

    /// Composites `src` (its alpha scaled by `opacity`) over `dst`.
    ///
    /// Where `dst` is transparent the source shows unmodified; where it is
    /// opaque the mode's channel function replaces the source color. The
    /// result is then composited source-over, so `Normal` is exactly
    /// standard alpha compositing.
    pub fn blend(self, src: Color, dst: Color, opacity: f32) -> Color {
        let sa = (src.a * opacity).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let da = dst.a.clamp(0.0, 1.0);
        let mix = |s: f32, d: f32| (1.0 - da) * s + da * self.channel(s, d);
        let mixed = Color::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), sa);
        mixed.over(dst)
    }
}

/// One animation frame of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: LayerFrameId,
    pub buffer: PixelBuffer,
}

impl Frame {
    pub fn new(buffer: PixelBuffer) -> Self {
        Self {
            id: LayerFrameId::new(),
            buffer,
        }
    }

    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(PixelBuffer::new(width, height))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier for the layer
    pub id: LayerId,
    /// Display name of the layer
    pub name: String,
    /// Whether the layer takes part in compositing
    pub visible: bool,
    /// Multiplier on every pixel's alpha, in `[0, 1]`
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub frames: Vec<Frame>,
}

impl Layer {
    /// A visible, fully opaque layer with `frame_count` blank frames
    pub fn new(name: &str, width: u32, height: u32, frame_count: usize) -> Self {
        Self {
            id: LayerId::new(),
            name: name.to_string(),
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            frames: (0..frame_count).map(|_| Frame::blank(width, height)).collect(),
        }
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn blend(mode: BlendMode, src: Color, dst: Color) -> Color {
        mode.blend(src, dst, 1.0)
    }

    #[test]
    fn test_normal_matches_source_over() {
        let src = Color::new(0.0, 0.0, 1.0, 0.5);
        let out = blend(BlendMode::Normal, src, Color::RED);
        assert!(out.approx_eq(&Color::new(0.5, 0.0, 0.5, 1.0), EPS));
    }

    #[test]
    fn test_opaque_channel_functions() {
        let s = Color::rgb(0.6, 0.2, 0.5);
        let d = Color::rgb(0.5, 0.4, 0.5);
        let cases = [
            (BlendMode::Add, Color::rgb(1.0, 0.6, 1.0)),
            (BlendMode::Subtract, Color::rgb(0.1, 0.0, 0.0)),
            (BlendMode::ReverseSubtract, Color::rgb(0.0, 0.2, 0.0)),
            (BlendMode::Multiply, Color::rgb(0.3, 0.08, 0.25)),
            (BlendMode::Min, Color::rgb(0.5, 0.2, 0.5)),
            (BlendMode::Max, Color::rgb(0.6, 0.4, 0.5)),
        ];
        for (mode, expected) in cases {
            let out = blend(mode, s, d);
            assert!(out.approx_eq(&expected, 1e-5), "{mode:?}: {out:?}");
        }
    }

    #[test]
    fn test_modes_over_transparent_show_source() {
        let src = Color::new(0.3, 0.6, 0.9, 1.0);
        for mode in BlendMode::all() {
            let out = blend(*mode, src, Color::TRANSPARENT);
            assert!(out.approx_eq(&src, EPS), "{mode:?}");
        }
    }

    #[test]
    fn test_opacity_scales_source_alpha() {
        let out = BlendMode::Normal.blend(Color::BLUE, Color::RED, 0.5);
        assert!(out.approx_eq(&Color::new(0.5, 0.0, 0.5, 1.0), EPS));
        assert_eq!(BlendMode::Normal.blend(Color::BLUE, Color::RED, 0.0), Color::RED);
    }

    #[test]
    fn test_new_layer_frames() {
        let layer = Layer::new("Background", 4, 2, 3);
        assert_eq!(layer.frame_count(), 3);
        assert!(layer.visible);
        assert_eq!(layer.frame(2).unwrap().buffer.width(), 4);
        assert_ne!(layer.frames[0].id, layer.frames[1].id);
        assert!(layer.frame(3).is_none());
    }
}
