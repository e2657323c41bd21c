use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::color::Color;
use crate::draw_data::DrawData;
use crate::pixel_buffer::{PixelBuffer, PixelPos};

/// Upper bound for brush sizes, in pixels
pub const MAX_BRUSH_SIZE: u32 = 64;

/// One entry of a stamp: where it lands relative to the center and how much
/// of the color's alpha it keeps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampPoint {
    pub offset: PixelPos,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrushShape {
    Square,
    Circle,
    Diamond,
    /// Circle whose alpha falls off linearly towards the rim
    SoftCircle,
    Custom(Vec<StampPoint>),
}

impl BrushShape {
    pub fn name(&self) -> &'static str {
        match self {
            BrushShape::Square => "Square",
            BrushShape::Circle => "Circle",
            BrushShape::Diamond => "Diamond",
            BrushShape::SoftCircle => "Soft circle",
            BrushShape::Custom(_) => "Custom",
        }
    }

    /// The built-in shapes, for tool pickers
    pub fn builtin() -> [BrushShape; 4] {
        [
            BrushShape::Square,
            BrushShape::Circle,
            BrushShape::Diamond,
            BrushShape::SoftCircle,
        ]
    }
}

/// A stamp painted at every point of a stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    name: String,
    shape: BrushShape,
    size: u32,
    stamp: Vec<StampPoint>,
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(BrushShape::Square, 1)
    }
}

impl Brush {
    pub fn new(shape: BrushShape, size: u32) -> Self {
        let size = size.clamp(1, MAX_BRUSH_SIZE);
        let stamp = build_stamp(&shape, size);
        Self {
            name: format!("{} {}", shape.name(), size),
            shape,
            size,
            stamp,
        }
    }

    /// A brush from an explicit stamp; later duplicates of an offset are dropped
    pub fn custom(name: &str, points: Vec<StampPoint>) -> Self {
        let mut seen = BTreeSet::new();
        let stamp: Vec<_> = points
            .into_iter()
            .filter(|p| seen.insert(p.offset))
            .map(|p| StampPoint {
                alpha: p.alpha.clamp(0.0, 1.0),
                ..p
            })
            .collect();
        let extent = stamp
            .iter()
            .map(|p| p.offset.x.unsigned_abs().max(p.offset.y.unsigned_abs()))
            .max()
            .unwrap_or(0);
        Self {
            name: name.to_owned(),
            shape: BrushShape::Custom(stamp.clone()),
            size: extent * 2 + 1,
            stamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &BrushShape {
        &self.shape
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn stamp(&self) -> &[StampPoint] {
        &self.stamp
    }

    /// Largest distance of any stamp offset from the center, per axis
    pub fn extent(&self) -> i32 {
        self.stamp
            .iter()
            .map(|p| p.offset.x.abs().max(p.offset.y.abs()))
            .max()
            .unwrap_or(0)
    }

    /// Stamps `color` at `center`, blended source-over onto `buffer`.
    ///
    /// Only in-bounds positions are returned; the buffer is not modified.
    pub fn apply(&self, buffer: &PixelBuffer, center: PixelPos, color: Color) -> DrawData {
        self.stamp_with(buffer, center, |alpha, existing| {
            color.scale_alpha(alpha).over(existing)
        })
    }

    /// Eraser counterpart of [`Brush::apply`]: removes `alpha` of the
    /// existing coverage, a full-strength entry leaves a transparent pixel
    pub fn erase(&self, buffer: &PixelBuffer, center: PixelPos) -> DrawData {
        self.stamp_with(buffer, center, |alpha, existing| {
            let remaining = existing.a * (1.0 - alpha.clamp(0.0, 1.0));
            if remaining <= 0.0 {
                Color::TRANSPARENT
            } else {
                Color { a: remaining, ..existing }
            }
        })
    }

    fn stamp_with(
        &self,
        buffer: &PixelBuffer,
        center: PixelPos,
        blend: impl Fn(f32, Color) -> Color,
    ) -> DrawData {
        let mut data = DrawData::new();
        for point in &self.stamp {
            let pos = center + point.offset;
            if let Ok(existing) = buffer.get_pos(pos) {
                data.insert(pos, blend(point.alpha, existing));
            }
        }
        data
    }
}

fn build_stamp(shape: &BrushShape, size: u32) -> Vec<StampPoint> {
    if let BrushShape::Custom(points) = shape {
        return points.clone();
    }
    let size = size as i32;
    // Even sizes put the extra pixel on the positive side
    let lo = -(size - 1) / 2;
    let hi = size / 2;
    // Distances are measured from the stamp's geometric center
    let mid = (lo + hi) as f32 / 2.0;
    let radius = size as f32 / 2.0;

    let mut stamp = Vec::new();
    for y in lo..=hi {
        for x in lo..=hi {
            let dx = x as f32 - mid;
            let dy = y as f32 - mid;
            let alpha = match shape {
                BrushShape::Square => Some(1.0),
                BrushShape::Circle => (dx * dx + dy * dy <= radius * radius).then_some(1.0),
                BrushShape::Diamond => (dx.abs() + dy.abs() <= radius).then_some(1.0),
                BrushShape::SoftCircle => {
                    let dist = (dx * dx + dy * dy).sqrt();
                    (dist <= radius).then(|| (1.0 - dist / radius).max(1.0 / radius))
                }
                BrushShape::Custom(_) => None,
            };
            if let Some(alpha) = alpha {
                stamp.push(StampPoint {
                    offset: PixelPos::new(x, y),
                    alpha: f32::min(alpha, 1.0),
                });
            }
        }
    }
    stamp
}
