//! Bounds-checked RGBA storage for a single layer-frame.

use serde::{Deserialize, Serialize};
use std::ops::Add;

use crate::color::Color;
use crate::draw_data::DrawData;
use crate::error::{CanvasError, CanvasResult};

/// A signed pixel coordinate.
///
/// Signed so that brush offsets and pointer positions left of or above the
/// canvas can be represented before they are bounds checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for PixelPos {
    type Output = PixelPos;

    fn add(self, rhs: PixelPos) -> PixelPos {
        PixelPos::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl From<(i32, i32)> for PixelPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned region of a buffer, `x..x+width` by `y..y+height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Where existing content lands when a buffer is resized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    pub fn all() -> &'static [Anchor] {
        &[
            Anchor::TopLeft,
            Anchor::Top,
            Anchor::TopRight,
            Anchor::Left,
            Anchor::Center,
            Anchor::Right,
            Anchor::BottomLeft,
            Anchor::Bottom,
            Anchor::BottomRight,
        ]
    }

    /// Offset of the old content's top-left corner inside the new buffer
    fn offset(self, old_w: u32, old_h: u32, new_w: u32, new_h: u32) -> (i64, i64) {
        let dx = new_w as i64 - old_w as i64;
        let dy = new_h as i64 - old_h as i64;
        let (fx, fy) = match self {
            Anchor::TopLeft => (0, 0),
            Anchor::Top => (1, 0),
            Anchor::TopRight => (2, 0),
            Anchor::Left => (0, 1),
            Anchor::Center => (1, 1),
            Anchor::Right => (2, 1),
            Anchor::BottomLeft => (0, 2),
            Anchor::Bottom => (1, 2),
            Anchor::BottomRight => (2, 2),
        };
        // Odd differences round towards the top-left
        ((dx * fx).div_euclid(2), (dy * fy).div_euclid(2))
    }
}

/// A 2D grid of colors, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPixelBuffer")]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

/// Unchecked serialized form of a `PixelBuffer`
#[derive(Deserialize)]
struct RawPixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl TryFrom<RawPixelBuffer> for PixelBuffer {
    type Error = CanvasError;

    fn try_from(raw: RawPixelBuffer) -> CanvasResult<Self> {
        if raw.pixels.len() != raw.width as usize * raw.height as usize {
            return Err(CanvasError::InvalidDimensions {
                width: raw.width,
                height: raw.height,
            });
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            pixels: raw.pixels,
        })
    }
}

impl PixelBuffer {
    /// Creates a fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Builds a buffer from tightly packed RGBA8 bytes
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> CanvasResult<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| Color::from_rgba8([px[0], px[1], px[2], px[3]]))
            .collect();
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn contains(&self, pos: PixelPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn out_of_bounds(&self, x: i64, y: i64) -> CanvasError {
        CanvasError::IndexOutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    /// Linear index of `(x, y)`
    pub fn index_of(&self, x: u32, y: u32) -> CanvasResult<usize> {
        if x < self.width && y < self.height {
            Ok(y as usize * self.width as usize + x as usize)
        } else {
            Err(self.out_of_bounds(x as i64, y as i64))
        }
    }

    pub fn get(&self, x: u32, y: u32) -> CanvasResult<Color> {
        let index = self.index_of(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) -> CanvasResult<()> {
        let index = self.index_of(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    pub fn get_index(&self, index: usize) -> CanvasResult<Color> {
        self.pixels.get(index).copied().ok_or_else(|| {
            let w = self.width.max(1) as usize;
            self.out_of_bounds((index % w) as i64, (index / w) as i64)
        })
    }

    pub fn get_pos(&self, pos: PixelPos) -> CanvasResult<Color> {
        if self.contains(pos) {
            self.get(pos.x as u32, pos.y as u32)
        } else {
            Err(self.out_of_bounds(pos.x as i64, pos.y as i64))
        }
    }

    pub fn set_pos(&mut self, pos: PixelPos, color: Color) -> CanvasResult<()> {
        if self.contains(pos) {
            self.set(pos.x as u32, pos.y as u32, color)
        } else {
            Err(self.out_of_bounds(pos.x as i64, pos.y as i64))
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Writes every in-bounds entry of `data`, returning how many were written
    pub fn apply(&mut self, data: &DrawData) -> usize {
        let mut written = 0;
        for (pos, color) in data.iter() {
            if self.set_pos(*pos, *color).is_ok() {
                written += 1;
            }
        }
        written
    }

    /// Reallocates to `new_width` x `new_height`, keeping the overlapping
    /// region aligned at the top-left corner
    pub fn resize(&mut self, new_width: u32, new_height: u32, fill: Color) {
        self.resize_anchored(new_width, new_height, Anchor::TopLeft, fill);
    }

    /// Reallocates, placing the old content according to `anchor`
    pub fn resize_anchored(&mut self, new_width: u32, new_height: u32, anchor: Anchor, fill: Color) {
        let (ox, oy) = anchor.offset(self.width, self.height, new_width, new_height);
        let mut resized = PixelBuffer::filled(new_width, new_height, fill);
        for y in 0..self.height {
            let ny = y as i64 + oy;
            if ny < 0 || ny >= new_height as i64 {
                continue;
            }
            for x in 0..self.width {
                let nx = x as i64 + ox;
                if nx < 0 || nx >= new_width as i64 {
                    continue;
                }
                let src = y as usize * self.width as usize + x as usize;
                let dst = ny as usize * new_width as usize + nx as usize;
                resized.pixels[dst] = self.pixels[src];
            }
        }
        *self = resized;
    }

    /// Copies `rect` out into its own buffer
    pub fn crop(&self, rect: PixelRect) -> CanvasResult<PixelBuffer> {
        if rect.x + rect.width > self.width || rect.y + rect.height > self.height {
            return Err(self.out_of_bounds(
                (rect.x + rect.width) as i64,
                (rect.y + rect.height) as i64,
            ));
        }
        let mut out = PixelBuffer::new(rect.width, rect.height);
        for row in 0..rect.height {
            let src = (rect.y + row) as usize * self.width as usize + rect.x as usize;
            let dst = row as usize * rect.width as usize;
            out.pixels[dst..dst + rect.width as usize]
                .copy_from_slice(&self.pixels[src..src + rect.width as usize]);
        }
        Ok(out)
    }

    /// Copies all of `src` into this buffer with its top-left at `(x, y)`
    pub fn blit(&mut self, src: &PixelBuffer, x: u32, y: u32) -> CanvasResult<()> {
        if x + src.width > self.width || y + src.height > self.height {
            return Err(self.out_of_bounds((x + src.width) as i64, (y + src.height) as i64));
        }
        for row in 0..src.height {
            let from = row as usize * src.width as usize;
            let to = (y + row) as usize * self.width as usize + x as usize;
            self.pixels[to..to + src.width as usize]
                .copy_from_slice(&src.pixels[from..from + src.width as usize]);
        }
        Ok(())
    }

    /// Bounding rectangle of every pixel that differs from `other`.
    ///
    /// `None` when the buffers are identical. Buffers of different sizes
    /// differ everywhere.
    pub fn diff_bounds(&self, other: &PixelBuffer) -> Option<PixelRect> {
        if self.width != other.width || self.height != other.height {
            return Some(self.bounds());
        }
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0, 0);
        let mut any = false;
        for y in 0..self.height {
            let row = y as usize * self.width as usize;
            for x in 0..self.width {
                let i = row + x as usize;
                if self.pixels[i] != other.pixels[i] {
                    any = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        any.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Tightly packed unmultiplied RGBA8, for texture upload and PNG export
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba8()).collect()
    }
}
