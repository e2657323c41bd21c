//! Gap-free interpolation between two pointer samples.

use crate::brush::Brush;
use crate::color::Color;
use crate::draw_data::DrawData;
use crate::pixel_buffer::{PixelBuffer, PixelPos};

/// Every grid cell on the integer line from `p0` to `p1`, both included.
///
/// Consecutive cells differ by at most one unit on each axis.
pub fn points(p0: PixelPos, p1: PixelPos) -> Vec<PixelPos> {
    let dx = (p1.x as i64 - p0.x as i64).abs();
    let dy = -(p1.y as i64 - p0.y as i64).abs();
    let sx = if p0.x < p1.x { 1 } else { -1 };
    let sy = if p0.y < p1.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (p0.x, p0.y);

    let mut out = Vec::with_capacity(dx.max(-dy) as usize + 1);
    loop {
        out.push(PixelPos::new(x, y));
        if x == p1.x && y == p1.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    out
}

/// Stamps `brush` along the line from `p0` to `p1`.
///
/// Every stamp blends against `buffer` as it was before the line, and later
/// stamps replace earlier ones where they overlap, so a semi-transparent
/// brush never blends over itself.
pub fn rasterize(
    buffer: &PixelBuffer,
    p0: PixelPos,
    p1: PixelPos,
    brush: &Brush,
    color: Color,
) -> DrawData {
    let mut data = DrawData::new();
    for p in points(p0, p1) {
        data.merge(brush.apply(buffer, p, color));
    }
    data
}

/// Eraser counterpart of [`rasterize`]
pub fn rasterize_erase(buffer: &PixelBuffer, p0: PixelPos, p1: PixelPos, brush: &Brush) -> DrawData {
    let mut data = DrawData::new();
    for p in points(p0, p1) {
        data.merge(brush.erase(buffer, p));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushShape;

    fn assert_connected(line: &[PixelPos]) {
        for pair in line.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                (a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1 && a != b,
                "gap between {a:?} and {b:?}"
            );
        }
    }

    #[test]
    fn test_degenerate_line() {
        let p = PixelPos::new(3, 4);
        assert_eq!(points(p, p), vec![p]);
    }

    #[test]
    fn test_endpoints_included() {
        let cases = [
            ((0, 0), (7, 3)),
            ((7, 3), (0, 0)),
            ((2, 9), (2, -4)),
            ((-5, 1), (6, 1)),
            ((0, 0), (-3, -11)),
            ((4, 4), (9, 9)),
        ];
        for (a, b) in cases {
            let (a, b) = (PixelPos::from(a), PixelPos::from(b));
            let line = points(a, b);
            assert_eq!(line.first(), Some(&a));
            assert_eq!(line.last(), Some(&b));
            assert_connected(&line);
            let steps = (a.x - b.x).abs().max((a.y - b.y).abs()) as usize;
            assert_eq!(line.len(), steps + 1);
        }
    }

    #[test]
    fn test_rasterize_degenerate_equals_apply() {
        let mut buffer = PixelBuffer::filled(8, 8, Color::WHITE);
        buffer.set(3, 3, Color::GREEN).unwrap();
        let brush = Brush::new(BrushShape::Circle, 3);
        let color = Color::new(0.2, 0.3, 0.9, 0.6);
        let p = PixelPos::new(3, 3);
        assert_eq!(rasterize(&buffer, p, p, &brush, color), brush.apply(&buffer, p, color));
    }

    #[test]
    fn test_overlapping_stamps_do_not_double_blend() {
        let buffer = PixelBuffer::filled(6, 1, Color::WHITE);
        let brush = Brush::new(BrushShape::Square, 3);
        let color = Color::new(0.0, 0.0, 0.0, 0.5);
        let data = rasterize(&buffer, PixelPos::new(1, 0), PixelPos::new(4, 0), &brush, color);

        let single = color.over(Color::WHITE);
        for (_, c) in &data {
            assert!(c.approx_eq(&single, 1e-6));
        }
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn test_rasterize_erase() {
        let buffer = PixelBuffer::filled(5, 5, Color::RED);
        let data = rasterize_erase(&buffer, PixelPos::new(0, 0), PixelPos::new(4, 4), &Brush::default());
        assert_eq!(data.len(), 5);
        assert!(data.iter().all(|(p, c)| p.x == p.y && *c == Color::TRANSPARENT));
    }
}
