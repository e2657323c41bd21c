use serde::{Deserialize, Serialize};

use crate::color::{Color, Hsva};
use crate::pixel_buffer::PixelBuffer;

/// Whole-buffer color adjustments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColorTransform {
    Invert,
    Grayscale,
    /// Rotate hue by a fraction of a full turn
    HueShift(f32),
    /// Add to every RGB channel
    Brightness(f32),
    /// Pull saturation towards zero by the given amount in `[0, 1]`
    Desaturate(f32),
}

impl ColorTransform {
    pub fn name(&self) -> &'static str {
        match self {
            ColorTransform::Invert => "Invert",
            ColorTransform::Grayscale => "Grayscale",
            ColorTransform::HueShift(_) => "Hue shift",
            ColorTransform::Brightness(_) => "Brightness",
            ColorTransform::Desaturate(_) => "Desaturate",
        }
    }

    pub fn apply_color(&self, c: Color) -> Color {
        match *self {
            ColorTransform::Invert => Color::new(1.0 - c.r, 1.0 - c.g, 1.0 - c.b, c.a),
            ColorTransform::Grayscale => {
                let luma = 0.299 * c.r + 0.587 * c.g + 0.114 * c.b;
                Color::new(luma, luma, luma, c.a)
            }
            ColorTransform::HueShift(turns) => {
                let hsva = c.to_hsva();
                Color::from(Hsva {
                    h: (hsva.h + turns).rem_euclid(1.0),
                    ..hsva
                })
            }
            ColorTransform::Brightness(amount) => Color::new(
                (c.r + amount).clamp(0.0, 1.0),
                (c.g + amount).clamp(0.0, 1.0),
                (c.b + amount).clamp(0.0, 1.0),
                c.a,
            ),
            ColorTransform::Desaturate(amount) => {
                let hsva = c.to_hsva();
                Color::from(Hsva {
                    s: hsva.s * (1.0 - amount.clamp(0.0, 1.0)),
                    ..hsva
                })
            }
        }
    }

    /// Applies the transform to every visible pixel of `buffer`.
    ///
    /// Fully transparent pixels are left as they are.
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let mut out = buffer.clone();
        for c in out.pixels_mut().iter_mut().filter(|c| !c.is_transparent()) {
            *c = self.apply_color(*c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_invert_twice_is_identity() {
        let c = Color::new(0.2, 0.7, 0.4, 0.9);
        let twice = ColorTransform::Invert.apply_color(ColorTransform::Invert.apply_color(c));
        assert!(twice.approx_eq(&c, EPS));
    }

    #[test]
    fn test_hue_shift_rotates_primaries() {
        let shifted = ColorTransform::HueShift(1.0 / 3.0).apply_color(Color::RED);
        assert!(shifted.approx_eq(&Color::GREEN, EPS));
    }

    #[test]
    fn test_grayscale_and_desaturate_agree_on_gray() {
        let gray = Color::rgb(0.4, 0.4, 0.4);
        assert!(ColorTransform::Grayscale.apply_color(gray).approx_eq(&gray, EPS));
        assert!(ColorTransform::Desaturate(1.0).apply_color(gray).approx_eq(&gray, EPS));

        let desaturated = ColorTransform::Desaturate(1.0).apply_color(Color::RED);
        assert!(desaturated.approx_eq(&Color::WHITE, EPS));
    }

    #[test]
    fn test_transparent_pixels_untouched() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.set(1, 0, Color::BLACK).unwrap();
        let out = ColorTransform::Invert.apply(&buffer);
        assert_eq!(out.get(0, 0).unwrap(), Color::TRANSPARENT);
        assert_eq!(out.get(1, 0).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_apply_covers_every_row() {
        let mut buffer = PixelBuffer::filled(3, 3, Color::BLACK);
        buffer.set(1, 1, Color::TRANSPARENT).unwrap();
        let out = ColorTransform::Invert.apply(&buffer);
        assert_eq!(out.get(2, 2).unwrap(), Color::WHITE);
        assert_eq!(out.get(0, 2).unwrap(), Color::WHITE);
        assert_eq!(out.get(1, 1).unwrap(), Color::TRANSPARENT);
        assert_eq!(buffer.get(2, 2).unwrap(), Color::BLACK);
    }
}
