use egui::Color32;
use serde::{Deserialize, Serialize};

/// A straight (non-premultiplied) RGBA color with normalized channels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// The same color expressed as hue/saturation/value/alpha.
///
/// `h` is a fraction of a full turn in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsva {
    pub h: f32,
    pub s: f32,
    pub v: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| c as f32 / 255.0);
        Self { r, g, b, a }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Copy of this color with its alpha multiplied by `factor`
    pub fn scale_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Standard source-over compositing of `self` on top of `dst`
    pub fn over(self, dst: Color) -> Color {
        let sa = self.a.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let da = dst.a.clamp(0.0, 1.0);
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
        Color {
            r: mix(self.r, dst.r),
            g: mix(self.g, dst.g),
            b: mix(self.b, dst.b),
            a: out_a,
        }
    }

    pub fn to_hsva(self) -> Hsva {
        Hsva::from(self)
    }

    /// Per-channel comparison with a tolerance, for float rounding
    pub fn approx_eq(&self, other: &Color, epsilon: f32) -> bool {
        (self.r - other.r).abs() <= epsilon
            && (self.g - other.g).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.a - other.a).abs() <= epsilon
    }
}

impl From<Color> for Hsva {
    fn from(c: Color) -> Self {
        let max = c.r.max(c.g).max(c.b);
        let min = c.r.min(c.g).min(c.b);
        let delta = max - min;

        let h = if delta <= 0.0 {
            0.0
        } else if max == c.r {
            ((c.g - c.b) / delta).rem_euclid(6.0) / 6.0
        } else if max == c.g {
            ((c.b - c.r) / delta + 2.0) / 6.0
        } else {
            ((c.r - c.g) / delta + 4.0) / 6.0
        };
        let s = if max <= 0.0 { 0.0 } else { delta / max };

        Hsva {
            h: h.rem_euclid(1.0),
            s,
            v: max,
            a: c.a,
        }
    }
}

impl From<Hsva> for Color {
    fn from(hsva: Hsva) -> Self {
        let Hsva { h, s, v, a } = hsva;
        let h6 = h.rem_euclid(1.0) * 6.0;
        let sector = h6.floor();
        let f = h6 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        // rem_euclid rounds tiny negative hues up to 1.0, so sector 6 wraps to red
        let (r, g, b) = match (sector as i32).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Color { r, g, b, a }
    }
}

impl From<Color32> for Color {
    fn from(c: Color32) -> Self {
        Self::from_rgba8(c.to_srgba_unmultiplied())
    }
}

impl From<Color> for Color32 {
    fn from(c: Color) -> Self {
        let [r, g, b, a] = c.to_rgba8();
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_primary_hues() {
        assert!((Color::RED.to_hsva().h - 0.0).abs() < EPS);
        assert!((Color::GREEN.to_hsva().h - 1.0 / 3.0).abs() < EPS);
        assert!((Color::BLUE.to_hsva().h - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_hsva_round_trip() {
        let colors = [
            Color::new(0.2, 0.4, 0.6, 0.8),
            Color::new(0.9, 0.1, 0.5, 1.0),
            Color::new(0.5, 0.5, 0.5, 0.3),
            Color::BLACK,
            Color::WHITE,
        ];
        for color in colors {
            let back = Color::from(color.to_hsva());
            assert!(back.approx_eq(&color, EPS), "{color:?} -> {back:?}");
        }
    }

    #[test]
    fn test_hue_just_below_zero_is_red() {
        let hsva = Hsva {
            h: -1e-9,
            s: 1.0,
            v: 1.0,
            a: 1.0,
        };
        assert!(Color::from(hsva).approx_eq(&Color::RED, EPS));
        let wrapped = Hsva { h: 1.0, ..hsva };
        assert!(Color::from(wrapped).approx_eq(&Color::RED, EPS));
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let hsva = Color::rgb(0.5, 0.5, 0.5).to_hsva();
        assert_eq!(hsva.s, 0.0);
        assert!((hsva.v - 0.5).abs() < EPS);
    }

    #[test]
    fn test_source_over() {
        let blended = Color::new(0.0, 0.0, 1.0, 0.5).over(Color::RED);
        assert!(blended.approx_eq(&Color::new(0.5, 0.0, 0.5, 1.0), EPS));

        // Transparent source leaves the destination alone
        assert_eq!(Color::TRANSPARENT.over(Color::GREEN), Color::GREEN);
    }

    #[test]
    fn test_rgba8_conversion() {
        assert_eq!(Color::RED.to_rgba8(), [255, 0, 0, 255]);
        let c = Color::from_rgba8([0, 128, 255, 64]);
        assert_eq!(c.to_rgba8(), [0, 128, 255, 64]);
    }
}
