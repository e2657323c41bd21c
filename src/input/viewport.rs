use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::pixel_buffer::PixelPos;

/// Maps between screen points and canvas pixels.
///
/// The canvas is drawn at an integer zoom, centered in the available rect
/// and shifted by `pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    available: Rect,
    canvas_size: [u32; 2],
    zoom: f32,
    pan: Vec2,
}

impl Viewport {
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 64.0;

    /// Largest integer zoom that fits the canvas inside `available`
    pub fn fit(available: Rect, width: u32, height: u32) -> Self {
        let zoom = (available.width() / width.max(1) as f32)
            .min(available.height() / height.max(1) as f32)
            .floor()
            .clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        Self {
            available,
            canvas_size: [width, height],
            zoom,
            pan: Vec2::ZERO,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.round().clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Keeps zoom and pan but adopts a new panel rect and canvas size
    pub fn update(&mut self, available: Rect, width: u32, height: u32) {
        self.available = available;
        self.canvas_size = [width, height];
    }

    /// Where the canvas is drawn on screen
    pub fn screen_rect(&self) -> Rect {
        let size = vec2(
            self.canvas_size[0] as f32 * self.zoom,
            self.canvas_size[1] as f32 * self.zoom,
        );
        Rect::from_center_size(self.available.center() + self.pan, size)
    }

    /// Whether a press at `pos` lands on the visible part of the canvas.
    ///
    /// The drawn canvas may extend past the panel when zoomed or panned;
    /// that part is hidden behind other panels and must not start a gesture.
    pub fn accepts_press(&self, pos: Pos2) -> bool {
        self.screen_rect().intersect(self.available).contains(pos)
    }

    /// The pixel under a screen point; may lie outside the canvas
    pub fn screen_to_pixel(&self, pos: Pos2) -> PixelPos {
        let local = (pos - self.screen_rect().min) / self.zoom;
        let clamp = |v: f32| v.floor().clamp(i32::MIN as f32, i32::MAX as f32) as i32;
        PixelPos::new(clamp(local.x), clamp(local.y))
    }

    /// Top-left screen point of a pixel
    pub fn pixel_to_screen(&self, pixel: PixelPos) -> Pos2 {
        let min = self.screen_rect().min;
        pos2(
            min.x + pixel.x as f32 * self.zoom,
            min.y + pixel.y as f32 * self.zoom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        // 100x60 panel, 10x5 canvas: zoom 10, canvas spans x 0..100, y 5..55
        Viewport::fit(Rect::from_min_size(Pos2::ZERO, vec2(100.0, 60.0)), 10, 5)
    }

    #[test]
    fn test_fit_uses_integer_zoom() {
        let vp = viewport();
        assert_eq!(vp.zoom(), 10.0);
        assert_eq!(vp.screen_rect(), Rect::from_min_max(pos2(0.0, 5.0), pos2(100.0, 55.0)));
    }

    #[test]
    fn test_screen_to_pixel() {
        let vp = viewport();
        assert_eq!(vp.screen_to_pixel(pos2(0.0, 5.0)), PixelPos::new(0, 0));
        assert_eq!(vp.screen_to_pixel(pos2(19.9, 14.9)), PixelPos::new(1, 0));
        assert_eq!(vp.screen_to_pixel(pos2(99.0, 54.0)), PixelPos::new(9, 4));
        // Outside the canvas maps to negative or past-the-end pixels
        assert_eq!(vp.screen_to_pixel(pos2(-1.0, 0.0)), PixelPos::new(-1, -1));
    }

    #[test]
    fn test_round_trip_through_screen() {
        let mut vp = viewport();
        vp.set_zoom(3.0);
        vp.pan_by(vec2(7.0, -2.0));
        for pixel in [PixelPos::new(0, 0), PixelPos::new(4, 3), PixelPos::new(9, 4)] {
            let screen = vp.pixel_to_screen(pixel) + vec2(0.5, 0.5);
            assert_eq!(vp.screen_to_pixel(screen), pixel);
        }
    }

    #[test]
    fn test_press_outside_panel_is_refused() {
        let mut vp = viewport();
        vp.pan_by(vec2(-40.0, 0.0));
        // The canvas now spans x -40..60, but the panel starts at x 0
        assert!(vp.screen_rect().contains(pos2(-20.0, 30.0)));
        assert!(!vp.accepts_press(pos2(-20.0, 30.0)));
        assert!(vp.accepts_press(pos2(20.0, 30.0)));
        // Inside the panel but off the canvas
        assert!(!vp.accepts_press(pos2(80.0, 30.0)));
    }

    #[test]
    fn test_tiny_panel_keeps_min_zoom() {
        let vp = Viewport::fit(Rect::from_min_size(Pos2::ZERO, vec2(4.0, 4.0)), 64, 64);
        assert_eq!(vp.zoom(), Viewport::MIN_ZOOM);
    }
}
