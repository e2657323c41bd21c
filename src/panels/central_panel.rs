use egui::{Color32, Sense, Stroke, pos2};

use crate::PaintApp;
use crate::input::Viewport;

/// Size of the checkerboard squares behind transparent pixels, in points
const CHECKER_SIZE: f32 = 8.0;

pub fn central_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        let canvas_rect = response.rect;

        let (scroll, middle_drag) = ctx.input(|i| {
            let middle = i.pointer.middle_down().then(|| i.pointer.delta());
            (i.raw_scroll_delta.y, middle)
        });

        app.handle_input(ctx, canvas_rect);

        let (canvas, viewport, textures) = app.view_parts();
        let Some(viewport) = viewport.as_mut() else {
            return;
        };
        if response.hovered() && scroll != 0.0 {
            viewport.set_zoom(viewport.zoom() + scroll.signum());
        }
        if let Some(delta) = middle_drag {
            viewport.pan_by(delta);
        }

        let image_rect = viewport.screen_rect();
        paint_checkerboard(&painter, image_rect);

        let frame_index = canvas.document().active_frame_index();
        let composite = canvas.composited_frame(frame_index);
        match textures.texture_for(ctx, frame_index, canvas.revision(), &composite) {
            Ok(texture) => {
                let uv = egui::Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(texture, image_rect, uv, Color32::WHITE);
            }
            Err(e) => log::error!("Failed to upload canvas: {}", e),
        }
        painter.rect_stroke(image_rect, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));

        if let Some(pos) = response.hover_pos() {
            paint_cursor(&painter, viewport, pos);
        }
    });
}

fn paint_checkerboard(painter: &egui::Painter, rect: egui::Rect) {
    let visible = rect.intersect(painter.clip_rect());
    if !visible.is_positive() {
        return;
    }
    painter.rect_filled(visible, 0.0, Color32::from_gray(200));
    let clipped = painter.with_clip_rect(visible);
    let first_col = ((visible.min.x - rect.min.x) / CHECKER_SIZE).floor() as i64;
    let first_row = ((visible.min.y - rect.min.y) / CHECKER_SIZE).floor() as i64;
    let last_col = ((visible.max.x - rect.min.x) / CHECKER_SIZE).ceil() as i64;
    let last_row = ((visible.max.y - rect.min.y) / CHECKER_SIZE).ceil() as i64;
    for row in first_row..last_row {
        for col in first_col..last_col {
            if (row + col) % 2 == 0 {
                continue;
            }
            let min = rect.min + egui::vec2(col as f32, row as f32) * CHECKER_SIZE;
            let square = egui::Rect::from_min_size(min, egui::Vec2::splat(CHECKER_SIZE));
            clipped.rect_filled(square, 0.0, Color32::from_gray(150));
        }
    }
}

/// Outlines the pixel under the pointer
fn paint_cursor(painter: &egui::Painter, viewport: &Viewport, pos: egui::Pos2) {
    let pixel = viewport.screen_to_pixel(pos);
    let min = viewport.pixel_to_screen(pixel);
    let rect = egui::Rect::from_min_size(min, egui::Vec2::splat(viewport.zoom()));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::WHITE));
}
