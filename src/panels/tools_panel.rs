use std::path::PathBuf;

use egui::{Color32, vec2};

use crate::PaintApp;
use crate::brush::{Brush, BrushShape, MAX_BRUSH_SIZE};
use crate::color::Color;
use crate::layer::BlendMode;
use crate::pixel_buffer::Anchor;
use crate::tools::ToolType;
use crate::transform::ColorTransform;

/// Something the user asked for on a layer row
enum LayerAction {
    Select(usize),
    Visible(usize, bool),
    Opacity(usize, f32),
    Blend(usize, BlendMode),
    Up(usize),
    Down(usize),
}

/// Snapshot of a layer row, taken before drawing so the app can be mutated
struct LayerRow {
    name: String,
    visible: bool,
    opacity: f32,
    blend_mode: BlendMode,
}

pub fn tools_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                tool_section(app, ui);
                ui.separator();
                palette_section(app, ui);
                ui.separator();
                history_section(app, ui);
                ui.separator();
                layer_section(app, ui);
                ui.separator();
                frame_section(app, ui);
                ui.separator();
                image_section(app, ui);
                if let Some(status) = app.status() {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
}

fn tool_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.heading("Tools");
    let active = app.tool().tool;
    ui.horizontal(|ui| {
        for &tool in ToolType::all() {
            if ui.selectable_label(active == tool, tool.name()).clicked() {
                app.set_active_tool(tool);
            }
        }
    });

    let brush = app.tool().brush.clone();
    let mut shape = brush.shape().clone();
    let mut size = brush.size();
    egui::ComboBox::from_id_salt("brush_shape")
        .selected_text(shape.name())
        .show_ui(ui, |ui| {
            for candidate in BrushShape::builtin() {
                let name = candidate.name();
                ui.selectable_value(&mut shape, candidate, name);
            }
        });
    ui.add(egui::Slider::new(&mut size, 1..=MAX_BRUSH_SIZE).text("Size"));
    if shape != *brush.shape() || size != brush.size() {
        app.tool_mut().brush = Brush::new(shape, size);
    }

    ui.horizontal(|ui| {
        ui.label("Color:");
        let mut color = Color32::from(app.tool().color);
        if egui::color_picker::color_edit_button_srgba(
            ui,
            &mut color,
            egui::color_picker::Alpha::BlendOrAdditive,
        )
        .changed()
        {
            app.tool_mut().color = Color::from(color);
        }
    });
}

fn palette_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    let palette = app.canvas().document().palette.clone();
    ui.label(format!("Palette: {}", palette.name));
    let mut picked = None;
    ui.horizontal_wrapped(|ui| {
        for (index, color) in palette.colors().iter().enumerate() {
            let swatch = egui::Button::new("").fill(Color32::from(*color)).min_size(vec2(16.0, 16.0));
            if ui.add(swatch).clicked() {
                picked = Some(index);
            }
        }
    });
    if let Some(color) = picked.and_then(|i| palette.get(i)) {
        app.tool_mut().color = color;
    }
    if ui.button("Add current color").clicked() {
        let color = app.tool().color;
        app.canvas_mut().palette_mut().add(color);
    }
}

fn history_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    let history = app.canvas().history();
    let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
    let (undo_len, redo_len) = (history.undo_len(), history.redo_len());
    ui.horizontal(|ui| {
        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            app.undo();
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            app.redo();
        }
    });
    ui.label(format!("Undo stack: {}  Redo stack: {}", undo_len, redo_len));
}

fn layer_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.heading("Layers");
    let document = app.canvas().document();
    let active = document.active_layer_index();
    let rows: Vec<LayerRow> = document
        .layers()
        .iter()
        .map(|l| LayerRow {
            name: l.name.clone(),
            visible: l.visible,
            opacity: l.opacity,
            blend_mode: l.blend_mode,
        })
        .collect();

    let mut actions = Vec::new();
    // Topmost layer first
    for (index, row) in rows.iter().enumerate().rev() {
        ui.horizontal(|ui| {
            let mut visible = row.visible;
            if ui.checkbox(&mut visible, "").changed() {
                actions.push(LayerAction::Visible(index, visible));
            }
            if ui.selectable_label(index == active, &row.name).clicked() {
                actions.push(LayerAction::Select(index));
            }
            if index + 1 < rows.len() && ui.small_button("⏶").clicked() {
                actions.push(LayerAction::Up(index));
            }
            if index > 0 && ui.small_button("⏷").clicked() {
                actions.push(LayerAction::Down(index));
            }
        });
        if index == active {
            let mut opacity = row.opacity;
            if ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity")).changed() {
                actions.push(LayerAction::Opacity(index, opacity));
            }
            let mut mode = row.blend_mode;
            egui::ComboBox::from_id_salt("blend_mode")
                .selected_text(mode.name())
                .show_ui(ui, |ui| {
                    for &candidate in BlendMode::all() {
                        ui.selectable_value(&mut mode, candidate, candidate.name());
                    }
                });
            if mode != row.blend_mode {
                actions.push(LayerAction::Blend(index, mode));
            }
        }
    }

    ui.horizontal(|ui| {
        if ui.button("Add").clicked() {
            let name = format!("Layer {}", rows.len() + 1);
            let result = app.canvas_mut().add_layer(&name).map(|_| ());
            report(app, result);
        }
        if ui.button("Remove").clicked() {
            let result = app.canvas_mut().remove_layer(active);
            report(app, result);
        }
        if ui.button("Clear").clicked() {
            let result = app.canvas_mut().clear_active().map(|_| ());
            report(app, result);
        }
    });

    for action in actions {
        let canvas = app.canvas_mut();
        let result = match action {
            LayerAction::Select(i) => canvas.set_active_layer(i),
            LayerAction::Visible(i, v) => canvas.set_layer_visible(i, v),
            LayerAction::Opacity(i, o) => canvas.set_layer_opacity(i, o),
            LayerAction::Blend(i, m) => canvas.set_layer_blend_mode(i, m),
            LayerAction::Up(i) => canvas.move_layer(i, i + 1),
            LayerAction::Down(i) => canvas.move_layer(i, i.saturating_sub(1)),
        };
        report(app, result);
    }
}

fn frame_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.heading("Frames");
    let document = app.canvas().document();
    let (active, count) = (document.active_frame_index(), document.frame_count());
    ui.horizontal(|ui| {
        if ui.add_enabled(active > 0, egui::Button::new("◀")).clicked() {
            let result = app.canvas_mut().set_active_frame(active - 1);
            report(app, result);
        }
        ui.label(format!("{} / {}", active + 1, count));
        if ui.add_enabled(active + 1 < count, egui::Button::new("▶")).clicked() {
            let result = app.canvas_mut().set_active_frame(active + 1);
            report(app, result);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("Add").clicked() {
            let result = app.canvas_mut().add_frame().map(|_| ());
            report(app, result);
        }
        if ui.button("Duplicate").clicked() {
            let result = app.canvas_mut().duplicate_frame(active).map(|_| ());
            report(app, result);
        }
        if ui.button("Remove").clicked() {
            let result = app.canvas_mut().remove_frame(active);
            report(app, result);
        }
    });
}

fn image_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.heading("Image");
    ui.menu_button("Adjust", |ui| {
        let transforms = [
            ("Invert", ColorTransform::Invert),
            ("Grayscale", ColorTransform::Grayscale),
            ("Hue +30°", ColorTransform::HueShift(1.0 / 12.0)),
            ("Brighten", ColorTransform::Brightness(0.1)),
            ("Darken", ColorTransform::Brightness(-0.1)),
            ("Desaturate", ColorTransform::Desaturate(0.5)),
        ];
        for (label, transform) in transforms {
            if ui.button(label).clicked() {
                let result = app.canvas_mut().apply_color_transform(transform).map(|_| ());
                report(app, result);
                ui.close_menu();
            }
        }
    });

    // Pending resize, kept in egui memory until applied
    let id = ui.id().with("resize");
    let document = app.canvas().document();
    let current = (document.width(), document.height());
    let (mut width, mut height, mut anchor) = ui
        .data_mut(|d| d.get_temp::<(u32, u32, Anchor)>(id))
        .unwrap_or((current.0, current.1, Anchor::Center));
    ui.horizontal(|ui| {
        ui.add(egui::DragValue::new(&mut width).range(1..=4096));
        ui.label("x");
        ui.add(egui::DragValue::new(&mut height).range(1..=4096));
    });
    egui::ComboBox::from_id_salt("resize_anchor")
        .selected_text(format!("{:?}", anchor))
        .show_ui(ui, |ui| {
            for &candidate in Anchor::all() {
                ui.selectable_value(&mut anchor, candidate, format!("{:?}", candidate));
            }
        });
    ui.data_mut(|d| d.insert_temp(id, (width, height, anchor)));
    if ui
        .add_enabled((width, height) != current, egui::Button::new("Resize"))
        .clicked()
    {
        let result = app.canvas_mut().resize_canvas(width, height, anchor);
        report(app, result);
    }

    ui.horizontal(|ui| {
        if ui.button("New").clicked() {
            app.new_document();
            ui.data_mut(|d| d.remove::<(u32, u32, Anchor)>(id));
        }
        if ui.button("Save").clicked() {
            app.save_project(PathBuf::from("canvas.json"));
        }
        if ui.button("Export PNG").clicked() {
            app.export_frames(PathBuf::from("export"));
        }
    });
    if ui.button("Restore autosave").clicked() {
        app.restore_autosave();
    }
}

fn report(app: &mut PaintApp, result: crate::error::CanvasResult<()>) {
    if let Err(e) = result {
        log::warn!("{}", e);
        app.set_status(e.to_string());
    }
}
