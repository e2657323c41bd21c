use pixel_canvas::command::CommandHistory;
use pixel_canvas::transform::ColorTransform;
use pixel_canvas::{
    Brush, Canvas, Color, Document, GestureEvent, HistoryStatus, PixelBuffer, PixelPos, ToolContext,
    ToolType,
};

fn stroke(canvas: &mut Canvas, from: (i32, i32), to: (i32, i32), color: Color) {
    let ctx = ToolContext::new(ToolType::Brush, Brush::default(), color);
    canvas.apply_gesture_event(&GestureEvent::press(from.into(), ctx.clone()));
    canvas.apply_gesture_event(&GestureEvent::motion(to.into(), ctx.clone()));
    canvas.apply_gesture_event(&GestureEvent::release(to.into(), ctx));
}

fn active(canvas: &Canvas) -> PixelBuffer {
    canvas.document().active_frame().unwrap().buffer.clone()
}

#[test]
fn test_undo_restores_bit_for_bit_and_redo_reapplies() {
    let mut canvas = Canvas::new(Document::new(16, 16, 1).unwrap());
    stroke(&mut canvas, (0, 0), (15, 15), Color::new(0.2, 0.4, 0.6, 0.7));
    let before = active(&canvas);

    stroke(&mut canvas, (15, 0), (0, 15), Color::new(0.9, 0.1, 0.3, 0.35));
    let after = active(&canvas);
    assert_ne!(before, after);

    assert!(matches!(canvas.undo(), HistoryStatus::Applied(_)));
    assert_eq!(active(&canvas), before);
    assert!(matches!(canvas.redo(), HistoryStatus::Applied(_)));
    assert_eq!(active(&canvas), after);
}

#[test]
fn test_new_edit_after_undo_clears_redo() {
    let mut canvas = Canvas::new(Document::new(8, 8, 1).unwrap());
    stroke(&mut canvas, (0, 0), (7, 0), Color::RED);
    stroke(&mut canvas, (0, 1), (7, 1), Color::BLUE);
    canvas.undo();
    assert!(canvas.history().can_redo());

    stroke(&mut canvas, (0, 2), (7, 2), Color::GREEN);
    assert!(!canvas.history().can_redo());
    assert_eq!(canvas.redo(), HistoryStatus::Empty);
    assert_eq!(canvas.history().undo_len(), 2);
}

#[test]
fn test_empty_stacks_report_empty() {
    let mut canvas = Canvas::new(Document::new(2, 2, 1).unwrap());
    assert_eq!(canvas.undo(), HistoryStatus::Empty);
    assert_eq!(canvas.redo(), HistoryStatus::Empty);
}

#[test]
fn test_undo_walks_back_through_every_edit() {
    let mut canvas = Canvas::new(Document::new(8, 8, 1).unwrap());
    let blank = active(&canvas);
    stroke(&mut canvas, (0, 0), (3, 3), Color::RED);
    stroke(&mut canvas, (4, 4), (7, 7), Color::BLUE);
    canvas.apply_color_transform(ColorTransform::Invert).unwrap();
    assert_eq!(canvas.history().undo_len(), 3);

    while let HistoryStatus::Applied(_) = canvas.undo() {}
    assert_eq!(active(&canvas), blank);
    assert_eq!(canvas.history().redo_len(), 3);
}

#[test]
fn test_undo_follows_layer_frame_not_active_layer() {
    let mut canvas = Canvas::new(Document::new(4, 4, 1).unwrap());
    stroke(&mut canvas, (0, 0), (3, 0), Color::RED);
    canvas.add_layer("Top").unwrap();
    assert_eq!(canvas.document().active_layer_index(), 1);

    let target = canvas.document().frame_at(0, 0).unwrap().id;
    assert_eq!(canvas.undo(), HistoryStatus::Applied(target));
    let bottom = &canvas.document().frame_at(0, 0).unwrap().buffer;
    assert_eq!(bottom.get(0, 0).unwrap(), Color::TRANSPARENT);
}

#[test]
fn test_entries_for_removed_layers_are_skipped() {
    let mut canvas = Canvas::new(Document::new(4, 4, 1).unwrap());
    stroke(&mut canvas, (0, 0), (3, 0), Color::RED);
    canvas.add_layer("Scratch").unwrap();
    stroke(&mut canvas, (0, 1), (3, 1), Color::BLUE);
    canvas.remove_layer(1).unwrap();

    let bottom = canvas.document().frame_at(0, 0).unwrap().id;
    assert_eq!(canvas.undo(), HistoryStatus::Applied(bottom));
    assert_eq!(canvas.undo(), HistoryStatus::Empty);
}

#[test]
fn test_history_limit_keeps_newest() {
    let document = Document::new(4, 1, 1).unwrap();
    let mut canvas = Canvas::with_history(document, CommandHistory::with_limit(2));
    for x in 0..4 {
        stroke(&mut canvas, (x, 0), (x, 0), Color::RED);
    }
    assert_eq!(canvas.history().undo_len(), 2);
    canvas.undo();
    canvas.undo();
    let buffer = active(&canvas);
    assert_eq!(buffer.get(1, 0).unwrap(), Color::RED);
    assert_eq!(buffer.get(2, 0).unwrap(), Color::TRANSPARENT);
}

#[test]
fn test_noop_gesture_records_nothing() {
    let mut canvas = Canvas::new(Document::new(4, 4, 1).unwrap());
    stroke(&mut canvas, (0, 0), (0, 0), Color::TRANSPARENT);
    assert!(!canvas.history().can_undo());
    let ignored = PixelPos::new(0, 0);
    assert_eq!(canvas.pick_color(ignored), Some(Color::TRANSPARENT));
}

#[test]
fn test_noop_gesture_still_invalidates_redo() {
    let mut canvas = Canvas::new(Document::new(8, 8, 1).unwrap());
    stroke(&mut canvas, (0, 0), (7, 0), Color::RED);
    stroke(&mut canvas, (0, 1), (7, 1), Color::BLUE);
    assert!(matches!(canvas.undo(), HistoryStatus::Applied(_)));
    assert!(canvas.history().can_redo());

    stroke(&mut canvas, (5, 5), (5, 5), Color::TRANSPARENT);
    assert_eq!(canvas.history().undo_len(), 1);
    assert_eq!(canvas.redo(), HistoryStatus::Empty);
}
