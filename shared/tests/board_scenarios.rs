use doodleboard_shared::{
    Action, BoardConfig, Button, Controller, Element, IncomingFile, Point, PointerDown,
    RecordingCanvas, Session, ShapeKind, Shortcut, StrokeTool, Tool,
};

fn board() -> Controller {
    let mut session = Session::new(BoardConfig::default(), "it");
    session.set_surface_size(800.0, 600.0);
    Controller::new(session)
}

fn press(controller: &mut Controller, x: f64, y: f64) -> Action {
    controller.pointer_down(PointerDown {
        screen: Point::new(x, y),
        button: Button::Primary,
        alt_key: false,
    })
}

fn drag(controller: &mut Controller, points: &[(f64, f64)]) {
    let (first, rest) = points.split_first().expect("drag needs points");
    press(controller, first.0, first.1);
    for (x, y) in rest {
        controller.pointer_move(Point::new(*x, *y));
    }
    controller.pointer_up();
}

#[test]
fn kalem_stroke_commits_then_undoes_and_redoes() {
    let mut board = board();
    let tool: Tool = "kalem".parse().expect("turkish pen alias");
    board.session_mut().set_tool(tool);

    drag(
        &mut board,
        &[
            (10.0, 10.0),
            (15.0, 10.0),
            (20.0, 10.0),
            (30.0, 10.0),
            (40.0, 10.0),
            (45.0, 10.0),
            (50.0, 10.0),
        ],
    );

    let session = board.session();
    assert_eq!(session.scene().elements.len(), 1);
    match &session.scene().elements[0] {
        Element::Stroke(stroke) => {
            assert_eq!(stroke.tool, StrokeTool::Pen);
            assert_eq!(stroke.points.len(), 7);
            assert_eq!(stroke.points.last(), Some(&Point::new(50.0, 10.0)));
        }
        other => panic!("expected a stroke, got {other:?}"),
    }
    assert_eq!(session.history().undo_len(), 1);
    assert_eq!(session.history().redo_len(), 0);

    assert_eq!(board.shortcut(Shortcut::Undo), Action::Repaint);
    let session = board.session();
    assert!(session.scene().elements.is_empty());
    assert_eq!(session.history().undo_len(), 0);
    assert_eq!(session.history().redo_len(), 1);
    let pending = session.history().redo_stack().next().expect("redo entry");
    assert_eq!(pending.elements.len(), 1);

    assert_eq!(board.shortcut(Shortcut::Redo), Action::Repaint);
    let session = board.session();
    assert_eq!(session.scene().elements.len(), 1);
    assert_eq!(session.history().undo_len(), 1);
    assert_eq!(session.history().redo_len(), 0);
}

#[test]
fn clear_all_snapshots_elements_and_notes() {
    let mut board = board();
    drag(&mut board, &[(0.0, 0.0), (10.0, 10.0)]);
    drag(&mut board, &[(20.0, 0.0), (30.0, 10.0)]);
    board
        .session_mut()
        .set_tool(Tool::Shape(ShapeKind::Rectangle));
    drag(&mut board, &[(100.0, 100.0), (150.0, 140.0)]);

    board.session_mut().set_tool(Tool::StickyNote);
    press(&mut board, 300.0, 300.0);
    board.pointer_up();
    press(&mut board, 500.0, 100.0);
    board.pointer_up();

    assert_eq!(board.session().scene().elements.len(), 3);
    assert_eq!(board.session().scene().notes.len(), 2);
    let undo_before = board.session().history().undo_len();

    board.shortcut(Shortcut::ClearAll);

    let session = board.session();
    assert!(session.scene().elements.is_empty());
    assert!(session.scene().notes.is_empty());
    assert_eq!(session.history().undo_len(), undo_before + 1);
    let snapshot = session.history().undo_stack().last().expect("snapshot");
    assert_eq!(snapshot.elements.len(), 3);
    assert_eq!(snapshot.notes.len(), 2);
    assert!(session.selection().is_none());
}

#[test]
fn repaint_is_idempotent() {
    let mut board = board();
    drag(&mut board, &[(0.0, 0.0), (40.0, 20.0), (80.0, 0.0)]);
    board.session_mut().set_tool(Tool::Shape(ShapeKind::Heart));
    drag(&mut board, &[(100.0, 100.0), (160.0, 150.0)]);
    board.session_mut().set_tool(Tool::StickyNote);
    press(&mut board, 200.0, 200.0);
    board
        .session_mut()
        .add_media(IncomingFile {
            name: "pic.png".into(),
            mime: "image/png".into(),
            data: "data:image/png;base64,AAAA".into(),
        })
        .expect("png accepted");

    let mut first = RecordingCanvas::new(800.0, 600.0);
    let mut second = RecordingCanvas::new(800.0, 600.0);
    let report = board.perform(&mut first, Action::Repaint);
    assert_eq!(report.decode_requests.len(), 1);
    let report = board.perform(&mut second, Action::Repaint);
    assert!(report.decode_requests.is_empty());
    assert_eq!(first.commands, second.commands);
}

#[test]
fn media_ready_draws_the_bitmap_on_the_next_repaint() {
    let mut board = board();
    let id = board
        .session_mut()
        .add_media(IncomingFile {
            name: "pic.png".into(),
            mime: "image/png".into(),
            data: "data:image/png;base64,AAAA".into(),
        })
        .expect("png accepted");

    let mut canvas = RecordingCanvas::new(800.0, 600.0);
    board.perform(&mut canvas, Action::Repaint);
    let draws = |canvas: &RecordingCanvas| {
        canvas.count(|command| matches!(command, doodleboard_shared::DrawCommand::DrawImage(..)))
    };
    assert_eq!(draws(&canvas), 0);

    assert!(board.session_mut().media_ready(&id));
    assert!(!board.session_mut().media_ready(&id));
    canvas.take();
    board.perform(&mut canvas, Action::Repaint);
    assert_eq!(draws(&canvas), 1);
}

#[test]
fn new_commit_after_undo_invalidates_redo() {
    let mut board = board();
    drag(&mut board, &[(0.0, 0.0), (10.0, 0.0)]);
    drag(&mut board, &[(0.0, 10.0), (10.0, 10.0)]);
    board.shortcut(Shortcut::Undo);
    assert!(board.session().history().can_redo());

    drag(&mut board, &[(0.0, 20.0), (10.0, 20.0)]);
    assert!(!board.session().history().can_redo());
    assert_eq!(board.shortcut(Shortcut::Redo), Action::None);
    assert_eq!(board.session().scene().elements.len(), 2);
}

#[test]
fn undo_n_times_restores_the_empty_board() {
    let mut board = board();
    for row in 0..5 {
        let y = row as f64 * 10.0;
        drag(&mut board, &[(0.0, y), (25.0, y)]);
    }
    let full = board.session().scene().clone();
    for _ in 0..5 {
        board.shortcut(Shortcut::Undo);
    }
    assert!(board.session().scene().is_empty());
    for _ in 0..5 {
        board.shortcut(Shortcut::Redo);
    }
    assert_eq!(board.session().scene(), &full);
}

#[test]
fn tap_with_stroke_tool_commits_nothing_but_tap_with_shape_does() {
    let mut board = board();
    press(&mut board, 30.0, 30.0);
    assert_eq!(board.pointer_up(), Action::Repaint);
    assert!(board.session().scene().elements.is_empty());
    assert!(!board.session().history().can_undo());

    board.session_mut().set_tool(Tool::Shape(ShapeKind::Line));
    press(&mut board, 30.0, 30.0);
    board.pointer_up();
    assert_eq!(board.session().scene().elements.len(), 1);
    assert_eq!(board.session().history().undo_len(), 1);
}

#[test]
fn wheel_zoom_keeps_the_anchor_in_place() {
    let mut board = board();
    board.session_mut().viewport_mut().pan = Point::new(-37.0, 12.5);
    let anchors = [(0.0, 0.0), (123.0, 456.0), (799.0, 1.0)];
    for (x, y) in anchors {
        for delta in [-120.0, 120.0, -3.0] {
            let anchor = Point::new(x, y);
            let world = board.session().viewport().screen_to_world(anchor);
            board.wheel(anchor, delta);
            let back = board.session().viewport().world_to_screen(world);
            assert!((back.x - anchor.x).abs() < 1e-9, "x drift at {anchor:?}");
            assert!((back.y - anchor.y).abs() < 1e-9, "y drift at {anchor:?}");
        }
    }
}

#[test]
fn eraser_strokes_render_with_destination_out() {
    let mut board = board();
    board.session_mut().set_tool("silgi".parse().expect("eraser alias"));
    drag(&mut board, &[(0.0, 0.0), (10.0, 10.0)]);
    let mut canvas = RecordingCanvas::new(800.0, 600.0);
    board.perform(&mut canvas, Action::Repaint);
    assert!(canvas.commands.contains(&doodleboard_shared::DrawCommand::Composite(
        doodleboard_shared::CompositeMode::DestinationOut
    )));
}
