use tracing::trace;

use crate::canvas::{Canvas, CompositeMode};
use crate::config::BoardConfig;
use crate::media::{DecodeRequest, DecodeState, MediaStore};
use crate::model::{
    Element, ElementId, MediaElement, Point, Scene, Shape, StickyNote, Stroke, StrokeTool,
};
use crate::shapes;
use crate::viewport::Viewport;

pub const SELECTION_COLOR: &str = "#3b82f6";
pub const SELECTION_DASH: [f64; 2] = [5.0, 5.0];
pub const NOTE_ALPHA: f64 = 0.9;
pub const NOTE_BORDER: &str = "#00000020";
pub const NOTE_TEXT_COLOR: &str = "#000000";
pub const NOTE_PADDING: f64 = 5.0;
pub const NOTE_LINE_HEIGHT: f64 = 1.2;
pub const MARKER_ALPHA: f64 = 0.3;
pub const GRID_COLOR: &str = "#f0f0f0";
pub const GRID_LINE_WIDTH: f64 = 0.5;
pub const GRID_ALPHA: f64 = 0.3;

/// Everything a full repaint reads.
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub preview: Option<&'a Shape>,
    pub viewport: &'a Viewport,
    pub selection: Option<&'a ElementId>,
    pub config: &'a BoardConfig,
    pub show_grid: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct RepaintReport {
    /// Media met for the first time; the host decodes these and reports back.
    pub decode_requests: Vec<DecodeRequest>,
}

/// Style of the stroke being drawn, used by both the full repaint and the
/// live segment path.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub tool: StrokeTool,
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl From<&Stroke> for StrokeStyle {
    fn from(stroke: &Stroke) -> Self {
        Self {
            tool: stroke.tool,
            color: stroke.color.clone(),
            width: stroke.width,
            opacity: stroke.opacity,
        }
    }
}

/// Clears the surface and redraws the whole board: grid, elements in list
/// order, notes in list order, then the shape being dragged.
pub fn full_repaint<C: Canvas>(
    canvas: &mut C,
    frame: &Frame<'_>,
    media: &mut MediaStore,
) -> RepaintReport {
    let (width, height) = canvas.size();
    let mut report = RepaintReport::default();

    canvas.clear_rect(0.0, 0.0, width, height);
    canvas.save();
    canvas.set_global_alpha(1.0);
    canvas.set_composite(CompositeMode::SourceOver);
    canvas.set_fill_style(&frame.config.background);
    canvas.fill_rect(0.0, 0.0, width, height);
    canvas.restore();

    canvas.save();
    frame.viewport.apply(canvas);

    if frame.show_grid {
        draw_grid(canvas, frame.viewport, frame.config.grid_size, width, height);
    }

    for element in &frame.scene.elements {
        match element {
            Element::Stroke(stroke) => draw_stroke(canvas, stroke),
            Element::Shape(shape) => shapes::paint(canvas, shape, false),
            Element::Media(item) => {
                let selected = frame.selection == Some(&item.id);
                if let Some(request) = draw_media(canvas, item, selected, media) {
                    report.decode_requests.push(request);
                }
            }
        }
    }

    for note in &frame.scene.notes {
        draw_note(canvas, note, frame.selection == Some(&note.id));
    }

    if let Some(shape) = frame.preview {
        shapes::paint(canvas, shape, true);
    }

    canvas.restore();
    trace!(
        elements = frame.scene.elements.len(),
        notes = frame.scene.notes.len(),
        decodes = report.decode_requests.len(),
        "full repaint"
    );
    report
}

/// Draws only the newest segment of the stroke in progress, under the same
/// transform and compositing as the committed stroke will get.
pub fn live_preview_segment<C: Canvas>(
    canvas: &mut C,
    viewport: &Viewport,
    style: &StrokeStyle,
    from: Point,
    to: Point,
) {
    canvas.save();
    viewport.apply(canvas);
    apply_stroke_style(canvas, style);
    canvas.begin_path();
    canvas.move_to(from.x, from.y);
    canvas.line_to(to.x, to.y);
    canvas.stroke();
    canvas.restore();
}

fn apply_stroke_style<C: Canvas>(canvas: &mut C, style: &StrokeStyle) {
    let (composite, alpha) = match style.tool {
        StrokeTool::Eraser => (CompositeMode::DestinationOut, style.opacity),
        StrokeTool::Marker => (CompositeMode::Multiply, style.opacity * MARKER_ALPHA),
        StrokeTool::Pen | StrokeTool::Pencil => (CompositeMode::SourceOver, style.opacity),
    };
    canvas.set_global_alpha(alpha);
    canvas.set_composite(composite);
    canvas.set_stroke_style(&style.color);
    canvas.set_line_width(style.width);
    canvas.set_round_lines();
}

pub fn draw_stroke<C: Canvas>(canvas: &mut C, stroke: &Stroke) {
    let [first, .., last] = stroke.points.as_slice() else {
        return;
    };
    canvas.save();
    apply_stroke_style(canvas, &StrokeStyle::from(stroke));
    canvas.begin_path();
    canvas.move_to(first.x, first.y);
    if stroke.tool.is_smoothed() {
        for pair in stroke.points[1..].windows(2) {
            let mid = pair[0].midpoint(pair[1]);
            canvas.quadratic_curve_to(pair[0].x, pair[0].y, mid.x, mid.y);
        }
        // Ends on the last sample; midpoints alone never reach it.
        canvas.line_to(last.x, last.y);
    } else {
        for point in &stroke.points[1..] {
            canvas.line_to(point.x, point.y);
        }
    }
    canvas.stroke();
    canvas.restore();
}

/// Returns a decode request when the media has not been seen before.
fn draw_media<C: Canvas>(
    canvas: &mut C,
    item: &MediaElement,
    selected: bool,
    media: &mut MediaStore,
) -> Option<DecodeRequest> {
    let mut request = None;
    match media.state(&item.id) {
        Some(DecodeState::Ready) => {
            canvas.save();
            canvas.set_global_alpha(1.0);
            canvas.set_composite(CompositeMode::SourceOver);
            canvas.draw_image(&item.id, item.x, item.y, item.width, item.height);
            canvas.restore();
        }
        Some(DecodeState::Requested) | Some(DecodeState::Failed) => {}
        None => {
            media.request(&item.id);
            request = Some(DecodeRequest {
                id: item.id.clone(),
                data: item.data.clone(),
            });
        }
    }
    if selected {
        draw_selection_border(canvas, item.x, item.y, item.width, item.height);
    }
    request
}

fn draw_selection_border<C: Canvas>(canvas: &mut C, x: f64, y: f64, width: f64, height: f64) {
    canvas.save();
    canvas.set_stroke_style(SELECTION_COLOR);
    canvas.set_line_width(2.0);
    canvas.set_line_dash(&SELECTION_DASH);
    canvas.stroke_rect(x, y, width, height);
    canvas.set_line_dash(&[]);
    canvas.restore();
}

pub fn draw_note<C: Canvas>(canvas: &mut C, note: &StickyNote, selected: bool) {
    canvas.save();
    canvas.set_global_alpha(NOTE_ALPHA);
    canvas.set_composite(CompositeMode::SourceOver);

    canvas.set_fill_style(&note.color);
    canvas.fill_rect(note.x, note.y, note.width, note.height);

    canvas.set_stroke_style(NOTE_BORDER);
    canvas.set_line_width(1.0);
    canvas.stroke_rect(note.x, note.y, note.width, note.height);

    canvas.set_fill_style(NOTE_TEXT_COLOR);
    canvas.set_font(&format!("{}px Arial", note.font_size));
    let lines = wrap_text(canvas, &note.text, note.width - NOTE_PADDING * 2.0);
    for (index, line) in lines.iter().enumerate() {
        canvas.fill_text(
            line,
            note.x + NOTE_PADDING,
            note.y + NOTE_PADDING + index as f64 * note.font_size * NOTE_LINE_HEIGHT,
        );
    }

    if selected {
        draw_selection_border(canvas, note.x, note.y, note.width, note.height);
    }
    canvas.restore();
}

/// Greedy word wrap. A single word wider than `max_width` stays on its own
/// line.
pub fn wrap_text<C: Canvas>(canvas: &mut C, text: &str, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let candidate = format!("{current}{word} ");
        if !current.is_empty() && canvas.measure_text(&candidate) > max_width {
            lines.push(current.trim().to_string());
            current = format!("{word} ");
        } else {
            current = candidate;
        }
    }
    lines.push(current.trim().to_string());
    lines
}

fn draw_grid<C: Canvas>(canvas: &mut C, viewport: &Viewport, size: f64, width: f64, height: f64) {
    let visible = viewport.visible_world(width, height);
    canvas.save();
    canvas.set_stroke_style(GRID_COLOR);
    canvas.set_line_width(GRID_LINE_WIDTH);
    canvas.set_global_alpha(GRID_ALPHA);
    canvas.set_composite(CompositeMode::SourceOver);

    let mut x = (visible.min_x / size).floor() * size;
    while x <= visible.max_x {
        canvas.begin_path();
        canvas.move_to(x, visible.min_y);
        canvas.line_to(x, visible.max_y);
        canvas.stroke();
        x += size;
    }
    let mut y = (visible.min_y / size).floor() * size;
    while y <= visible.max_y {
        canvas.begin_path();
        canvas.move_to(visible.min_x, y);
        canvas.line_to(visible.max_x, y);
        canvas.stroke();
        y += size;
    }
    canvas.restore();
}
