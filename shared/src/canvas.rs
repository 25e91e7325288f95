//! The paint context the renderer draws through.
//!
//! The browser client implements [`Canvas`] on top of a 2D rendering context;
//! [`RecordingCanvas`] captures the command stream instead, which is how the
//! renderer is exercised outside a browser.

use crate::model::ElementId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    SourceOver,
    /// Punches through already drawn pixels.
    DestinationOut,
    Multiply,
}

impl CompositeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositeMode::SourceOver => "source-over",
            CompositeMode::DestinationOut => "destination-out",
            CompositeMode::Multiply => "multiply",
        }
    }
}

pub trait Canvas {
    /// Drawing surface size in CSS pixels.
    fn size(&self) -> (f64, f64);

    fn save(&mut self);
    fn restore(&mut self);
    fn scale(&mut self, x: f64, y: f64);
    fn translate(&mut self, x: f64, y: f64);

    fn set_global_alpha(&mut self, alpha: f64);
    fn set_composite(&mut self, mode: CompositeMode);
    fn set_stroke_style(&mut self, color: &str);
    fn set_fill_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    /// Round caps and joins.
    fn set_round_lines(&mut self);
    fn set_line_dash(&mut self, segments: &[f64]);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64);
    fn close_path(&mut self);
    fn stroke(&mut self);

    fn set_font(&mut self, font: &str);
    /// Left-aligned, top-baseline text.
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn measure_text(&mut self, text: &str) -> f64;

    /// Draws a decoded media bitmap. Bitmaps that are not available are
    /// skipped by the implementation.
    fn draw_image(&mut self, id: &ElementId, x: f64, y: f64, width: f64, height: f64);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Scale(f64, f64),
    Translate(f64, f64),
    GlobalAlpha(f64),
    Composite(CompositeMode),
    StrokeStyle(String),
    FillStyle(String),
    LineWidth(f64),
    RoundLines,
    LineDash(Vec<f64>),
    ClearRect(f64, f64, f64, f64),
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadraticCurveTo(f64, f64, f64, f64),
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    Arc(f64, f64, f64, f64, f64),
    Ellipse(f64, f64, f64, f64),
    ClosePath,
    Stroke,
    Font(String),
    FillText(String, f64, f64),
    DrawImage(ElementId, f64, f64, f64, f64),
}

/// Records every call in order. Text is measured with a fixed advance per
/// character.
#[derive(Clone, Debug)]
pub struct RecordingCanvas {
    pub width: f64,
    pub height: f64,
    pub char_width: f64,
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            char_width: 7.0,
            commands: Vec::new(),
        }
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, matcher: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|command| matcher(command)).count()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Scale(x, y));
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Translate(x, y));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.push(DrawCommand::Composite(mode));
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.push(DrawCommand::StrokeStyle(color.to_string()));
    }

    fn set_fill_style(&mut self, color: &str) {
        self.push(DrawCommand::FillStyle(color.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn set_round_lines(&mut self) {
        self.push(DrawCommand::RoundLines);
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.push(DrawCommand::LineDash(segments.to_vec()));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::ClearRect(x, y, width, height));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::FillRect(x, y, width, height));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::StrokeRect(x, y, width, height));
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo(x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.push(DrawCommand::QuadraticCurveTo(cpx, cpy, x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.push(DrawCommand::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.push(DrawCommand::Arc(x, y, radius, start, end));
    }

    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64) {
        self.push(DrawCommand::Ellipse(x, y, radius_x, radius_y));
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawCommand::Font(font.to_string()));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::FillText(text.to_string(), x, y));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }

    fn draw_image(&mut self, id: &ElementId, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::DrawImage(id.clone(), x, y, width, height));
    }
}
