use std::f64::consts::PI;

use crate::canvas::Canvas;
use crate::model::{Point, Shape, ShapeKind};

pub const ARROW_HEAD_LENGTH: f64 = 20.0;
pub const ARROW_HEAD_ANGLE: f64 = PI / 6.0;
pub const STAR_SPIKES: usize = 5;
pub const STAR_INNER_RATIO: f64 = 0.4;
pub const PREVIEW_ALPHA: f64 = 0.7;

/// Box spanned by a drag. Width and height keep their sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragBox {
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub height: f64,
    pub center: Point,
}

impl DragBox {
    pub fn new(start: Point, end: Point) -> Self {
        let width = end.x - start.x;
        let height = end.y - start.y;
        Self {
            start,
            end,
            width,
            height,
            center: Point::new(start.x + width / 2.0, start.y + height / 2.0),
        }
    }

    /// Half the diagonal, so the circle depends on drag direction as well as
    /// magnitude.
    pub fn circle_radius(&self) -> f64 {
        self.width.hypot(self.height) / 2.0
    }

    pub fn star_vertices(&self) -> Vec<Point> {
        let outer = self.width.abs().min(self.height.abs()) / 2.0;
        let inner = outer * STAR_INNER_RATIO;
        (0..STAR_SPIKES * 2)
            .map(|index| {
                let radius = if index % 2 == 0 { outer } else { inner };
                let angle = index as f64 * PI / STAR_SPIKES as f64 - PI / 2.0;
                Point::new(
                    self.center.x + angle.cos() * radius,
                    self.center.y + angle.sin() * radius,
                )
            })
            .collect()
    }

    pub fn arrow_barbs(&self) -> [Point; 2] {
        let angle = self.height.atan2(self.width);
        let barb = |offset: f64| {
            Point::new(
                self.end.x - ARROW_HEAD_LENGTH * (angle + offset).cos(),
                self.end.y - ARROW_HEAD_LENGTH * (angle + offset).sin(),
            )
        };
        [barb(-ARROW_HEAD_ANGLE), barb(ARROW_HEAD_ANGLE)]
    }
}

/// Rasterizes one shape outline. Shapes missing an endpoint draw nothing.
pub fn paint<C: Canvas>(canvas: &mut C, shape: &Shape, is_preview: bool) {
    let Some((start, end)) = shape.endpoints() else {
        return;
    };
    let drag = DragBox::new(start, end);

    canvas.save();
    canvas.set_global_alpha(if is_preview {
        shape.opacity * PREVIEW_ALPHA
    } else {
        shape.opacity
    });
    canvas.set_stroke_style(&shape.color);
    canvas.set_line_width(shape.width);
    canvas.set_round_lines();

    match shape.kind {
        ShapeKind::Rectangle => {
            canvas.stroke_rect(start.x, start.y, drag.width, drag.height);
        }
        ShapeKind::Circle => {
            canvas.begin_path();
            canvas.arc(drag.center.x, drag.center.y, drag.circle_radius(), 0.0, 2.0 * PI);
            canvas.stroke();
        }
        ShapeKind::Ellipse => {
            canvas.begin_path();
            canvas.ellipse(
                drag.center.x,
                drag.center.y,
                drag.width.abs() / 2.0,
                drag.height.abs() / 2.0,
            );
            canvas.stroke();
        }
        ShapeKind::Line => {
            canvas.begin_path();
            canvas.move_to(start.x, start.y);
            canvas.line_to(end.x, end.y);
            canvas.stroke();
        }
        ShapeKind::Arrow => {
            canvas.begin_path();
            canvas.move_to(start.x, start.y);
            canvas.line_to(end.x, end.y);
            canvas.stroke();

            canvas.begin_path();
            for barb in drag.arrow_barbs() {
                canvas.move_to(end.x, end.y);
                canvas.line_to(barb.x, barb.y);
            }
            canvas.stroke();
        }
        ShapeKind::Triangle => {
            canvas.begin_path();
            canvas.move_to(drag.center.x, start.y);
            canvas.line_to(start.x, end.y);
            canvas.line_to(end.x, end.y);
            canvas.close_path();
            canvas.stroke();
        }
        ShapeKind::Star => {
            canvas.begin_path();
            for (index, vertex) in drag.star_vertices().into_iter().enumerate() {
                if index == 0 {
                    canvas.move_to(vertex.x, vertex.y);
                } else {
                    canvas.line_to(vertex.x, vertex.y);
                }
            }
            canvas.close_path();
            canvas.stroke();
        }
        ShapeKind::Heart => {
            let w = drag.width.abs();
            let h = drag.height.abs();
            let c = drag.center;
            canvas.begin_path();
            canvas.move_to(c.x, c.y + h * 0.3);
            canvas.bezier_curve_to(
                c.x - w * 0.3,
                c.y - h * 0.1,
                c.x - w * 0.5,
                c.y - h * 0.4,
                c.x,
                c.y - h * 0.2,
            );
            canvas.bezier_curve_to(
                c.x + w * 0.5,
                c.y - h * 0.4,
                c.x + w * 0.3,
                c.y - h * 0.1,
                c.x,
                c.y + h * 0.3,
            );
            canvas.stroke();
        }
    }

    canvas.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, RecordingCanvas};

    fn shape(kind: ShapeKind, start: (f64, f64), end: (f64, f64)) -> Shape {
        Shape {
            kind,
            start: Some(Point::new(start.0, start.1)),
            end: Some(Point::new(end.0, end.1)),
            color: "#ff0000".into(),
            width: 4.0,
            opacity: 0.8,
        }
    }

    #[test]
    fn circle_radius_is_half_the_diagonal() {
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        paint(&mut canvas, &shape(ShapeKind::Circle, (0.0, 0.0), (6.0, 8.0)), false);
        assert!(canvas
            .commands
            .contains(&DrawCommand::Arc(3.0, 4.0, 5.0, 0.0, 2.0 * PI)));
    }

    #[test]
    fn preview_dims_alpha() {
        let rect = shape(ShapeKind::Rectangle, (10.0, 10.0), (0.0, 30.0));
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        paint(&mut canvas, &rect, true);
        assert!(canvas.commands.contains(&DrawCommand::GlobalAlpha(0.8 * 0.7)));
        assert!(canvas
            .commands
            .contains(&DrawCommand::StrokeRect(10.0, 10.0, -10.0, 20.0)));

        canvas.take();
        paint(&mut canvas, &rect, false);
        assert!(canvas.commands.contains(&DrawCommand::GlobalAlpha(0.8)));
    }

    #[test]
    fn missing_endpoint_draws_nothing() {
        let mut broken = shape(ShapeKind::Heart, (0.0, 0.0), (10.0, 10.0));
        broken.end = None;
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        paint(&mut canvas, &broken, false);
        assert!(canvas.commands.is_empty());
    }

    #[test]
    fn painting_is_deterministic() {
        for kind in ShapeKind::ALL {
            let shape = shape(kind, (5.0, 40.0), (90.0, -12.0));
            let mut first = RecordingCanvas::new(100.0, 100.0);
            let mut second = RecordingCanvas::new(100.0, 100.0);
            paint(&mut first, &shape, false);
            paint(&mut second, &shape, false);
            assert_eq!(first.commands, second.commands);
            assert_eq!(first.commands.first(), Some(&DrawCommand::Save));
            assert_eq!(first.commands.last(), Some(&DrawCommand::Restore));
        }
    }

    #[test]
    fn star_starts_point_up_with_inner_ratio() {
        let drag = DragBox::new(Point::new(0.0, 0.0), Point::new(100.0, 60.0));
        let vertices = drag.star_vertices();
        assert_eq!(vertices.len(), 10);
        assert!((vertices[0].x - 50.0).abs() < 1e-9);
        assert!((vertices[0].y - 0.0).abs() < 1e-9);
        let inner = vertices[1];
        let distance = (inner.x - 50.0).hypot(inner.y - 30.0);
        assert!((distance - 12.0).abs() < 1e-9);
    }

    #[test]
    fn arrow_barbs_sit_behind_the_tip() {
        let drag = DragBox::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let [left, right] = drag.arrow_barbs();
        let expected_x = 100.0 - ARROW_HEAD_LENGTH * ARROW_HEAD_ANGLE.cos();
        assert!((left.x - expected_x).abs() < 1e-9);
        assert!((right.x - expected_x).abs() < 1e-9);
        assert!((left.y + right.y).abs() < 1e-9);
        assert!((left.y - 10.0).abs() < 1e-9);
    }
}
