use crate::canvas::Canvas;
use crate::config::Range;
use crate::model::{Bounds, Point};

/// Zoom and pan of the board.
///
/// `pan` is kept in world units (already divided by `zoom`), so the screen
/// position of a world point is `(world + pan) * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::new(0.0, 0.0),
        }
    }
}

impl Viewport {
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan.x * self.zoom) / self.zoom,
            y: (screen.y - self.pan.y * self.zoom) / self.zoom,
        }
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: (world.x + self.pan.x) * self.zoom,
            y: (world.y + self.pan.y) * self.zoom,
        }
    }

    /// Scale is applied outermost, then the pan translation.
    pub fn apply<C: Canvas>(&self, canvas: &mut C) {
        canvas.scale(self.zoom, self.zoom);
        canvas.translate(self.pan.x, self.pan.y);
    }

    /// Changes the zoom while keeping the world point under `anchor` fixed
    /// on screen.
    pub fn zoom_around(&mut self, anchor: Point, zoom: f64, limits: Range) {
        let world = self.screen_to_world(anchor);
        let zoom = limits.clamp(zoom, self.zoom);
        self.zoom = zoom;
        self.pan = Point {
            x: (anchor.x - world.x * zoom) / zoom,
            y: (anchor.y - world.y * zoom) / zoom,
        };
    }

    pub fn pan_by_screen(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx / self.zoom;
        self.pan.y += dy / self.zoom;
    }

    pub fn reset(&mut self) {
        *self = Viewport::default();
    }

    /// World area currently visible on a surface of `width` x `height`.
    pub fn visible_world(&self, width: f64, height: f64) -> Bounds {
        let top_left = self.screen_to_world(Point::new(0.0, 0.0));
        let bottom_right = self.screen_to_world(Point::new(width, height));
        Bounds {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: bottom_right.x,
            max_y: bottom_right.y,
        }
    }

    /// Frames `content` (grown by `padding` on every side) in the surface,
    /// never magnifying beyond `max_zoom`.
    pub fn fit(
        &mut self,
        content: Bounds,
        width: f64,
        height: f64,
        padding: f64,
        max_zoom: f64,
        limits: Range,
    ) {
        let content_width = content.width() + padding * 2.0;
        let content_height = content.height() + padding * 2.0;
        let zoom = (width / content_width)
            .min(height / content_height)
            .min(max_zoom);
        let zoom = limits.clamp(zoom, self.zoom);
        let center = content.center();
        self.zoom = zoom;
        self.pan = Point {
            x: width / zoom / 2.0 - center.x,
            y: height / zoom / 2.0 - center.y,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Range = Range::new(0.1, 5.0);

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn screen_and_world_are_inverse() {
        let viewport = Viewport {
            zoom: 2.5,
            pan: Point::new(-40.0, 12.5),
        };
        let screen = Point::new(321.0, 87.0);
        let world = viewport.screen_to_world(screen);
        assert!(close(viewport.world_to_screen(world), screen));
        assert!(close(world, Point::new(321.0 / 2.5 + 40.0, 87.0 / 2.5 - 12.5)));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport {
            zoom: 1.3,
            pan: Point::new(25.0, -70.0),
        };
        let anchor = Point::new(410.0, 233.0);
        for factor in [1.1, 1.1, 0.9, 3.0, 0.05, 1.1] {
            let before = viewport.screen_to_world(anchor);
            let zoom = viewport.zoom * factor;
            viewport.zoom_around(anchor, zoom, LIMITS);
            assert!(close(viewport.world_to_screen(before), anchor));
            assert!(viewport.zoom >= 0.1 && viewport.zoom <= 5.0);
        }
    }

    #[test]
    fn pan_moves_by_screen_delta_over_zoom() {
        let mut viewport = Viewport {
            zoom: 2.0,
            pan: Point::new(0.0, 0.0),
        };
        viewport.pan_by_screen(10.0, -4.0);
        assert_eq!(viewport.pan, Point::new(5.0, -2.0));
    }

    #[test]
    fn fit_centers_content_and_caps_zoom() {
        let mut viewport = Viewport::default();
        let tiny = Bounds::from_rect(10.0, 10.0, 4.0, 4.0);
        viewport.fit(tiny, 800.0, 600.0, 50.0, 2.0, LIMITS);
        assert_eq!(viewport.zoom, 2.0);
        assert!(close(
            viewport.world_to_screen(tiny.center()),
            Point::new(400.0, 300.0)
        ));

        let wide = Bounds::from_rect(0.0, 0.0, 1500.0, 100.0);
        viewport.fit(wide, 800.0, 600.0, 50.0, 2.0, LIMITS);
        assert!((viewport.zoom - 0.5).abs() < 1e-12);
        assert!(close(
            viewport.world_to_screen(wide.center()),
            Point::new(400.0, 300.0)
        ));
    }
}
