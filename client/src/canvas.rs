use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use doodleboard_shared::{Canvas, CompositeMode, ElementId};

/// [`Canvas`] backed by the page's 2D context. Sizes are CSS pixels; the
/// device pixel ratio lives in the context's base transform.
pub struct WebCanvas {
    element: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    /// Decoded bitmaps by media id. Kept after the element leaves the scene
    /// so undo can restore it without decoding again.
    images: HashMap<ElementId, HtmlImageElement>,
}

impl WebCanvas {
    pub fn new(element: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self {
            element,
            ctx,
            width: 0.0,
            height: 0.0,
            images: HashMap::new(),
        }
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.element
    }

    /// Matches the backing store to the element's layout box.
    pub fn resize(&mut self, dpr: f64) -> (f64, f64) {
        let rect = self.element.get_bounding_client_rect();
        self.element.set_width((rect.width() * dpr) as u32);
        self.element.set_height((rect.height() * dpr) as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        self.width = rect.width();
        self.height = rect.height();
        (self.width, self.height)
    }

    pub fn insert_image(&mut self, id: ElementId, image: HtmlImageElement) {
        self.images.insert(id, image);
    }

    pub fn to_png_data_url(&self) -> Result<String, JsValue> {
        self.element.to_data_url_with_type("image/png")
    }
}

impl Canvas for WebCanvas {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn scale(&mut self, x: f64, y: f64) {
        let _ = self.ctx.scale(x, y);
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.ctx.translate(x, y);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        let _ = self.ctx.set_global_composite_operation(mode.as_str());
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_round_lines(&mut self) {
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let dash = js_sys::Array::new();
        for segment in segments {
            dash.push(&JsValue::from_f64(*segment));
        }
        let _ = self.ctx.set_line_dash(&dash);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.stroke_rect(x, y, width, height);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ctx.quadratic_curve_to(cpx, cpy, x, y);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.ctx.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        let _ = self.ctx.arc(x, y, radius.abs(), start, end);
    }

    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64) {
        let _ = self
            .ctx
            .ellipse(x, y, radius_x.abs(), radius_y.abs(), 0.0, 0.0, 2.0 * PI);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ctx.set_text_align("left");
        self.ctx.set_text_baseline("top");
        let _ = self.ctx.fill_text(text, x, y);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.ctx
            .measure_text(text)
            .map(|metrics| metrics.width())
            .unwrap_or_default()
    }

    fn draw_image(&mut self, id: &ElementId, x: f64, y: f64, width: f64, height: f64) {
        let Some(image) = self.images.get(id) else {
            return;
        };
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height);
    }
}
