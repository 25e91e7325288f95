use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, Window};

use doodleboard_shared::{BoardConfig, Point, Status};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}

pub fn debug_log(debug: bool, message: &str) {
    if debug {
        web_sys::console::log_1(&message.into());
    }
}

/// Board settings from the canvas's `data-config` JSON attribute. A missing
/// attribute means defaults; a malformed or invalid one is an error.
pub fn read_config(canvas: &HtmlCanvasElement) -> Result<BoardConfig, JsValue> {
    let Some(raw) = canvas.get_attribute("data-config") else {
        return Ok(BoardConfig::default());
    };
    let config: BoardConfig = serde_json::from_str(&raw)
        .map_err(|err| JsValue::from_str(&format!("Invalid data-config: {err}")))?;
    config
        .validate()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(config)
}

/// Pointer position relative to the canvas's top-left corner.
pub fn client_to_surface(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(client_x - rect.left(), client_y - rect.top())
}

/// True while an input or textarea owns the keyboard.
pub fn text_has_focus(document: &Document) -> bool {
    document.active_element().is_some_and(|element| {
        let tag = element.tag_name();
        tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("textarea")
    })
}

pub fn set_pressed(button: &HtmlButtonElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn set_hidden(element: &Element, hidden: bool) {
    if hidden {
        let _ = element.set_attribute("hidden", "");
    } else {
        let _ = element.remove_attribute("hidden");
    }
}

pub fn render_status(status_el: &Element, status: &Status) {
    let text = format!(
        "{} · {}% · {} item{}",
        status.tool,
        status.zoom_percent,
        status.item_count,
        if status.item_count == 1 { "" } else { "s" }
    );
    status_el.set_text_content(Some(&text));
}

pub fn set_disabled(button: &HtmlButtonElement, disabled: bool) {
    button.set_disabled(disabled);
}

/// `YYYY-MM-DD` in local time.
pub fn today_stamp() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year(),
        now.get_month() + 1,
        now.get_date()
    )
}

pub fn set_cursor(canvas: &HtmlCanvasElement, pan_mode: bool) {
    let cursor = if pan_mode { "grab" } else { "crosshair" };
    let _ = canvas.style().set_property("cursor", cursor);
}
