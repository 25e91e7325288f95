use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, DragEvent, Element, Event, File, HtmlAnchorElement,
    HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    KeyboardEvent, PointerEvent, WheelEvent, Window,
};

use doodleboard_shared::{
    shortcut_for, Action, Button, Controller, DecodeRequest, ElementId, KeyInput, NotePatch,
    PointerDown, Session, Shortcut, Tool,
};

use crate::canvas::WebCanvas;
use crate::dom::{
    client_to_surface, debug_enabled, debug_log, get_element, read_config, render_status,
    set_cursor, set_disabled, set_hidden, set_pressed, text_has_focus, today_stamp,
};
use crate::files::{decode_image, read_file, supported_files};
use crate::util::make_id_prefix;

struct Ui {
    status: Element,
    undo_button: HtmlButtonElement,
    redo_button: HtmlButtonElement,
    grid_button: HtmlButtonElement,
    pan_button: HtmlButtonElement,
    tool_buttons: Vec<(Tool, HtmlButtonElement)>,
    note_editor: Element,
    note_text: HtmlTextAreaElement,
    note_color: HtmlInputElement,
    note_font: HtmlInputElement,
    note_x: HtmlInputElement,
    note_y: HtmlInputElement,
    note_width: HtmlInputElement,
    note_height: HtmlInputElement,
    /// Note currently loaded into the editor fields.
    editing: Option<ElementId>,
    /// `Session::restores` at the time the fields were loaded.
    loaded_at: u64,
}

struct App {
    controller: Controller,
    surface: WebCanvas,
    ui: Ui,
    debug: bool,
}

type SharedApp = Rc<RefCell<App>>;

impl App {
    fn sync_ui(&mut self) {
        let session = self.controller.session();
        let status = session.status();
        render_status(&self.ui.status, &status);
        set_disabled(&self.ui.undo_button, !status.can_undo);
        set_disabled(&self.ui.redo_button, !status.can_redo);
        set_pressed(&self.ui.grid_button, session.show_grid());
        set_pressed(&self.ui.pan_button, session.pan_mode());
        set_cursor(self.surface.element(), session.pan_mode());
        for (tool, button) in &self.ui.tool_buttons {
            set_pressed(button, *tool == status.tool);
        }

        let note = session.selection().and_then(|id| session.scene().note(id));
        match note {
            Some(note) => {
                let stale = self.ui.editing.as_ref() != Some(&note.id)
                    || self.ui.loaded_at != session.restores();
                if stale {
                    self.ui.note_text.set_value(&note.text);
                    self.ui.note_color.set_value(&note.color);
                    self.ui.note_font.set_value_as_number(note.font_size);
                    self.ui.note_x.set_value_as_number(note.x.round());
                    self.ui.note_y.set_value_as_number(note.y.round());
                    self.ui.note_width.set_value_as_number(note.width.round());
                    self.ui.note_height.set_value_as_number(note.height.round());
                    self.ui.editing = Some(note.id.clone());
                    self.ui.loaded_at = session.restores();
                }
                set_hidden(&self.ui.note_editor, false);
            }
            None => {
                self.ui.editing = None;
                set_hidden(&self.ui.note_editor, true);
            }
        }
    }
}

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

/// Runs `action` against the surface and starts any decodes the repaint
/// asked for.
fn dispatch(app: &SharedApp, action: Action) {
    if action == Action::None {
        return;
    }
    let requests = {
        let mut app = app.borrow_mut();
        let app = &mut *app;
        let report = app.controller.perform(&mut app.surface, action);
        if action == Action::Repaint {
            app.sync_ui();
        }
        report.decode_requests
    };
    for request in requests {
        start_decode(app, request);
    }
}

fn with_session(app: &SharedApp, update: impl FnOnce(&mut Session)) {
    update(app.borrow_mut().controller.session_mut());
    dispatch(app, Action::Repaint);
}

fn start_decode(app: &SharedApp, request: DecodeRequest) {
    let id = request.id.clone();
    let weak = Rc::downgrade(app);
    let started = decode_image(request, move |id, image| {
        let Some(app) = weak.upgrade() else {
            return;
        };
        let repaint = {
            let mut app = app.borrow_mut();
            match image {
                Some(image) => {
                    app.surface.insert_image(id.clone(), image);
                    app.controller.session_mut().media_ready(&id)
                }
                None => {
                    debug_log(app.debug, &format!("Decode failed for {id}"));
                    app.controller.session_mut().media_failed(&id);
                    false
                }
            }
        };
        if repaint {
            dispatch(&app, Action::Repaint);
        }
    });
    if let Err(err) = started {
        web_sys::console::error_1(&err);
        app.borrow_mut().controller.session_mut().media_failed(&id);
    }
}

fn ingest_files(app: &SharedApp, files: Vec<File>) {
    for file in files {
        let weak = Rc::downgrade(app);
        let read = read_file(&file, move |incoming| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            let added = app
                .borrow_mut()
                .controller
                .session_mut()
                .add_media(incoming);
            match added {
                Ok(id) => {
                    debug_log(app.borrow().debug, &format!("Added media {id}"));
                    dispatch(&app, Action::Repaint);
                }
                Err(err) => web_sys::console::warn_1(&err.to_string().into()),
            }
        });
        if let Err(err) = read {
            web_sys::console::error_1(&err);
        }
    }
}

fn patch_selected_note(app: &SharedApp, patch: NotePatch) {
    let changed = {
        let mut app = app.borrow_mut();
        match app.ui.editing.clone() {
            Some(id) => app.controller.session_mut().mutate_note(&id, patch),
            None => false,
        }
    };
    if changed {
        dispatch(app, Action::Repaint);
    }
}

fn export_png(app: &App, document: &Document) -> Result<(), JsValue> {
    let href = app.surface.to_png_data_url()?;
    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| JsValue::from_str("Invalid anchor element"))?;
    anchor.set_href(&href);
    anchor.set_download(&format!("whiteboard-{}.png", today_stamp()));
    anchor.click();
    Ok(())
}

fn run_shortcut(app: &SharedApp, window: &Window, document: &Document, shortcut: Shortcut) {
    match shortcut {
        Shortcut::Export => {
            if let Err(err) = export_png(&app.borrow(), document) {
                web_sys::console::error_1(&err);
            }
            return;
        }
        Shortcut::ClearAll => {
            let confirmed = window
                .confirm_with_message("Clear the whole board?")
                .unwrap_or(false);
            if !confirmed {
                return;
            }
        }
        _ => {}
    }
    let action = app.borrow_mut().controller.shortcut(shortcut);
    dispatch(app, action);
}

fn resize(app: &SharedApp, window: &Window) {
    {
        let mut app = app.borrow_mut();
        let (width, height) = app.surface.resize(window.device_pixel_ratio());
        app.controller.session_mut().set_surface_size(width, height);
        debug_log(app.debug, &format!("Surface {width}x{height}"));
    }
    dispatch(app, Action::Repaint);
}

fn on_click(
    button: &HtmlButtonElement,
    app: &SharedApp,
    handler: impl Fn(&SharedApp) + 'static,
) -> Result<(), JsValue> {
    let app = app.clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |_| handler(&app));
    button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

fn tool_buttons(document: &Document) -> Result<Vec<(Tool, HtmlButtonElement)>, JsValue> {
    let nodes = document.query_selector_all("[data-tool]")?;
    let mut buttons = Vec::new();
    for index in 0..nodes.length() {
        let Some(button) = nodes
            .get(index)
            .and_then(|node| node.dyn_into::<HtmlButtonElement>().ok())
        else {
            continue;
        };
        let name = button.get_attribute("data-tool").unwrap_or_default();
        match name.parse::<Tool>() {
            Ok(tool) => buttons.push((tool, button)),
            Err(err) => web_sys::console::warn_1(&err.to_string().into()),
        }
    }
    Ok(buttons)
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let debug = debug_enabled(&window);
    debug_log(debug, "Doodleboard debug logging enabled");

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let config = read_config(&canvas)?;

    let brush_color: HtmlInputElement = get_element(&document, "brush-color")?;
    let brush_size: HtmlInputElement = get_element(&document, "brush-size")?;
    let brush_opacity: HtmlInputElement = get_element(&document, "brush-opacity")?;
    let undo_button: HtmlButtonElement = get_element(&document, "undo")?;
    let redo_button: HtmlButtonElement = get_element(&document, "redo")?;
    let clear_button: HtmlButtonElement = get_element(&document, "clear")?;
    let zoom_in_button: HtmlButtonElement = get_element(&document, "zoom-in")?;
    let zoom_out_button: HtmlButtonElement = get_element(&document, "zoom-out")?;
    let zoom_reset_button: HtmlButtonElement = get_element(&document, "zoom-reset")?;
    let fit_button: HtmlButtonElement = get_element(&document, "fit")?;
    let home_button: HtmlButtonElement = get_element(&document, "home")?;
    let grid_button: HtmlButtonElement = get_element(&document, "grid-toggle")?;
    let pan_button: HtmlButtonElement = get_element(&document, "pan-toggle")?;
    let export_button: HtmlButtonElement = get_element(&document, "export")?;
    let upload_button: HtmlButtonElement = get_element(&document, "upload")?;
    let media_file: HtmlInputElement = get_element(&document, "media-file")?;
    let note_delete: HtmlButtonElement = get_element(&document, "note-delete")?;

    let ui = Ui {
        status: get_element(&document, "status")?,
        undo_button: undo_button.clone(),
        redo_button: redo_button.clone(),
        grid_button: grid_button.clone(),
        pan_button: pan_button.clone(),
        tool_buttons: tool_buttons(&document)?,
        note_editor: get_element(&document, "note-editor")?,
        note_text: get_element(&document, "note-text")?,
        note_color: get_element(&document, "note-color")?,
        note_font: get_element(&document, "note-font")?,
        note_x: get_element(&document, "note-x")?,
        note_y: get_element(&document, "note-y")?,
        note_width: get_element(&document, "note-width")?,
        note_height: get_element(&document, "note-height")?,
        editing: None,
        loaded_at: 0,
    };

    let app: SharedApp = Rc::new(RefCell::new(App {
        controller: Controller::new(Session::new(config, make_id_prefix())),
        surface: WebCanvas::new(canvas.clone(), ctx),
        ui,
        debug,
    }));

    {
        let resize_app = app.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            resize(&resize_app, &window_cb);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    {
        let key_app = app.clone();
        let key_window = window.clone();
        let key_document = document.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let input = KeyInput {
                key: event.key(),
                ctrl: event.ctrl_key(),
                meta: event.meta_key(),
                shift: event.shift_key(),
                text_focus: text_has_focus(&key_document),
            };
            let Some(shortcut) = shortcut_for(&input) else {
                return;
            };
            event.prevent_default();
            run_shortcut(&key_app, &key_window, &key_document, shortcut);
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    let buttons = app.borrow().ui.tool_buttons.clone();
    for (tool, button) in buttons {
        on_click(&button, &app, move |app| {
            let mut app = app.borrow_mut();
            app.controller.session_mut().set_tool(tool);
            app.sync_ui();
        })?;
    }

    for input in [&brush_color, &brush_size, &brush_opacity] {
        let brush_app = app.clone();
        let color = brush_color.clone();
        let size = brush_size.clone();
        let opacity = brush_opacity.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            brush_app.borrow_mut().controller.session_mut().set_brush(
                &color.value(),
                size.value_as_number(),
                opacity.value_as_number(),
            );
        });
        input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    on_click(&undo_button, &app, |app| {
        let action = app.borrow_mut().controller.shortcut(Shortcut::Undo);
        dispatch(app, action);
    })?;
    on_click(&redo_button, &app, |app| {
        let action = app.borrow_mut().controller.shortcut(Shortcut::Redo);
        dispatch(app, action);
    })?;
    {
        let clear_window = window.clone();
        let clear_document = document.clone();
        on_click(&clear_button, &app, move |app| {
            run_shortcut(app, &clear_window, &clear_document, Shortcut::ClearAll);
        })?;
    }
    {
        let export_window = window.clone();
        let export_document = document.clone();
        on_click(&export_button, &app, move |app| {
            run_shortcut(app, &export_window, &export_document, Shortcut::Export);
        })?;
    }
    on_click(&zoom_in_button, &app, |app| with_session(app, Session::zoom_in))?;
    on_click(&zoom_out_button, &app, |app| with_session(app, Session::zoom_out))?;
    on_click(&zoom_reset_button, &app, |app| {
        with_session(app, Session::reset_zoom)
    })?;
    on_click(&home_button, &app, |app| with_session(app, Session::reset_view))?;
    on_click(&fit_button, &app, |app| {
        with_session(app, |session| {
            session.fit_to_content();
        })
    })?;
    on_click(&grid_button, &app, |app| {
        with_session(app, |session| {
            session.toggle_grid();
        })
    })?;
    on_click(&pan_button, &app, |app| {
        let mut app = app.borrow_mut();
        app.controller.session_mut().toggle_pan_mode();
        app.sync_ui();
    })?;
    on_click(&note_delete, &app, |app| {
        let deleted = {
            let mut app = app.borrow_mut();
            match app.ui.editing.clone() {
                Some(id) => app.controller.session_mut().delete_note(&id),
                None => false,
            }
        };
        if deleted {
            dispatch(app, Action::Repaint);
        }
    })?;

    {
        let media_file_cb = media_file.clone();
        on_click(&upload_button, &app, move |_| {
            media_file_cb.set_value("");
            media_file_cb.click();
        })?;
    }

    {
        let change_app = app.clone();
        let media_file_cb = media_file.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some(list) = media_file_cb.files() else {
                return;
            };
            let files = supported_files(&list, change_app.borrow().debug);
            ingest_files(&change_app, files);
        });
        media_file.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let text_app = app.clone();
        let text_input = app.borrow().ui.note_text.clone();
        let text_input_cb = text_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            patch_selected_note(
                &text_app,
                NotePatch {
                    text: Some(text_input_cb.value()),
                    ..NotePatch::default()
                },
            );
        });
        text_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let color_app = app.clone();
        let color_input = app.borrow().ui.note_color.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            patch_selected_note(
                &color_app,
                NotePatch {
                    color: Some(color_input_cb.value()),
                    ..NotePatch::default()
                },
            );
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let shared = app.borrow();
        let ui = &shared.ui;
        let number_fields: [(&HtmlInputElement, fn(f64) -> NotePatch); 5] = [
            (&ui.note_font, |value| NotePatch {
                font_size: Some(value),
                ..NotePatch::default()
            }),
            (&ui.note_x, |value| NotePatch {
                x: Some(value),
                ..NotePatch::default()
            }),
            (&ui.note_y, |value| NotePatch {
                y: Some(value),
                ..NotePatch::default()
            }),
            (&ui.note_width, |value| NotePatch {
                width: Some(value),
                ..NotePatch::default()
            }),
            (&ui.note_height, |value| NotePatch {
                height: Some(value),
                ..NotePatch::default()
            }),
        ];
        for (input, patch) in number_fields {
            let field_app = app.clone();
            let input_cb = input.clone();
            let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
                let value = input_cb.value_as_number();
                if value.is_finite() {
                    patch_selected_note(&field_app, patch(value));
                }
            });
            input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
            oninput.forget();
        }
    }

    {
        let down_app = app.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some(button) = Button::from_dom(event.button()) else {
                return;
            };
            event.prevent_default();
            if let Some(active) = down_canvas
                .owner_document()
                .and_then(|document| document.active_element())
                .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            {
                let _ = active.blur();
            }
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            let screen = client_to_surface(
                &down_canvas,
                event.client_x() as f64,
                event.client_y() as f64,
            );
            let action = down_app.borrow_mut().controller.pointer_down(PointerDown {
                screen,
                button,
                alt_key: event.alt_key(),
            });
            dispatch(&down_app, action);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_app = app.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let screen = client_to_surface(
                &move_canvas,
                event.client_x() as f64,
                event.client_y() as f64,
            );
            let action = move_app.borrow_mut().controller.pointer_move(screen);
            dispatch(&move_app, action);
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let stop_app = app.clone();
        let stop_canvas = canvas.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let _ = stop_canvas.release_pointer_capture(event.pointer_id());
            let action = stop_app.borrow_mut().controller.pointer_up();
            dispatch(&stop_app, action);
        });
        for name in ["pointerup", "pointerleave", "pointercancel"] {
            canvas.add_event_listener_with_callback(name, onstop.as_ref().unchecked_ref())?;
        }
        onstop.forget();
    }

    {
        let zoom_app = app.clone();
        let zoom_canvas = canvas.clone();
        let onwheel = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let wheel_event = match event.dyn_into::<WheelEvent>() {
                Ok(event) => event,
                Err(_) => return,
            };
            wheel_event.prevent_default();
            let screen = client_to_surface(
                &zoom_canvas,
                wheel_event.client_x() as f64,
                wheel_event.client_y() as f64,
            );
            let action = zoom_app
                .borrow_mut()
                .controller
                .wheel(screen, wheel_event.delta_y());
            dispatch(&zoom_app, action);
        });
        canvas.add_event_listener_with_callback("wheel", onwheel.as_ref().unchecked_ref())?;
        onwheel.forget();
    }

    {
        let ondragover = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
        });
        canvas.add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())?;
        ondragover.forget();

        let drop_app = app.clone();
        let ondrop = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let Some(list) = event.data_transfer().and_then(|transfer| transfer.files()) else {
                return;
            };
            let files = supported_files(&list, drop_app.borrow().debug);
            ingest_files(&drop_app, files);
        });
        canvas.add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())?;
        ondrop.forget();
    }

    resize(&app, &window);
    debug_log(debug, "Doodleboard ready");
    Ok(())
}
