use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{File, FileList, FileReader, HtmlImageElement, ProgressEvent};

use doodleboard_shared::media::media_kind_for_mime;
use doodleboard_shared::{DecodeRequest, ElementId, IncomingFile};

fn read_data_url(event: &ProgressEvent) -> Option<String> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    reader.result().ok()?.as_string()
}

/// Accepted files from a picker or drop, in list order.
pub fn supported_files(list: &FileList, debug: bool) -> Vec<File> {
    let mut files = Vec::new();
    for index in 0..list.length() {
        let Some(file) = list.get(index) else {
            continue;
        };
        match media_kind_for_mime(&file.type_()) {
            Ok(_) => files.push(file),
            Err(err) => {
                if debug {
                    web_sys::console::log_1(&format!("Skipping {}: {err}", file.name()).into());
                }
            }
        }
    }
    files
}

/// Reads `file` into a `data:` URL and hands it over once loaded.
pub fn read_file(file: &File, on_read: impl FnOnce(IncomingFile) + 'static) -> Result<(), JsValue> {
    let reader = FileReader::new()?;
    let name = file.name();
    let mime = file.type_();
    let onload = Closure::once_into_js(move |event: ProgressEvent| {
        let Some(data) = read_data_url(&event) else {
            web_sys::console::error_1(&format!("Failed to read {name}").into());
            return;
        };
        on_read(IncomingFile { name, mime, data });
    });
    reader.set_onload(Some(onload.unchecked_ref()));
    reader.read_as_data_url(file)
}

/// Starts decoding a media bitmap. `on_done` runs exactly once, with the
/// image on success and `None` when the browser cannot decode the payload.
pub fn decode_image(
    request: DecodeRequest,
    on_done: impl FnOnce(ElementId, Option<HtmlImageElement>) + 'static,
) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;
    let done = Rc::new(RefCell::new(Some(on_done)));

    let onload = {
        let done = done.clone();
        let image = image.clone();
        let id = request.id.clone();
        Closure::once_into_js(move || {
            if let Some(on_done) = done.borrow_mut().take() {
                on_done(id, Some(image));
            }
        })
    };
    let onerror = {
        let id = request.id.clone();
        Closure::once_into_js(move || {
            if let Some(on_done) = done.borrow_mut().take() {
                on_done(id, None);
            }
        })
    };
    image.set_onload(Some(onload.unchecked_ref()));
    image.set_onerror(Some(onerror.unchecked_ref()));
    image.set_src(&request.data);
    Ok(())
}
