use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::BoardError;
use crate::model::{ElementId, MediaKind};

pub fn media_kind_for_mime(mime: &str) -> Result<MediaKind, BoardError> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.starts_with("image/") {
        Ok(MediaKind::Image)
    } else if mime == "application/pdf" {
        Ok(MediaKind::Pdf)
    } else {
        Err(BoardError::UnsupportedMediaKind(mime))
    }
}

/// Returns the declared MIME type of a `data:` URL. A `;base64` payload
/// must decode cleanly.
pub fn data_url_mime(data: &str) -> Result<&str, BoardError> {
    let rest = data.strip_prefix("data:").ok_or(BoardError::InvalidDataUrl)?;
    let (header, body) = rest.split_once(',').ok_or(BoardError::InvalidDataUrl)?;
    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default();
    if params.any(|param| param.eq_ignore_ascii_case("base64")) {
        STANDARD
            .decode(body)
            .map_err(|_| BoardError::InvalidDataUrl)?;
    }
    Ok(mime)
}

/// A file handed over by the ingestion surface, already read into a data URL.
#[derive(Clone, Debug, PartialEq)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub data: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeState {
    Requested,
    Ready,
    Failed,
}

/// Decode request handed to the host when the renderer meets media it has
/// never seen.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeRequest {
    pub id: ElementId,
    pub data: String,
}

/// Tracks asynchronous bitmap decodes per media element.
///
/// Entries outlive the element they describe. Undo can bring a cleared
/// element back, and it then paints without a second decode.
#[derive(Clone, Debug, Default)]
pub struct MediaStore {
    states: HashMap<ElementId, DecodeState>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &ElementId) -> Option<DecodeState> {
        self.states.get(id).copied()
    }

    /// Marks `id` as requested. Returns true only the first time.
    pub fn request(&mut self, id: &ElementId) -> bool {
        if self.states.contains_key(id) {
            return false;
        }
        self.states.insert(id.clone(), DecodeState::Requested);
        true
    }

    /// Records a finished decode. Returns true when this changes what a
    /// repaint would draw.
    pub fn mark_ready(&mut self, id: &ElementId) -> bool {
        let previous = self.states.insert(id.clone(), DecodeState::Ready);
        previous != Some(DecodeState::Ready)
    }

    pub fn mark_failed(&mut self, id: &ElementId) {
        self.states.insert(id.clone(), DecodeState::Failed);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
