//! Platform-independent whiteboard core: scene model, history, viewport math,
//! rasterization against an abstract [`Canvas`], and the pointer state machine.

pub mod canvas;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod media;
pub mod model;
pub mod render;
pub mod session;
pub mod shapes;
pub mod viewport;

pub use canvas::{Canvas, CompositeMode, DrawCommand, RecordingCanvas};
pub use config::BoardConfig;
pub use error::BoardError;
pub use history::History;
pub use input::{shortcut_for, Action, Button, Controller, InputState, KeyInput, PointerDown, Shortcut};
pub use media::{DecodeRequest, DecodeState, IncomingFile, MediaStore};
pub use model::{
    Bounds, Element, ElementId, MediaElement, MediaKind, NotePatch, Point, Scene, Shape, ShapeKind,
    StickyNote, Stroke, StrokeTool, Tool,
};
pub use render::RepaintReport;
pub use session::{Brush, Session, Status};
pub use viewport::Viewport;
