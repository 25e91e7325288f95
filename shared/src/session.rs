use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::history::History;
use crate::media::{data_url_mime, media_kind_for_mime, IncomingFile, MediaStore};
use crate::model::{
    Element, ElementId, MediaElement, NotePatch, Point, Scene, Shape, StickyNote, Stroke, Tool,
};
use crate::render::{self, Frame, RepaintReport, StrokeStyle};
use crate::viewport::Viewport;

/// Active tool plus the paint settings picked in the toolbar.
#[derive(Clone, Debug, PartialEq)]
pub struct Brush {
    pub tool: Tool,
    pub color: String,
    pub size: f64,
    pub opacity: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            color: "#000000".to_string(),
            size: 3.0,
            opacity: 1.0,
        }
    }
}

/// Geometry being dragged out, held outside the scene until it commits.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Stroke(Stroke),
    Shape(Shape),
}

/// What `begin_gesture` did with the pointer-down.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureStart {
    Stroke,
    Shape,
    NoteCreated(ElementId),
    Selected(Option<ElementId>),
}

/// What `extend_gesture` changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureUpdate {
    Segment { from: Point, to: Point },
    ShapeResized,
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub tool: Tool,
    pub zoom_percent: u32,
    pub item_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Unique ids for notes and media, `{prefix}-{counter}`.
#[derive(Clone, Debug)]
struct IdAllocator {
    prefix: String,
    next: u64,
}

impl IdAllocator {
    fn next(&mut self) -> ElementId {
        self.next += 1;
        ElementId::new(format!("{}-{}", self.prefix, self.next))
    }
}

/// All state of one board: committed scene, history, viewport, the gesture
/// in progress, selection and toolbar settings.
pub struct Session {
    config: BoardConfig,
    scene: Scene,
    history: History,
    viewport: Viewport,
    brush: Brush,
    gesture: Option<Gesture>,
    selection: Option<ElementId>,
    media: MediaStore,
    ids: IdAllocator,
    show_grid: bool,
    pan_mode: bool,
    surface: (f64, f64),
    restores: u64,
}

impl Session {
    pub fn new(config: BoardConfig, id_prefix: impl Into<String>) -> Self {
        let show_grid = config.show_grid;
        Self {
            config,
            scene: Scene::default(),
            history: History::new(),
            viewport: Viewport::default(),
            brush: Brush::default(),
            gesture: None,
            selection: None,
            media: MediaStore::new(),
            ids: IdAllocator {
                prefix: id_prefix.into(),
                next: 0,
            },
            show_grid,
            pan_mode: false,
            surface: (0.0, 0.0),
            restores: 0,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn selection(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    /// Bumped each time undo or redo swaps the scene. Views that mirror a
    /// selected note reload from it when this changes.
    pub fn restores(&self) -> u64 {
        self.restores
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    // --- Toolbar settings ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.brush.tool = tool;
    }

    /// Size and opacity are clamped to the configured ranges.
    pub fn set_brush(&mut self, color: &str, size: f64, opacity: f64) {
        if !color.is_empty() {
            self.brush.color = color.to_string();
        }
        self.brush.size = self.config.brush_size.clamp(size, self.brush.size);
        self.brush.opacity = self.config.opacity.clamp(opacity, self.brush.opacity);
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    pub fn toggle_pan_mode(&mut self) -> bool {
        self.pan_mode = !self.pan_mode;
        self.pan_mode
    }

    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.surface = (width, height);
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.selection = id;
    }

    // --- Gestures ---

    pub fn begin_gesture(&mut self, point: Point) -> GestureStart {
        let brush = self.brush.clone();
        match brush.tool {
            Tool::Shape(kind) => {
                self.gesture = Some(Gesture::Shape(Shape {
                    kind,
                    start: Some(point),
                    end: Some(point),
                    color: brush.color,
                    width: brush.size,
                    opacity: brush.opacity,
                }));
                GestureStart::Shape
            }
            Tool::Stroke(tool) => {
                self.gesture = Some(Gesture::Stroke(Stroke {
                    tool,
                    color: brush.color,
                    width: brush.size,
                    opacity: brush.opacity,
                    points: vec![point],
                }));
                GestureStart::Stroke
            }
            Tool::StickyNote => GestureStart::NoteCreated(self.create_note(point)),
            Tool::Select => {
                let hit = self.hit_test(point);
                debug!(hit = ?hit, "select");
                self.selection = hit.clone();
                GestureStart::Selected(hit)
            }
        }
    }

    pub fn extend_gesture(&mut self, point: Point) -> GestureUpdate {
        match &mut self.gesture {
            Some(Gesture::Stroke(stroke)) => {
                let from = stroke.points.last().copied().unwrap_or(point);
                stroke.points.push(point);
                GestureUpdate::Segment { from, to: point }
            }
            Some(Gesture::Shape(shape)) => {
                shape.end = Some(point);
                GestureUpdate::ShapeResized
            }
            None => GestureUpdate::Ignored,
        }
    }

    /// Commits the gesture in progress. Strokes need at least two points and
    /// shapes both endpoints; anything less is dropped without touching
    /// history.
    pub fn end_gesture(&mut self) -> bool {
        let element = match self.gesture.take() {
            Some(Gesture::Stroke(stroke)) if stroke.points.len() >= 2 => Element::Stroke(stroke),
            Some(Gesture::Shape(shape)) if shape.endpoints().is_some() => Element::Shape(shape),
            Some(_) => {
                debug!("degenerate gesture discarded");
                return false;
            }
            None => return false,
        };
        self.commit(element);
        true
    }

    /// Style of the open stroke, for the live segment path.
    pub fn live_stroke_style(&self) -> Option<StrokeStyle> {
        match &self.gesture {
            Some(Gesture::Stroke(stroke)) => Some(StrokeStyle::from(stroke)),
            _ => None,
        }
    }

    fn commit(&mut self, element: Element) {
        self.history.commit(self.scene.clone());
        self.scene.elements.push(element);
        debug!(
            elements = self.scene.elements.len(),
            undo = self.history.undo_len(),
            "commit"
        );
    }

    // --- Notes ---

    fn create_note(&mut self, point: Point) -> ElementId {
        let id = self.ids.next();
        let defaults = &self.config.note;
        self.scene.notes.push(StickyNote {
            id: id.clone(),
            x: point.x,
            y: point.y,
            width: defaults.width,
            height: defaults.height,
            text: defaults.text.clone(),
            color: defaults.color.clone(),
            font_size: defaults.font_size,
        });
        self.selection = Some(id.clone());
        debug!(%id, "note created");
        id
    }

    pub fn mutate_note(&mut self, id: &ElementId, patch: NotePatch) -> bool {
        let font_range = self.config.font_size;
        let min_size = self.config.min_note_size;
        let Some(note) = self.scene.note_mut(id) else {
            warn!(%id, "mutate on missing note");
            return false;
        };
        if let Some(text) = patch.text {
            note.text = text;
        }
        if let Some(color) = patch.color {
            note.color = color;
        }
        if let Some(font_size) = patch.font_size {
            note.font_size = font_range.clamp(font_size, note.font_size);
        }
        if let Some(x) = patch.x.filter(|x| x.is_finite()) {
            note.x = x;
        }
        if let Some(y) = patch.y.filter(|y| y.is_finite()) {
            note.y = y;
        }
        if let Some(width) = patch.width.filter(|w| w.is_finite()) {
            note.width = width.max(min_size);
        }
        if let Some(height) = patch.height.filter(|h| h.is_finite()) {
            note.height = height.max(min_size);
        }
        true
    }

    pub fn delete_note(&mut self, id: &ElementId) -> bool {
        let Some(index) = self.scene.notes.iter().position(|note| &note.id == id) else {
            return false;
        };
        self.scene.notes.remove(index);
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        debug!(%id, "note deleted");
        true
    }

    // --- Whole-scene mutations ---

    pub fn clear_all(&mut self) {
        self.gesture = None;
        self.history.commit(std::mem::take(&mut self.scene));
        self.selection = None;
        debug!(undo = self.history.undo_len(), "cleared");
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.scene);
        if changed {
            self.after_history_move();
            debug!(
                undo = self.history.undo_len(),
                redo = self.history.redo_len(),
                "undo"
            );
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.scene);
        if changed {
            self.after_history_move();
            debug!(
                undo = self.history.undo_len(),
                redo = self.history.redo_len(),
                "redo"
            );
        }
        changed
    }

    fn after_history_move(&mut self) {
        self.restores += 1;
        let still_there = self.selection.as_ref().is_some_and(|id| {
            self.scene.note(id).is_some() || self.scene.media().any(|item| &item.id == id)
        });
        if !still_there {
            self.selection = None;
        }
    }

    // --- Media ---

    /// Appends one media element at the default placement, as a committing
    /// mutation.
    pub fn add_media(&mut self, file: IncomingFile) -> Result<ElementId, BoardError> {
        let kind = media_kind_for_mime(&file.mime)?;
        data_url_mime(&file.data)?;
        let id = self.ids.next();
        self.commit(Element::Media(MediaElement {
            id: id.clone(),
            kind,
            x: self.config.media_x,
            y: self.config.media_y,
            width: self.config.media_width,
            height: self.config.media_height,
            data: file.data,
            name: file.name,
        }));
        Ok(id)
    }

    /// Ingests a batch; unsupported files are skipped.
    pub fn add_media_files(
        &mut self,
        files: impl IntoIterator<Item = IncomingFile>,
    ) -> Vec<ElementId> {
        let mut added = Vec::new();
        for file in files {
            let name = file.name.clone();
            match self.add_media(file) {
                Ok(id) => added.push(id),
                Err(error) => debug!(%name, %error, "file skipped"),
            }
        }
        added
    }

    /// Decode finished. Returns true when a follow-up repaint is due.
    pub fn media_ready(&mut self, id: &ElementId) -> bool {
        self.media.mark_ready(id)
    }

    pub fn media_failed(&mut self, id: &ElementId) {
        warn!(%id, "media decode failed");
        self.media.mark_failed(id);
    }

    // --- Queries ---

    /// Notes first, then media, each in list order. First match wins.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        if let Some(note) = self
            .scene
            .notes
            .iter()
            .find(|note| note.bounds().contains(point))
        {
            return Some(note.id.clone());
        }
        self.scene
            .media()
            .find(|item| item.bounds().contains(point))
            .map(|item| item.id.clone())
    }

    pub fn status(&self) -> Status {
        Status {
            tool: self.brush.tool,
            zoom_percent: (self.viewport.zoom * 100.0).round() as u32,
            item_count: self.scene.len(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // --- Viewport ---

    pub fn wheel_zoom(&mut self, anchor: Point, delta_y: f64) {
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out
        } else {
            self.config.wheel_zoom_in
        };
        let zoom = self.viewport.zoom * factor;
        self.viewport.zoom_around(anchor, zoom, self.config.zoom);
    }

    pub fn zoom_in(&mut self) {
        let zoom = self.viewport.zoom * self.config.button_zoom_step;
        self.viewport
            .zoom_around(self.surface_center(), zoom, self.config.zoom);
    }

    pub fn zoom_out(&mut self) {
        let zoom = self.viewport.zoom / self.config.button_zoom_step;
        self.viewport
            .zoom_around(self.surface_center(), zoom, self.config.zoom);
    }

    /// Back to 100% without moving the pan.
    pub fn reset_zoom(&mut self) {
        self.viewport.zoom = 1.0;
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Frames all content. No-op on an empty board.
    pub fn fit_to_content(&mut self) -> bool {
        let Some(bounds) = self.scene.content_bounds() else {
            return false;
        };
        let (width, height) = self.surface;
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        self.viewport.fit(
            bounds,
            width,
            height,
            self.config.fit_padding,
            self.config.fit_max_zoom,
            self.config.zoom,
        );
        true
    }

    fn surface_center(&self) -> Point {
        Point::new(self.surface.0 / 2.0, self.surface.1 / 2.0)
    }

    // --- Painting ---

    pub fn repaint<C: Canvas>(&mut self, canvas: &mut C) -> RepaintReport {
        let preview = match &self.gesture {
            Some(Gesture::Shape(shape)) => Some(shape),
            _ => None,
        };
        let frame = Frame {
            scene: &self.scene,
            preview,
            viewport: &self.viewport,
            selection: self.selection.as_ref(),
            config: &self.config,
            show_grid: self.show_grid,
        };
        render::full_repaint(canvas, &frame, &mut self.media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeKind, StrokeTool};

    fn session() -> Session {
        Session::new(BoardConfig::default(), "t")
    }

    #[test]
    fn single_point_stroke_commits_nothing() {
        let mut session = session();
        assert_eq!(session.begin_gesture(Point::new(1.0, 1.0)), GestureStart::Stroke);
        assert!(!session.end_gesture());
        assert!(session.scene().elements.is_empty());
        assert_eq!(session.history().undo_len(), 0);
        assert!(session.gesture().is_none());
    }

    #[test]
    fn zero_length_shape_still_commits() {
        let mut session = session();
        session.set_tool(Tool::Shape(ShapeKind::Rectangle));
        assert_eq!(session.begin_gesture(Point::new(4.0, 4.0)), GestureStart::Shape);
        assert!(session.end_gesture());
        assert_eq!(session.scene().elements.len(), 1);
        assert_eq!(session.history().undo_len(), 1);
    }

    #[test]
    fn shape_drag_moves_only_the_end() {
        let mut session = session();
        session.set_tool(Tool::Shape(ShapeKind::Arrow));
        session.begin_gesture(Point::new(0.0, 0.0));
        assert_eq!(
            session.extend_gesture(Point::new(30.0, 40.0)),
            GestureUpdate::ShapeResized
        );
        let Some(Gesture::Shape(shape)) = session.gesture() else {
            panic!("expected an open shape");
        };
        assert_eq!(shape.start, Some(Point::new(0.0, 0.0)));
        assert_eq!(shape.end, Some(Point::new(30.0, 40.0)));
    }

    #[test]
    fn sticky_note_tool_creates_and_selects_without_history() {
        let mut session = session();
        session.set_tool(Tool::StickyNote);
        let GestureStart::NoteCreated(id) = session.begin_gesture(Point::new(50.0, 60.0)) else {
            panic!("expected a note");
        };
        assert_eq!(session.selection(), Some(&id));
        let note = session.scene().note(&id).unwrap();
        assert_eq!((note.width, note.height, note.font_size), (200.0, 150.0, 14.0));
        assert_eq!(note.color, "#ffd700");
        assert!(session.gesture().is_none());
        assert_eq!(session.history().undo_len(), 0);
    }

    #[test]
    fn select_prefers_notes_over_media() {
        let mut session = session();
        let media = session
            .add_media(IncomingFile {
                name: "cat.png".into(),
                mime: "image/png".into(),
                data: "data:image/png;base64,AAAA".into(),
            })
            .unwrap();
        session.set_tool(Tool::StickyNote);
        let GestureStart::NoteCreated(note) = session.begin_gesture(Point::new(150.0, 150.0))
        else {
            panic!("expected a note");
        };

        session.set_tool(Tool::Select);
        assert_eq!(
            session.begin_gesture(Point::new(160.0, 160.0)),
            GestureStart::Selected(Some(note))
        );
        assert_eq!(
            session.begin_gesture(Point::new(100.0, 300.0)),
            GestureStart::Selected(Some(media))
        );
        assert_eq!(
            session.begin_gesture(Point::new(-5.0, -5.0)),
            GestureStart::Selected(None)
        );
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn note_patch_is_clamped() {
        let mut session = session();
        session.set_tool(Tool::StickyNote);
        let GestureStart::NoteCreated(id) = session.begin_gesture(Point::new(0.0, 0.0)) else {
            panic!("expected a note");
        };
        assert!(session.mutate_note(
            &id,
            NotePatch {
                text: Some("hello".into()),
                font_size: Some(500.0),
                width: Some(2.0),
                x: Some(f64::NAN),
                ..NotePatch::default()
            }
        ));
        let note = session.scene().note(&id).unwrap();
        assert_eq!(note.text, "hello");
        assert_eq!(note.font_size, 72.0);
        assert_eq!(note.width, 20.0);
        assert_eq!(note.x, 0.0);

        assert!(session.delete_note(&id));
        assert!(session.selection().is_none());
        assert!(!session.delete_note(&id));
        assert!(!session.mutate_note(&id, NotePatch::default()));
    }

    #[test]
    fn unsupported_files_are_skipped() {
        let mut session = session();
        let added = session.add_media_files([
            IncomingFile {
                name: "notes.txt".into(),
                mime: "text/plain".into(),
                data: "data:text/plain;base64,aGk=".into(),
            },
            IncomingFile {
                name: "doc.pdf".into(),
                mime: "application/pdf".into(),
                data: "data:application/pdf;base64,JVBERi0=".into(),
            },
        ]);
        assert_eq!(added.len(), 1);
        assert_eq!(session.history().undo_len(), 1);
        let item = session.scene().media().next().unwrap();
        assert_eq!((item.x, item.y, item.width, item.height), (100.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn brush_is_clamped() {
        let mut session = session();
        session.set_brush("#ff0000", 1000.0, 0.0);
        assert_eq!(session.brush().size, 100.0);
        assert_eq!(session.brush().opacity, 0.1);
        session.set_brush("", 5.0, 0.5);
        assert_eq!(session.brush().color, "#ff0000");
    }

    #[test]
    fn undo_drops_a_selection_that_no_longer_exists() {
        let mut session = session();
        session.set_tool(Tool::Stroke(StrokeTool::Pen));
        session.begin_gesture(Point::new(0.0, 0.0));
        session.extend_gesture(Point::new(1.0, 1.0));
        session.end_gesture();
        let id = session
            .add_media(IncomingFile {
                name: "a.png".into(),
                mime: "image/png".into(),
                data: "data:image/png;base64,AAAA".into(),
            })
            .unwrap();
        session.select(Some(id));
        assert!(session.undo());
        assert!(session.selection().is_none());
    }

    #[test]
    fn fit_needs_content_and_a_surface() {
        let mut session = session();
        session.set_surface_size(800.0, 600.0);
        assert!(!session.fit_to_content());
        session.set_tool(Tool::StickyNote);
        session.begin_gesture(Point::new(0.0, 0.0));
        assert!(session.fit_to_content());
        assert_eq!(session.viewport().zoom, 2.0);
    }

    #[test]
    fn button_zoom_keeps_the_surface_center_and_status_reports_it() {
        let mut session = session();
        session.set_surface_size(800.0, 600.0);
        let center = Point::new(400.0, 300.0);
        let world = session.viewport().screen_to_world(center);
        session.zoom_in();
        assert_eq!(session.status().zoom_percent, 120);
        let back = session.viewport().world_to_screen(world);
        assert!((back.x - center.x).abs() < 1e-9 && (back.y - center.y).abs() < 1e-9);

        session.zoom_out();
        assert_eq!(session.status().zoom_percent, 100);
        session.viewport_mut().pan = Point::new(7.0, 8.0);
        session.zoom_in();
        session.reset_zoom();
        assert_eq!(session.viewport().zoom, 1.0);
        assert_ne!(session.viewport().pan, Point::new(0.0, 0.0));
        session.reset_view();
        assert_eq!(session.viewport().pan, Point::new(0.0, 0.0));

        assert!(!session.toggle_grid());
        assert!(session.toggle_pan_mode());
        let status = session.status();
        assert_eq!((status.item_count, status.can_undo, status.can_redo), (0, false, false));
    }

    #[test]
    fn hit_test_counts_the_far_edges() {
        let mut session = session();
        let id = session
            .add_media(IncomingFile {
                name: "edge.png".into(),
                mime: "image/png".into(),
                data: "data:image/png;base64,AAAA".into(),
            })
            .unwrap();
        assert_eq!(session.hit_test(Point::new(400.0, 300.0)), Some(id.clone()));
        assert_eq!(session.hit_test(Point::new(100.0, 100.0)), Some(id));
        assert_eq!(session.hit_test(Point::new(400.5, 300.0)), None);
        assert_eq!(session.hit_test(Point::new(400.0, 300.5)), None);
    }

    #[test]
    fn undo_keeps_a_selected_note_but_restores_its_fields() {
        let mut session = session();
        session.set_tool(Tool::StickyNote);
        let GestureStart::NoteCreated(id) = session.begin_gesture(Point::new(10.0, 10.0)) else {
            panic!("expected a note");
        };
        session.set_tool(Tool::Stroke(StrokeTool::Pen));
        session.begin_gesture(Point::new(0.0, 0.0));
        session.extend_gesture(Point::new(5.0, 5.0));
        assert!(session.end_gesture());
        assert!(session.mutate_note(
            &id,
            NotePatch {
                text: Some("hello".into()),
                ..NotePatch::default()
            }
        ));
        let before = session.restores();

        assert!(session.undo());
        assert_eq!(session.selection(), Some(&id));
        assert_eq!(session.scene().note(&id).unwrap().text, "New note...");
        assert_eq!(session.restores(), before + 1);

        assert!(session.redo());
        assert_eq!(session.restores(), before + 2);
        assert!(!session.redo());
        assert_eq!(session.restores(), before + 2);
    }

    #[test]
    fn corrupt_payload_is_not_committed() {
        let mut session = session();
        let added = session.add_media(IncomingFile {
            name: "broken.png".into(),
            mime: "image/png".into(),
            data: "data:image/png;base64,@@@@".into(),
        });
        assert_eq!(added, Err(BoardError::InvalidDataUrl));
        assert!(session.scene().elements.is_empty());
        assert_eq!(session.history().undo_len(), 0);
    }
}
