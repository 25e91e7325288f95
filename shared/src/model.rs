use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Freehand tools. Each one renders its point sequence differently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeTool {
    Pen,
    Pencil,
    Marker,
    Eraser,
}

impl StrokeTool {
    /// Pen and pencil strokes are smoothed through segment midpoints.
    pub fn is_smoothed(self) -> bool {
        matches!(self, StrokeTool::Pen | StrokeTool::Pencil)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Arrow,
    Triangle,
    Star,
    Heart,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Ellipse,
        ShapeKind::Line,
        ShapeKind::Arrow,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Heart,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Select,
    StickyNote,
    Stroke(StrokeTool),
    Shape(ShapeKind),
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Stroke(StrokeTool::Pen)
    }
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::StickyNote => "sticky-note",
            Tool::Stroke(StrokeTool::Pen) => "pen",
            Tool::Stroke(StrokeTool::Pencil) => "pencil",
            Tool::Stroke(StrokeTool::Marker) => "marker",
            Tool::Stroke(StrokeTool::Eraser) => "eraser",
            Tool::Shape(ShapeKind::Rectangle) => "rectangle",
            Tool::Shape(ShapeKind::Circle) => "circle",
            Tool::Shape(ShapeKind::Ellipse) => "ellipse",
            Tool::Shape(ShapeKind::Line) => "line",
            Tool::Shape(ShapeKind::Arrow) => "arrow",
            Tool::Shape(ShapeKind::Triangle) => "triangle",
            Tool::Shape(ShapeKind::Star) => "star",
            Tool::Shape(ShapeKind::Heart) => "heart",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = BoardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tool = match value.trim() {
            "select" | "seç" => Tool::Select,
            "sticky-note" | "yapışkan-not" => Tool::StickyNote,
            "pen" | "kalem" => Tool::Stroke(StrokeTool::Pen),
            "pencil" | "kurşun" => Tool::Stroke(StrokeTool::Pencil),
            "marker" => Tool::Stroke(StrokeTool::Marker),
            "eraser" | "silgi" => Tool::Stroke(StrokeTool::Eraser),
            "rectangle" | "dikdörtgen" => Tool::Shape(ShapeKind::Rectangle),
            "circle" | "daire" => Tool::Shape(ShapeKind::Circle),
            "ellipse" | "elips" => Tool::Shape(ShapeKind::Ellipse),
            "line" | "çizgi" => Tool::Shape(ShapeKind::Line),
            "arrow" | "ok" => Tool::Shape(ShapeKind::Arrow),
            "triangle" | "üçgen" => Tool::Shape(ShapeKind::Triangle),
            "star" | "yıldız" => Tool::Shape(ShapeKind::Star),
            "heart" | "kalp" => Tool::Shape(ShapeKind::Heart),
            other => return Err(BoardError::UnknownTool(other.to_string())),
        };
        Ok(tool)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Stroke {
    pub tool: StrokeTool,
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    pub points: Vec<Point>,
}

/// A parametric shape spanned by a drag from `start` to `end`.
///
/// Both endpoints are optional so that a malformed descriptor can still be
/// handed to the rasterizer, which then draws nothing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub start: Option<Point>,
    pub end: Option<Point>,
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Shape {
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StickyNote {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub color: String,
    pub font_size: f64,
}

impl StickyNote {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.x, self.y, self.width, self.height)
    }
}

/// Partial update applied by the note editor.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NotePatch {
    pub text: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Pdf,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MediaElement {
    pub id: ElementId,
    pub kind: MediaKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Inline `data:` URL holding the whole payload.
    pub data: String,
    pub name: String,
}

impl MediaElement {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.x, self.y, self.width, self.height)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Stroke(Stroke),
    Shape(Shape),
    Media(MediaElement),
}

impl Element {
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Element::Stroke(stroke) => Bounds::around(stroke.points.iter().copied()),
            Element::Shape(shape) => {
                let (start, end) = shape.endpoints()?;
                Bounds::around([start, end])
            }
            Element::Media(media) => Some(media.bounds()),
        }
    }
}

/// Committed board content. Elements draw in list order, notes after all
/// elements.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub elements: Vec<Element>,
    pub notes: Vec<StickyNote>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len() + self.notes.len()
    }

    pub fn note(&self, id: &ElementId) -> Option<&StickyNote> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn note_mut(&mut self, id: &ElementId) -> Option<&mut StickyNote> {
        self.notes.iter_mut().find(|note| &note.id == id)
    }

    pub fn media(&self) -> impl Iterator<Item = &MediaElement> {
        self.elements.iter().filter_map(|element| match element {
            Element::Media(media) => Some(media),
            _ => None,
        })
    }

    pub fn content_bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        let parts = self
            .elements
            .iter()
            .filter_map(Element::bounds)
            .chain(self.notes.iter().map(StickyNote::bounds));
        for part in parts {
            bounds = Some(match bounds {
                Some(current) => current.union(&part),
                None => part,
            });
        }
        bounds
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn around(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for point in points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        if min_x == f64::MAX {
            None
        } else {
            Some(Self {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        }
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Closed-interval containment, edges count as inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip_and_accept_aliases() {
        for kind in ShapeKind::ALL {
            let tool = Tool::Shape(kind);
            assert_eq!(tool.name().parse::<Tool>(), Ok(tool));
        }
        assert_eq!("kalem".parse::<Tool>(), Ok(Tool::Stroke(StrokeTool::Pen)));
        assert_eq!("silgi".parse::<Tool>(), Ok(Tool::Stroke(StrokeTool::Eraser)));
        assert_eq!("yapışkan-not".parse::<Tool>(), Ok(Tool::StickyNote));
        assert_eq!(
            "brush".parse::<Tool>(),
            Err(BoardError::UnknownTool("brush".to_string()))
        );
    }

    #[test]
    fn content_bounds_cover_elements_and_notes() {
        let scene = Scene {
            elements: vec![
                Element::Stroke(Stroke {
                    tool: StrokeTool::Pen,
                    color: "#000".into(),
                    width: 3.0,
                    opacity: 1.0,
                    points: vec![Point::new(-10.0, 5.0), Point::new(20.0, 15.0)],
                }),
                Element::Shape(Shape {
                    kind: ShapeKind::Line,
                    start: Some(Point::new(0.0, 0.0)),
                    end: None,
                    color: "#000".into(),
                    width: 3.0,
                    opacity: 1.0,
                }),
            ],
            notes: vec![StickyNote {
                id: ElementId::new("n"),
                x: 100.0,
                y: 100.0,
                width: 200.0,
                height: 150.0,
                text: String::new(),
                color: "#ffd700".into(),
                font_size: 14.0,
            }],
        };
        let bounds = scene.content_bounds().unwrap();
        assert_eq!(bounds.min_x, -10.0);
        assert_eq!(bounds.min_y, 5.0);
        assert_eq!(bounds.max_x, 300.0);
        assert_eq!(bounds.max_y, 250.0);
        assert!(Scene::default().content_bounds().is_none());
    }

    #[test]
    fn elements_serialize_with_an_explicit_type_tag() {
        let element = Element::Shape(Shape {
            kind: ShapeKind::Star,
            start: Some(Point::new(1.0, 2.0)),
            end: Some(Point::new(3.0, 4.0)),
            color: "#f00".into(),
            width: 2.0,
            opacity: 0.5,
        });
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "shape");
        assert_eq!(json["kind"], "star");
        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, element);
    }
}
