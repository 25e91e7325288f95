use tracing::trace;

use crate::canvas::Canvas;
use crate::model::Point;
use crate::render::{self, RepaintReport};
use crate::session::{GestureStart, GestureUpdate, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

impl Button {
    /// Maps `MouseEvent.button` numbering.
    pub fn from_dom(button: i16) -> Option<Button> {
        match button {
            0 => Some(Button::Primary),
            1 => Some(Button::Middle),
            2 => Some(Button::Secondary),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDown {
    /// Position relative to the surface's top-left corner.
    pub screen: Point,
    pub button: Button,
    pub alt_key: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InputState {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    DrawingStroke,
    DrawingShape,
}

/// What the host has to do after an input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    None,
    Repaint,
    /// Draw only this world-space segment of the open stroke.
    LiveSegment { from: Point, to: Point },
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// A text field owns the keyboard.
    pub text_focus: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    /// The host confirms with the user before dispatching.
    ClearAll,
    Export,
    ResetView,
    ClearSelection,
}

pub fn shortcut_for(input: &KeyInput) -> Option<Shortcut> {
    if input.text_focus {
        return None;
    }
    if input.ctrl || input.meta {
        let key = input.key.to_lowercase();
        return match key.as_str() {
            "z" if input.shift => Some(Shortcut::Redo),
            "z" => Some(Shortcut::Undo),
            "y" => Some(Shortcut::Redo),
            "delete" => Some(Shortcut::ClearAll),
            "s" => Some(Shortcut::Export),
            _ => None,
        };
    }
    match input.key.as_str() {
        "Home" => Some(Shortcut::ResetView),
        "Escape" => Some(Shortcut::ClearSelection),
        _ => None,
    }
}

/// Pointer state machine driving a [`Session`].
pub struct Controller {
    session: Session,
    state: InputState,
}

impl Controller {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: InputState::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn pointer_down(&mut self, input: PointerDown) -> Action {
        if self.state != InputState::Idle {
            return Action::None;
        }
        let pan = input.button == Button::Middle
            || (input.button == Button::Primary && input.alt_key)
            || self.session.pan_mode();
        if pan {
            self.state = InputState::Panning { last: input.screen };
            return Action::None;
        }
        if input.button != Button::Primary {
            return Action::None;
        }

        let world = self.session.viewport().screen_to_world(input.screen);
        if !world.is_finite() {
            return Action::None;
        }
        match self.session.begin_gesture(world) {
            GestureStart::Stroke => {
                self.state = InputState::DrawingStroke;
                Action::None
            }
            GestureStart::Shape => {
                self.state = InputState::DrawingShape;
                Action::Repaint
            }
            GestureStart::NoteCreated(_) | GestureStart::Selected(_) => Action::Repaint,
        }
    }

    pub fn pointer_move(&mut self, screen: Point) -> Action {
        match self.state {
            InputState::Idle => Action::None,
            InputState::Panning { last } => {
                self.session
                    .viewport_mut()
                    .pan_by_screen(screen.x - last.x, screen.y - last.y);
                self.state = InputState::Panning { last: screen };
                Action::Repaint
            }
            InputState::DrawingStroke | InputState::DrawingShape => {
                let world = self.session.viewport().screen_to_world(screen);
                if !world.is_finite() {
                    return Action::None;
                }
                match self.session.extend_gesture(world) {
                    GestureUpdate::Segment { from, to } => {
                        trace!(x = to.x, y = to.y, "stroke point");
                        Action::LiveSegment { from, to }
                    }
                    GestureUpdate::ShapeResized => Action::Repaint,
                    GestureUpdate::Ignored => Action::None,
                }
            }
        }
    }

    /// Pointer released or left the surface.
    pub fn pointer_up(&mut self) -> Action {
        match std::mem::take(&mut self.state) {
            InputState::Idle => Action::None,
            InputState::Panning { .. } => Action::None,
            InputState::DrawingStroke | InputState::DrawingShape => {
                self.session.end_gesture();
                Action::Repaint
            }
        }
    }

    pub fn wheel(&mut self, screen: Point, delta_y: f64) -> Action {
        self.session.wheel_zoom(screen, delta_y);
        Action::Repaint
    }

    pub fn shortcut(&mut self, shortcut: Shortcut) -> Action {
        let changed = match shortcut {
            Shortcut::Undo => self.session.undo(),
            Shortcut::Redo => self.session.redo(),
            Shortcut::ClearAll => {
                self.session.clear_all();
                true
            }
            Shortcut::ResetView => {
                self.session.reset_view();
                true
            }
            Shortcut::ClearSelection => {
                let had = self.session.selection().is_some();
                self.session.select(None);
                had
            }
            Shortcut::Export => false,
        };
        if changed {
            Action::Repaint
        } else {
            Action::None
        }
    }

    /// Carries out an [`Action`] on the surface.
    pub fn perform<C: Canvas>(&mut self, canvas: &mut C, action: Action) -> RepaintReport {
        match action {
            Action::None => RepaintReport::default(),
            Action::Repaint => self.session.repaint(canvas),
            Action::LiveSegment { from, to } => {
                if let Some(style) = self.session.live_stroke_style() {
                    render::live_preview_segment(
                        canvas,
                        self.session.viewport(),
                        &style,
                        from,
                        to,
                    );
                }
                RepaintReport::default()
            }
        }
    }
}
