use std::collections::VecDeque;

use crate::model::Scene;

/// Linear undo/redo over whole-scene snapshots.
///
/// `undo` holds past scenes with the most recent last, `redo` holds future
/// scenes with the most recent first.
#[derive(Clone, Debug, Default)]
pub struct History {
    undo: Vec<Scene>,
    redo: VecDeque<Scene>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the scene as it was before a committing mutation. Redo
    /// history is always dropped.
    pub fn commit(&mut self, before: Scene) {
        self.undo.push(before);
        self.redo.clear();
    }

    /// Swaps `live` with the latest past snapshot. Returns false when there
    /// is nothing to undo.
    pub fn undo(&mut self, live: &mut Scene) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = std::mem::replace(live, previous);
        self.redo.push_front(current);
        true
    }

    pub fn redo(&mut self, live: &mut Scene) -> bool {
        let Some(next) = self.redo.pop_front() else {
            return false;
        };
        let current = std::mem::replace(live, next);
        self.undo.push(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn undo_stack(&self) -> &[Scene] {
        &self.undo
    }

    pub fn redo_stack(&self) -> impl Iterator<Item = &Scene> {
        self.redo.iter()
    }
}
