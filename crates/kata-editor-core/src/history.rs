//! Snapshot undo/redo over the statement HTML.
//!
//! Both edit modes write the same HTML string, so one history covers rich
//! and plain-HTML edits alike.

/// Bounded undo/redo stacks of previous HTML strings.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state being replaced by an edit.
    pub fn record(&mut self, previous: String) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(previous);
        if self.undo_stack.len() > self.max_steps {
            let excess = self.undo_stack.len() - self.max_steps;
            self.undo_stack.drain(..excess);
        }
    }

    /// Step back from `current`. Returns the state to restore.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward from `current`. Returns the state to restore.
    pub fn redo(&mut self, current: String) -> Option<String> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(10);
        history.record("a".into());
        history.record("b".into());

        assert_eq!(history.undo("c".into()).as_deref(), Some("b"));
        assert_eq!(history.undo("b".into()).as_deref(), Some("a"));
        assert_eq!(history.undo("a".into()), None);
        assert_eq!(history.redo("a".into()).as_deref(), Some("b"));
        assert_eq!(history.redo("b".into()).as_deref(), Some("c"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new(10);
        history.record("a".into());
        history.undo("b".into());
        assert!(history.can_redo());
        history.record("a".into());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(2);
        for state in ["a", "b", "c"] {
            history.record(state.into());
        }
        assert_eq!(history.undo("d".into()).as_deref(), Some("c"));
        assert_eq!(history.undo("c".into()).as_deref(), Some("b"));
        assert_eq!(history.undo("b".into()), None);
    }
}
