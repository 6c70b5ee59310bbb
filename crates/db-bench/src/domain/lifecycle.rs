//! # Bench Handle Lifecycle
//!
//! ```text
//! Created ──fill/reset/op──→ Running ──finish──→ Finished ──stop──→ Stopped
//!    │                                              ↑
//!    └──────────────────finish──────────────────────┘
//! ```
//!
//! `finish` is accepted once. The dispatcher's implicit finish checks
//! `is_finished` first, so an explicit finish in the body is never repeated.

/// State of a bench handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Constructed; the clock is running but nothing has been issued yet.
    Created,
    /// The body is issuing operations.
    Running,
    /// Timing closed and summary printed.
    Finished,
    /// Engine released. Terminal.
    Stopped,
}

impl HandleState {
    /// Whether operations may still be recorded.
    pub fn accepts_ops(self) -> bool {
        matches!(self, HandleState::Created | HandleState::Running)
    }

    /// Whether the timing window has closed.
    pub fn is_finished(self) -> bool {
        matches!(self, HandleState::Finished | HandleState::Stopped)
    }

    /// State after the body touches the handle.
    pub fn on_activity(self) -> HandleState {
        match self {
            HandleState::Created => HandleState::Running,
            other => other,
        }
    }

    /// State after `finish`, or `None` if finishing now is invalid.
    pub fn on_finish(self) -> Option<HandleState> {
        if self.accepts_ops() {
            Some(HandleState::Finished)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_moves_created_to_running() {
        assert_eq!(HandleState::Created.on_activity(), HandleState::Running);
        assert_eq!(HandleState::Running.on_activity(), HandleState::Running);
        assert_eq!(HandleState::Finished.on_activity(), HandleState::Finished);
    }

    #[test]
    fn test_finish_allowed_once() {
        assert_eq!(HandleState::Created.on_finish(), Some(HandleState::Finished));
        assert_eq!(HandleState::Running.on_finish(), Some(HandleState::Finished));
        assert_eq!(HandleState::Finished.on_finish(), None);
        assert_eq!(HandleState::Stopped.on_finish(), None);
    }

    #[test]
    fn test_finished_states() {
        assert!(!HandleState::Created.is_finished());
        assert!(!HandleState::Running.is_finished());
        assert!(HandleState::Finished.is_finished());
        assert!(HandleState::Stopped.is_finished());
        assert!(!HandleState::Finished.accepts_ops());
    }
}
