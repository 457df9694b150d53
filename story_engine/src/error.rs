//! Error types for driving a run.

use story_graph::{ScreenId, StoryError};
use thiserror::Error;

use crate::run::{Input, Outcome};

/// Errors returned by [`Run::apply_input`](crate::Run::apply_input) and friends.
///
/// Every variant except the story-data ones is recoverable: the run is left
/// exactly as it was before the call.
#[derive(Debug, Error)]
pub enum RunError {
    /// Story data references a screen that does not exist.
    #[error("unknown screen id {0}")]
    UnknownScreenId(ScreenId),

    /// Any other story-store failure.
    #[error(transparent)]
    Story(StoryError),

    /// The chosen option index is out of range for the current screen.
    #[error("option index {index} out of range, screen has {len} option(s)")]
    InvalidOptionIndex { index: usize, len: usize },

    /// The run already ended.
    #[error("run has ended ({outcome:?}), start a new run")]
    InputOnEndedRun { outcome: Outcome },

    /// The input does not apply in the current state.
    #[error("input {input:?} is not accepted while {state}")]
    InputMismatch { input: Input, state: &'static str },

    /// A saved run does not fit the story it is resumed against.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl RunError {
    pub fn mismatch(input: Input, state: &'static str) -> Self {
        Self::InputMismatch { input, state }
    }

    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    /// Whether the error means the story data itself is broken.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::UnknownScreenId(_) | RunError::Story(_))
    }
}

impl From<StoryError> for RunError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::UnknownScreenId(id) => Self::UnknownScreenId(id),
            other => Self::Story(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_screen_is_fatal() {
        let err = RunError::from(StoryError::UnknownScreenId(ScreenId(3)));
        assert!(matches!(err, RunError::UnknownScreenId(ScreenId(3))));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_contract_errors_are_recoverable() {
        assert!(!RunError::InvalidOptionIndex { index: 5, len: 3 }.is_fatal());
        assert!(!RunError::mismatch(Input::Retry, "active").is_fatal());
        assert!(!RunError::InputOnEndedRun {
            outcome: Outcome::Completed
        }
        .is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = RunError::InvalidOptionIndex { index: 5, len: 3 };
        assert_eq!(err.to_string(), "option index 5 out of range, screen has 3 option(s)");

        let err = RunError::mismatch(Input::Choose(1), "awaiting retry");
        assert_eq!(err.to_string(), "input Choose(1) is not accepted while awaiting retry");
    }
}
