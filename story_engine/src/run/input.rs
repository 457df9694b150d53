//! Player inputs and the transitions they produce.

use serde::{Deserialize, Serialize};
use story_graph::ScreenId;

use crate::events::RunEvent;
use crate::grading::GradeResult;

/// Everything a player can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "input", content = "option", rename_all = "snake_case")]
pub enum Input {
    /// Advance past a dialogue or learning screen.
    Continue,
    /// Pick an option on a choice or boss screen.
    Choose(usize),
    /// Go back to a boss question after a wrong answer.
    Retry,
    /// Ask for a hint on a choice or boss screen.
    Hint,
}

/// What a successful input did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub input: Input,

    /// Screen the run was on when the input arrived.
    pub from: ScreenId,

    /// Screen the run is on now.
    pub to: ScreenId,

    /// Set for `Choose` inputs.
    pub grade: Option<GradeResult>,

    /// Feedback of the chosen option, shown before the next screen.
    pub feedback: Option<String>,

    /// Hint text for `Hint` inputs, when the screen has one.
    pub hint: Option<String>,

    pub events: Vec<RunEvent>,
}

impl Transition {
    pub(crate) fn new(input: Input, from: ScreenId) -> Self {
        Self {
            input,
            from,
            to: from,
            grade: None,
            feedback: None,
            hint: None,
            events: Vec::new(),
        }
    }

    /// Whether the run changed screens.
    pub fn moved(&self) -> bool {
        self.from != self.to
    }

    /// Fundamentals learned during this transition.
    pub fn learned(&self) -> impl Iterator<Item = u8> + '_ {
        self.events.iter().filter_map(|event| match event {
            RunEvent::FundamentalLearned { fundamental, .. } => Some(*fundamental),
            _ => None,
        })
    }
}
