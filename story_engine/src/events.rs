//! Run events - what a single transition did.
//!
//! Events are emitted in the order they happened and are meant for the host:
//! renderers use them to pick feedback and celebrations, audio layers to cue
//! voice lines, loggers to trace a session. The engine never reads them back.

use serde::{Deserialize, Serialize};
use story_graph::{ScreenId, ScreenKind};

use crate::grading::GradeResult;
use crate::run::Outcome;

/// Events emitted by the run state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// The run moved onto a screen.
    ScreenEntered {
        screen: ScreenId,
        kind: ScreenKind,
        chapter: u32,
    },

    /// The run crossed into a new chapter.
    ChapterEntered { chapter: u32 },

    /// A learning screen taught a fundamental for the first time.
    FundamentalLearned { fundamental: u8, screen: ScreenId },

    /// An option was chosen and graded.
    AnswerGraded {
        screen: ScreenId,
        option: usize,
        grade: GradeResult,
    },

    /// A wrong boss answer; the same question can be answered again.
    RetryOffered { screen: ScreenId },

    /// The player went back to the boss question.
    RetryStarted { screen: ScreenId },

    /// The player asked for a hint.
    HintRequested { screen: ScreenId, available: bool },

    /// The run reached a final outcome.
    RunEnded { outcome: Outcome },
}

impl RunEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::ScreenEntered { .. } => "screen_entered",
            RunEvent::ChapterEntered { .. } => "chapter_entered",
            RunEvent::FundamentalLearned { .. } => "fundamental_learned",
            RunEvent::AnswerGraded { .. } => "answer_graded",
            RunEvent::RetryOffered { .. } => "retry_offered",
            RunEvent::RetryStarted { .. } => "retry_started",
            RunEvent::HintRequested { .. } => "hint_requested",
            RunEvent::RunEnded { .. } => "run_ended",
        }
    }

    /// The screen this event is about, if any.
    pub fn screen(&self) -> Option<ScreenId> {
        match self {
            RunEvent::ScreenEntered { screen, .. }
            | RunEvent::FundamentalLearned { screen, .. }
            | RunEvent::AnswerGraded { screen, .. }
            | RunEvent::RetryOffered { screen }
            | RunEvent::RetryStarted { screen }
            | RunEvent::HintRequested { screen, .. } => Some(*screen),
            RunEvent::ChapterEntered { .. } | RunEvent::RunEnded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_screen() {
        let event = RunEvent::RetryOffered { screen: ScreenId(19) };
        assert_eq!(event.screen(), Some(ScreenId(19)));
        assert_eq!(event.name(), "retry_offered");

        let ended = RunEvent::RunEnded {
            outcome: Outcome::Completed,
        };
        assert_eq!(ended.screen(), None);
    }

    #[test]
    fn test_event_json_shape() {
        let event = RunEvent::FundamentalLearned {
            fundamental: 7,
            screen: ScreenId(32),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "fundamental_learned");
        assert_eq!(json["fundamental"], 7);
        assert_eq!(json["screen"], 32);
    }
}
