//! Grading - deciding what a chosen option does.
//!
//! Grading is pure: it looks only at the screen and the option. The run
//! applies the result (and the attempt counter) afterwards.
//!
//! | Screen | Option      | `on_failure` | Result         |
//! |--------|-------------|--------------|----------------|
//! | any    | progressing | -            | `Advance`      |
//! | Boss   | game_over   | `Retry`      | `Retry`        |
//! | Boss   | game_over   | `GameOver`   | `TerminalFail` |
//! | Choice | game_over   | -            | `Advance`      |

use serde::{Deserialize, Serialize};
use story_graph::{ChoiceOption, FailureMode, Screen, ScreenBody, ScreenKind};

/// Outcome of grading one chosen option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeResult {
    /// Follow the option's target.
    Advance,
    /// Wrong boss answer; stay on the question.
    Retry,
    /// Wrong answer on a boss that ends the run.
    TerminalFail,
}

impl GradeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GradeResult::Advance)
    }
}

/// Grade `option` as chosen on `screen`.
pub fn grade(screen: &Screen, option: &ChoiceOption) -> GradeResult {
    if option.is_correct() {
        return GradeResult::Advance;
    }
    match &screen.body {
        ScreenBody::Boss(body) => match body.on_failure {
            FailureMode::Retry => GradeResult::Retry,
            FailureMode::GameOver => GradeResult::TerminalFail,
        },
        // Narrative choices only differ in flavour text; they never gate progress.
        ScreenBody::Choice(_) | ScreenBody::Dialogue(_) | ScreenBody::Learning(_) => {
            GradeResult::Advance
        }
    }
}

/// Whether choosing on this screen counts towards the run's attempts.
pub fn counts_attempt(screen: &Screen) -> bool {
    screen.kind() == ScreenKind::Boss
}
