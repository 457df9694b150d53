//! Run - one player's progress through a story, and the state machine that
//! advances it.
//!
//! ```text
//!            continue / correct choose
//!   Active(id) ─────────────────────────▶ Active(next) ──▶ ... ──▶ Ended(Completed)
//!      │  ▲
//!  wrong│  │retry
//!  boss ▼  │
//!   AwaitingRetry(id)
//! ```
//!
//! A run is applied one input at a time. Each input either fully applies or
//! returns an error and leaves the run as it was.

mod input;

pub use input::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use story_graph::{Next, OptionTarget, Screen, ScreenId, StoryStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::RunError;
use crate::events::RunEvent;
use crate::grading::{counts_attempt, grade, GradeResult};
use crate::progress::ProgressSummary;

/// Unique identifier for runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// A fixed ID, for reproducible runs.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Completed,
    GameOver,
}

/// Coarse run status for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    InProgress,
    GameOver,
    Completed,
}

impl From<Ending> for Outcome {
    fn from(ending: Ending) -> Self {
        match ending {
            Ending::Completed => Outcome::Completed,
            Ending::GameOver => Outcome::GameOver,
        }
    }
}

/// Where the run is in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Waiting for input on a screen.
    Active { screen: ScreenId },
    /// A boss question was answered wrong; waiting for `Retry`.
    AwaitingRetry { screen: ScreenId },
    /// No further input is accepted. `screen` is the last screen shown.
    Ended { ending: Ending, screen: ScreenId },
}

impl RunState {
    pub fn screen(&self) -> ScreenId {
        match self {
            RunState::Active { screen }
            | RunState::AwaitingRetry { screen }
            | RunState::Ended { screen, .. } => *screen,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            RunState::Active { .. } | RunState::AwaitingRetry { .. } => Outcome::InProgress,
            RunState::Ended { ending, .. } => (*ending).into(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            RunState::Active { .. } => "active",
            RunState::AwaitingRetry { .. } => "awaiting retry",
            RunState::Ended { .. } => "ended",
        }
    }
}

/// One player's play-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub(crate) id: RunId,
    pub(crate) state: RunState,
    pub(crate) visited_fundamentals: BTreeSet<u8>,
    /// Boss answers given, right or wrong.
    pub(crate) attempts: u32,
    pub(crate) hints_used: u32,
}

impl Run {
    /// Start a run on the story's start screen.
    pub fn new(store: &StoryStore) -> Result<Self, RunError> {
        Self::with_id(store, RunId::new())
    }

    /// Start a run with a caller-chosen id.
    pub fn with_id(store: &StoryStore, id: RunId) -> Result<Self, RunError> {
        let start = store.start();
        let screen = store.screen(start)?;

        let mut run = Self {
            id,
            state: RunState::Active { screen: start },
            visited_fundamentals: BTreeSet::new(),
            attempts: 0,
            hints_used: 0,
        };
        if let Some(fundamental) = screen.fundamental() {
            run.visited_fundamentals.insert(fundamental);
        }

        info!(target: "story_engine", run_id = %id, start = %start, story = store.title(), "run started");
        Ok(run)
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn current_screen_id(&self) -> ScreenId {
        self.state.screen()
    }

    /// The screen the renderer should show.
    pub fn current_screen<'a>(&self, store: &'a StoryStore) -> Result<&'a Screen, RunError> {
        Ok(store.screen(self.current_screen_id())?)
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, RunState::Ended { .. })
    }

    pub fn visited_fundamentals(&self) -> &BTreeSet<u8> {
        &self.visited_fundamentals
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Read-only progress view for display.
    pub fn progress(&self, store: &StoryStore) -> Result<ProgressSummary, RunError> {
        ProgressSummary::derive(self, store)
    }

    /// Apply one input.
    ///
    /// On error the run is unchanged.
    pub fn apply_input(&mut self, store: &StoryStore, input: Input) -> Result<Transition, RunError> {
        let mut next = self.clone();
        let transition = next.step(store, input)?;
        *self = next;

        debug!(
            target: "story_engine",
            run_id = %self.id,
            input = ?input,
            from = %transition.from,
            to = %transition.to,
            grade = ?transition.grade,
            state = self.state.describe(),
            "input applied"
        );
        Ok(transition)
    }

    fn step(&mut self, store: &StoryStore, input: Input) -> Result<Transition, RunError> {
        let from = self.current_screen_id();
        let mut transition = Transition::new(input, from);

        match (self.state, input) {
            (RunState::Ended { ending, .. }, _) => {
                return Err(RunError::InputOnEndedRun {
                    outcome: ending.into(),
                });
            }

            (RunState::Active { screen: id }, Input::Continue) => {
                let screen = store.screen(id)?;
                match screen.next() {
                    None => return Err(RunError::mismatch(input, "on a choice screen")),
                    Some(Next::End) => self.end(Ending::Completed, &mut transition),
                    Some(Next::Screen(target)) => self.enter(store, target, &mut transition)?,
                }
            }

            (RunState::Active { screen: id }, Input::Choose(index)) => {
                let screen = store.screen(id)?;
                let Some(body) = screen.choice_body() else {
                    return Err(RunError::mismatch(input, "on a dialogue or learning screen"));
                };
                let option = body.option(index).ok_or(RunError::InvalidOptionIndex {
                    index,
                    len: body.options.len(),
                })?;

                if counts_attempt(screen) {
                    self.attempts = self.attempts.saturating_add(1);
                }
                let result = grade(screen, option);
                transition.grade = Some(result);
                transition.feedback = Some(option.feedback.clone());
                transition.events.push(RunEvent::AnswerGraded {
                    screen: id,
                    option: index,
                    grade: result,
                });

                match result {
                    GradeResult::Advance => match option.next {
                        OptionTarget::Screen(target) => self.enter(store, target, &mut transition)?,
                        OptionTarget::End => self.end(Ending::Completed, &mut transition),
                        // Validation rejects a retry target on an option that advances.
                        OptionTarget::Retry => {}
                    },
                    GradeResult::Retry => {
                        self.state = RunState::AwaitingRetry { screen: id };
                        transition.events.push(RunEvent::RetryOffered { screen: id });
                        info!(
                            target: "story_engine",
                            run_id = %self.id,
                            screen = %id,
                            attempts = self.attempts,
                            "wrong boss answer, retry offered"
                        );
                    }
                    GradeResult::TerminalFail => self.end(Ending::GameOver, &mut transition),
                }
            }

            (RunState::Active { screen: id }, Input::Hint) => {
                let screen = store.screen(id)?;
                let Some(body) = screen.choice_body() else {
                    return Err(RunError::mismatch(input, "on a dialogue or learning screen"));
                };
                self.hints_used = self.hints_used.saturating_add(1);
                transition.hint = body.hint.clone();
                transition.events.push(RunEvent::HintRequested {
                    screen: id,
                    available: body.hint.is_some(),
                });
            }

            (RunState::AwaitingRetry { screen: id }, Input::Retry) => {
                self.state = RunState::Active { screen: id };
                transition.events.push(RunEvent::RetryStarted { screen: id });
            }

            (RunState::Active { .. }, Input::Retry)
            | (RunState::AwaitingRetry { .. }, Input::Continue)
            | (RunState::AwaitingRetry { .. }, Input::Choose(_))
            | (RunState::AwaitingRetry { .. }, Input::Hint) => {
                return Err(RunError::mismatch(input, self.state.describe()));
            }
        }

        transition.to = self.current_screen_id();
        Ok(transition)
    }

    /// Move onto `target`, recording fundamentals and ending on a terminal screen.
    fn enter(
        &mut self,
        store: &StoryStore,
        target: ScreenId,
        transition: &mut Transition,
    ) -> Result<(), RunError> {
        let previous_chapter = store.screen(self.current_screen_id())?.chapter;
        let screen = store.screen(target)?;

        self.state = RunState::Active { screen: target };
        transition.events.push(RunEvent::ScreenEntered {
            screen: target,
            kind: screen.kind(),
            chapter: screen.chapter,
        });

        if screen.chapter != previous_chapter {
            transition.events.push(RunEvent::ChapterEntered {
                chapter: screen.chapter,
            });
        }

        if let Some(fundamental) = screen.fundamental() {
            if self.visited_fundamentals.insert(fundamental) {
                transition.events.push(RunEvent::FundamentalLearned {
                    fundamental,
                    screen: target,
                });
            }
        }

        if screen.is_terminal() {
            self.end(Ending::Completed, transition);
        }
        Ok(())
    }

    fn end(&mut self, ending: Ending, transition: &mut Transition) {
        let screen = self.current_screen_id();
        self.state = RunState::Ended { ending, screen };
        transition.events.push(RunEvent::RunEnded {
            outcome: ending.into(),
        });
        info!(
            target: "story_engine",
            run_id = %self.id,
            screen = %screen,
            ending = ?ending,
            attempts = self.attempts,
            hints = self.hints_used,
            fundamentals = self.visited_fundamentals.len(),
            "run ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::{
        ChapterInfo, ChoiceBody, ChoiceOption, DialogueBody, FailureMode, LearningBody, Story,
        StoryError, Strictness,
    };

    fn to(id: u32) -> Next {
        Next::Screen(ScreenId(id))
    }

    /// dialogue 0 -> learning(7) 1 -> boss 2 [A wrong, B -> 20, C wrong] -> choice 20 -> dialogue 21 (end)
    fn boss_story(mode: FailureMode) -> StoryStore {
        let story = Story {
            title: "Boss test".to_string(),
            start: ScreenId(0),
            chapters: vec![
                ChapterInfo::new(2, "Before", "Warmup"),
                ChapterInfo::new(3, "Boss", "Initial Conditions"),
                ChapterInfo::new(4, "After", "Logic"),
            ],
            screens: vec![
                Screen::dialogue(0, 2, DialogueBody::new("Dr. Maya", "Ready?").with_next(to(1))),
                Screen::learning(1, 3, LearningBody::new(1, "Initial Conditions", "...").with_next(to(2))),
                Screen::boss(
                    2,
                    3,
                    ChoiceBody::new("What happens to the Enzyme?")
                        .with_hint("Needs both inputs")
                        .with_failure_mode(mode)
                        .with_option(ChoiceOption::wrong("A", "A is wrong"))
                        .with_option(ChoiceOption::correct("B", "B is right", 20))
                        .with_option(ChoiceOption::wrong("C", "C is wrong")),
                ),
                Screen::choice(
                    20,
                    4,
                    ChoiceBody::new("Next?")
                        .with_option(ChoiceOption::correct("X", "fine", 21))
                        .with_option(ChoiceOption::correct("Y", "also fine", 21)),
                ),
                Screen::dialogue(21, 4, DialogueBody::new("Dr. Maya", "Done!")),
            ],
        };
        StoryStore::new(story).unwrap()
    }

    fn at_boss(store: &StoryStore) -> Run {
        let mut run = Run::with_id(store, RunId::nil()).unwrap();
        run.apply_input(store, Input::Continue).unwrap();
        run.apply_input(store, Input::Continue).unwrap();
        assert_eq!(run.current_screen_id(), ScreenId(2));
        run
    }

    #[test]
    fn test_new_run_starts_active() {
        let store = boss_story(FailureMode::Retry);
        let run = Run::new(&store).unwrap();

        assert_eq!(run.state(), RunState::Active { screen: ScreenId(0) });
        assert_eq!(run.outcome(), Outcome::InProgress);
        assert_eq!(run.attempts(), 0);
        assert!(run.visited_fundamentals().is_empty());
    }

    #[test]
    fn test_continue_enters_learning_and_records_fundamental() {
        let store = boss_story(FailureMode::Retry);
        let mut run = Run::new(&store).unwrap();

        let t = run.apply_input(&store, Input::Continue).unwrap();

        assert_eq!(t.to, ScreenId(1));
        assert!(run.visited_fundamentals().contains(&1));
        assert_eq!(t.learned().collect::<Vec<_>>(), vec![1]);
        assert!(t.events.contains(&RunEvent::ChapterEntered { chapter: 3 }));
    }

    #[test]
    fn test_boss_wrong_then_retry_then_correct() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);

        let t = run.apply_input(&store, Input::Choose(0)).unwrap();
        assert_eq!(run.state(), RunState::AwaitingRetry { screen: ScreenId(2) });
        assert_eq!(t.grade, Some(GradeResult::Retry));
        assert_eq!(t.feedback.as_deref(), Some("A is wrong"));
        assert_eq!(run.attempts(), 1);
        assert!(!t.moved());

        run.apply_input(&store, Input::Retry).unwrap();
        assert_eq!(run.state(), RunState::Active { screen: ScreenId(2) });
        assert_eq!(run.attempts(), 1);

        let t = run.apply_input(&store, Input::Choose(1)).unwrap();
        assert_eq!(run.state(), RunState::Active { screen: ScreenId(20) });
        assert_eq!(t.grade, Some(GradeResult::Advance));
        assert_eq!(t.feedback.as_deref(), Some("B is right"));
        assert_eq!(run.attempts(), 2);
        assert!(run.visited_fundamentals().contains(&1));
    }

    #[test]
    fn test_invalid_option_leaves_run_unchanged() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);
        let before = run.clone();

        let err = run.apply_input(&store, Input::Choose(5)).unwrap_err();

        assert!(matches!(err, RunError::InvalidOptionIndex { index: 5, len: 3 }));
        assert_eq!(run, before);
    }

    #[test]
    fn test_input_mismatch() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);

        assert!(matches!(
            run.apply_input(&store, Input::Retry),
            Err(RunError::InputMismatch { .. })
        ));
        assert!(matches!(
            run.apply_input(&store, Input::Continue),
            Err(RunError::InputMismatch { .. })
        ));

        run.apply_input(&store, Input::Choose(2)).unwrap();
        let before = run.clone();
        assert!(matches!(
            run.apply_input(&store, Input::Choose(1)),
            Err(RunError::InputMismatch { .. })
        ));
        assert!(matches!(
            run.apply_input(&store, Input::Hint),
            Err(RunError::InputMismatch { .. })
        ));
        assert_eq!(run, before);
    }

    #[test]
    fn test_choose_on_dialogue_is_mismatch() {
        let store = boss_story(FailureMode::Retry);
        let mut run = Run::new(&store).unwrap();

        assert!(matches!(
            run.apply_input(&store, Input::Choose(0)),
            Err(RunError::InputMismatch { .. })
        ));
    }

    #[test]
    fn test_terminal_fail_ends_run() {
        let store = boss_story(FailureMode::GameOver);
        let mut run = at_boss(&store);

        let t = run.apply_input(&store, Input::Choose(0)).unwrap();

        assert_eq!(t.grade, Some(GradeResult::TerminalFail));
        assert_eq!(run.outcome(), Outcome::GameOver);
        assert!(run.is_ended());
        assert!(matches!(
            run.apply_input(&store, Input::Retry),
            Err(RunError::InputOnEndedRun {
                outcome: Outcome::GameOver
            })
        ));
    }

    #[test]
    fn test_reaching_terminal_screen_completes() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);
        run.apply_input(&store, Input::Choose(1)).unwrap();

        let t = run.apply_input(&store, Input::Choose(1)).unwrap();

        assert_eq!(t.to, ScreenId(21));
        assert_eq!(run.outcome(), Outcome::Completed);
        assert_eq!(run.current_screen_id(), ScreenId(21));
        assert!(t.events.contains(&RunEvent::RunEnded {
            outcome: Outcome::Completed
        }));
        // Narrative choices do not count as attempts.
        assert_eq!(run.attempts(), 1);
    }

    #[test]
    fn test_ended_run_rejects_everything() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);
        run.apply_input(&store, Input::Choose(1)).unwrap();
        run.apply_input(&store, Input::Choose(0)).unwrap();
        let before = run.clone();

        for input in [Input::Continue, Input::Choose(0), Input::Retry, Input::Hint] {
            assert!(matches!(
                run.apply_input(&store, input),
                Err(RunError::InputOnEndedRun { .. })
            ));
        }
        assert_eq!(run, before);
    }

    #[test]
    fn test_hint_counts_without_grading() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);

        let t = run.apply_input(&store, Input::Hint).unwrap();

        assert_eq!(t.hint.as_deref(), Some("Needs both inputs"));
        assert_eq!(t.grade, None);
        assert_eq!(run.hints_used(), 1);
        assert_eq!(run.attempts(), 0);
        assert_eq!(run.state(), RunState::Active { screen: ScreenId(2) });
    }

    #[test]
    fn test_hint_on_dialogue_is_mismatch() {
        let store = boss_story(FailureMode::Retry);
        let mut run = Run::new(&store).unwrap();

        assert!(run.apply_input(&store, Input::Hint).is_err());
        assert_eq!(run.hints_used(), 0);
    }

    fn narrative_game_over_story() -> Story {
        Story {
            title: "Narrative".to_string(),
            start: ScreenId(0),
            chapters: vec![ChapterInfo::new(0, "Only", "Choices")],
            screens: vec![
                Screen::choice(
                    0,
                    0,
                    ChoiceBody::new("How should we begin?")
                        .with_option(ChoiceOption::correct("Identify molecules", "Brilliant!", 1))
                        .with_option(ChoiceOption {
                            next: OptionTarget::Screen(ScreenId(1)),
                            ..ChoiceOption::wrong("Guess", "Hmm, let's be systematic")
                        }),
                ),
                Screen::dialogue(1, 0, DialogueBody::new("Dr. Maya", "Let's go").with_next(to(2))),
                Screen::dialogue(2, 0, DialogueBody::new("Dr. Maya", "Done")),
            ],
        }
    }

    #[test]
    fn test_game_over_option_on_narrative_choice_advances() {
        let store = StoryStore::new(narrative_game_over_story()).unwrap();
        let mut run = Run::new(&store).unwrap();

        let t = run.apply_input(&store, Input::Choose(1)).unwrap();

        assert_eq!(t.grade, Some(GradeResult::Advance));
        assert_eq!(t.feedback.as_deref(), Some("Hmm, let's be systematic"));
        assert_eq!(run.state(), RunState::Active { screen: ScreenId(1) });
        assert_eq!(run.attempts(), 0);
    }

    #[test]
    fn test_narrative_game_over_rejected_when_strict() {
        let result = StoryStore::with_strictness(narrative_game_over_story(), Strictness::Strict);
        assert!(matches!(result, Err(StoryError::Invalid { .. })));
    }

    #[test]
    fn test_counters_saturate() {
        let store = boss_story(FailureMode::Retry);
        let mut run = at_boss(&store);
        run.attempts = u32::MAX;
        run.hints_used = u32::MAX;

        run.apply_input(&store, Input::Hint).unwrap();
        run.apply_input(&store, Input::Choose(0)).unwrap();

        assert_eq!(run.attempts(), u32::MAX);
        assert_eq!(run.hints_used(), u32::MAX);
    }
}
