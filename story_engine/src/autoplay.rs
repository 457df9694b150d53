//! Scripted playthroughs.
//!
//! Used by `storycheck` to prove a story can be finished, and by tests.

use serde::Serialize;
use story_graph::{Screen, ScreenId, ScreenKind, StoryStore};
use tracing::debug;

use crate::error::RunError;
use crate::run::{Input, Outcome, Run, RunState, Transition};

/// Upper bound on inputs per playthrough, so a story with a loop cannot hang.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// How the scripted player answers choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Always pick the progressing option.
    #[default]
    AlwaysCorrect,
    /// On boss screens, pick the first wrong option once, retry, then answer correctly.
    WrongFirst,
    /// Ask for a hint on every boss before answering correctly.
    HintFirst,
}

/// Result of an autoplay session.
#[derive(Debug, Clone, Serialize)]
pub struct Playthrough {
    pub outcome: Outcome,
    pub steps: usize,
    pub transitions: Vec<Transition>,
    pub run: Run,
}

impl Playthrough {
    /// Screens visited, in order, starting with the start screen.
    pub fn path(&self) -> Vec<ScreenId> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        match self.transitions.first() {
            Some(first) => path.push(first.from),
            None => path.push(self.run.current_screen_id()),
        }
        path.extend(self.transitions.iter().filter(|t| t.moved()).map(|t| t.to));
        path
    }
}

/// Plays a run to its end using a fixed strategy.
pub struct Autoplayer {
    strategy: Strategy,
    max_steps: usize,
}

impl Autoplayer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Play a fresh run.
    pub fn play(&self, store: &StoryStore) -> Result<Playthrough, RunError> {
        self.play_from(store, Run::new(store)?)
    }

    /// Continue an existing run until it ends or the step limit is hit.
    ///
    /// Hitting the limit returns the run still in progress.
    pub fn play_from(&self, store: &StoryStore, mut run: Run) -> Result<Playthrough, RunError> {
        let mut transitions = Vec::new();
        // Boss screens already failed once under `WrongFirst`, and bosses already hinted.
        let mut handled = Vec::new();

        while !run.is_ended() && transitions.len() < self.max_steps {
            let input = match run.state() {
                RunState::AwaitingRetry { .. } => Input::Retry,
                _ => {
                    let screen = run.current_screen(store)?;
                    self.next_input(screen, &mut handled)
                }
            };
            transitions.push(run.apply_input(store, input)?);
        }

        debug!(
            target: "story_engine",
            run_id = %run.id(),
            strategy = ?self.strategy,
            steps = transitions.len(),
            outcome = ?run.outcome(),
            "autoplay finished"
        );

        Ok(Playthrough {
            outcome: run.outcome(),
            steps: transitions.len(),
            transitions,
            run,
        })
    }

    fn next_input(&self, screen: &Screen, handled: &mut Vec<ScreenId>) -> Input {
        let Some(body) = screen.choice_body() else {
            return Input::Continue;
        };
        let correct = body.correct_index().unwrap_or(0);
        let is_boss = screen.kind() == ScreenKind::Boss;

        if !is_boss || handled.contains(&screen.id) {
            return Input::Choose(correct);
        }

        match self.strategy {
            Strategy::AlwaysCorrect => Input::Choose(correct),
            Strategy::WrongFirst => {
                handled.push(screen.id);
                match body.options.iter().position(|o| !o.is_correct()) {
                    Some(wrong) => Input::Choose(wrong),
                    None => Input::Choose(correct),
                }
            }
            Strategy::HintFirst => {
                handled.push(screen.id);
                Input::Hint
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::{ChapterInfo, ChoiceBody, ChoiceOption, DialogueBody, Next, Story};

    fn store() -> StoryStore {
        let story = Story {
            title: "Autoplay".to_string(),
            start: ScreenId(0),
            chapters: vec![ChapterInfo::new(0, "Only", "Playing")],
            screens: vec![
                Screen::dialogue(0, 0, DialogueBody::new("Dr. Maya", "Go").with_next(Next::Screen(ScreenId(1)))),
                Screen::boss(
                    1,
                    0,
                    ChoiceBody::new("Which?")
                        .with_hint("the second one")
                        .with_option(ChoiceOption::wrong("Wrong", "no"))
                        .with_option(ChoiceOption::correct("Right", "yes", 2)),
                ),
                Screen::dialogue(2, 0, DialogueBody::new("Dr. Maya", "Done")),
            ],
        };
        StoryStore::new(story).unwrap()
    }

    #[test]
    fn test_always_correct() {
        let store = store();
        let play = Autoplayer::new(Strategy::AlwaysCorrect).play(&store).unwrap();

        assert_eq!(play.outcome, Outcome::Completed);
        assert_eq!(play.steps, 2);
        assert_eq!(play.path(), vec![ScreenId(0), ScreenId(1), ScreenId(2)]);
        assert_eq!(play.run.attempts(), 1);
    }

    #[test]
    fn test_wrong_first_retries_once() {
        let store = store();
        let play = Autoplayer::new(Strategy::WrongFirst).play(&store).unwrap();

        assert_eq!(play.outcome, Outcome::Completed);
        assert_eq!(play.steps, 4);
        assert_eq!(play.run.attempts(), 2);
    }

    #[test]
    fn test_hint_first() {
        let store = store();
        let play = Autoplayer::new(Strategy::HintFirst).play(&store).unwrap();

        assert_eq!(play.outcome, Outcome::Completed);
        assert_eq!(play.run.hints_used(), 1);
        assert_eq!(play.run.attempts(), 1);
    }

    #[test]
    fn test_step_limit() {
        let store = store();
        let play = Autoplayer::new(Strategy::AlwaysCorrect)
            .with_max_steps(1)
            .play(&store)
            .unwrap();

        assert_eq!(play.outcome, Outcome::InProgress);
        assert_eq!(play.steps, 1);
    }

    #[test]
    fn test_path_without_steps_is_start_screen() {
        let store = store();
        let play = Autoplayer::new(Strategy::AlwaysCorrect)
            .with_max_steps(0)
            .play(&store)
            .unwrap();

        assert!(play.transitions.is_empty());
        assert_eq!(play.path(), vec![ScreenId(0)]);
    }
}
