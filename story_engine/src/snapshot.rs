//! Save/resume support.
//!
//! The engine never touches disk. Hosts take a [`RunSnapshot`], store it
//! wherever they like (JSON via `serde_json` is the supported encoding), and
//! hand it back to [`Run::resume`], which checks it against the story before
//! trusting it.

use serde::{Deserialize, Serialize};
use story_graph::{ScreenKind, StoryStore};
use tracing::info;

use crate::error::RunError;
use crate::run::{Run, RunState};

/// Current snapshot format.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// A saved run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub format: u32,

    /// Title of the story the run was played against.
    pub story: String,

    pub run: Run,
}

impl RunSnapshot {
    pub fn to_json(&self) -> Result<String, RunError> {
        serde_json::to_string_pretty(self).map_err(|e| RunError::invalid_snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, RunError> {
        serde_json::from_str(json).map_err(|e| RunError::invalid_snapshot(e.to_string()))
    }
}

impl Run {
    /// Capture the run for saving.
    pub fn snapshot(&self, store: &StoryStore) -> RunSnapshot {
        RunSnapshot {
            format: SNAPSHOT_FORMAT,
            story: store.title().to_string(),
            run: self.clone(),
        }
    }

    /// Restore a saved run, checking that it still fits `store`.
    pub fn resume(store: &StoryStore, snapshot: RunSnapshot) -> Result<Self, RunError> {
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(RunError::invalid_snapshot(format!(
                "unsupported format {}, expected {SNAPSHOT_FORMAT}",
                snapshot.format
            )));
        }
        if snapshot.story != store.title() {
            return Err(RunError::invalid_snapshot(format!(
                "snapshot is for story {:?}, not {:?}",
                snapshot.story,
                store.title()
            )));
        }

        let run = snapshot.run;
        let id = run.current_screen_id();
        if !store.contains(id) {
            return Err(RunError::invalid_snapshot(format!("screen {id} is not in the story")));
        }

        if let RunState::AwaitingRetry { screen } = run.state {
            if store.screen(screen)?.kind() != ScreenKind::Boss {
                return Err(RunError::invalid_snapshot(format!(
                    "awaiting retry on screen {screen}, which is not a boss"
                )));
            }
        }

        let taught: Vec<u8> = store.screens().filter_map(|s| s.fundamental()).collect();
        if let Some(unknown) = run
            .visited_fundamentals
            .iter()
            .find(|f| !taught.contains(f))
        {
            return Err(RunError::invalid_snapshot(format!(
                "fundamental {unknown} is not taught by the story"
            )));
        }

        info!(
            target: "story_engine",
            run_id = %run.id,
            screen = %id,
            outcome = ?run.outcome(),
            "run resumed"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{Input, Outcome, RunId};
    use std::collections::BTreeSet;
    use story_graph::{ChapterInfo, ChoiceBody, ChoiceOption, DialogueBody, LearningBody, Next, Screen, ScreenId, Story};

    fn store() -> StoryStore {
        let story = Story {
            title: "Snapshots".to_string(),
            start: ScreenId(0),
            chapters: vec![ChapterInfo::new(0, "Only", "Saving")],
            screens: vec![
                Screen::learning(0, 0, LearningBody::new(1, "Variables", "...").with_next(Next::Screen(ScreenId(1)))),
                Screen::boss(
                    1,
                    0,
                    ChoiceBody::new("Which?")
                        .with_option(ChoiceOption::wrong("Wrong", "no"))
                        .with_option(ChoiceOption::correct("Right", "yes", 2)),
                ),
                Screen::dialogue(2, 0, DialogueBody::new("Dr. Maya", "Bye")),
            ],
        };
        StoryStore::new(story).unwrap()
    }

    #[test]
    fn test_resume_awaiting_retry() {
        let store = store();
        let mut run = Run::with_id(&store, RunId::nil()).unwrap();
        run.apply_input(&store, Input::Continue).unwrap();
        run.apply_input(&store, Input::Choose(0)).unwrap();

        let json = run.snapshot(&store).to_json().unwrap();
        let mut resumed = Run::resume(&store, RunSnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(resumed, run);
        resumed.apply_input(&store, Input::Retry).unwrap();
        resumed.apply_input(&store, Input::Choose(1)).unwrap();
        assert_eq!(resumed.outcome(), Outcome::Completed);
        assert_eq!(resumed.attempts(), 2);
    }

    #[test]
    fn test_resume_rejects_missing_screen() {
        let store = store();
        let mut snapshot = Run::new(&store).unwrap().snapshot(&store);
        snapshot.run.state = RunState::Active { screen: ScreenId(99) };

        let err = Run::resume(&store, snapshot).unwrap_err();
        assert!(matches!(err, RunError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_resume_rejects_retry_off_boss() {
        let store = store();
        let mut snapshot = Run::new(&store).unwrap().snapshot(&store);
        snapshot.run.state = RunState::AwaitingRetry { screen: ScreenId(2) };

        assert!(Run::resume(&store, snapshot).is_err());
    }

    #[test]
    fn test_resume_rejects_unknown_fundamental() {
        let store = store();
        let mut snapshot = Run::new(&store).unwrap().snapshot(&store);
        snapshot.run.visited_fundamentals = BTreeSet::from([1, 7]);

        let err = Run::resume(&store, snapshot).unwrap_err();
        assert!(err.to_string().contains("fundamental 7"));
    }

    #[test]
    fn test_resume_rejects_other_story_and_format() {
        let store = store();
        let snapshot = Run::new(&store).unwrap().snapshot(&store);

        let mut other = snapshot.clone();
        other.story = "Another story".to_string();
        assert!(Run::resume(&store, other).is_err());

        let mut future = snapshot;
        future.format = 2;
        assert!(Run::resume(&store, future).is_err());
    }

    #[test]
    fn test_from_json_garbage() {
        assert!(matches!(
            RunSnapshot::from_json("{not json"),
            Err(RunError::InvalidSnapshot(_))
        ));
    }
}
