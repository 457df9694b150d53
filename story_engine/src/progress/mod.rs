//! Progress Tracker - a read-only view of a run, derived on demand.
//!
//! Nothing here is stored on the run. The summary is recomputed from the run
//! and the store each time, so it can never drift from the run's state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use story_graph::{ScreenId, StoryStore};

use crate::error::RunError;
use crate::run::{Outcome, Run};

/// What a renderer needs for a progress bar or the end-of-run screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub current_screen: ScreenId,
    pub current_chapter: u32,

    /// Title of the current chapter, when the story declares one.
    pub chapter_title: Option<String>,

    /// Chapters strictly before the current one.
    pub completed_chapters: Vec<u32>,

    pub fundamentals_learned: BTreeSet<u8>,
    pub total_fundamentals: usize,
    pub attempts: u32,
    pub hints_used: u32,
    pub outcome: Outcome,
    pub is_complete: bool,
}

impl ProgressSummary {
    pub(crate) fn derive(run: &Run, store: &StoryStore) -> Result<Self, RunError> {
        let screen = run.current_screen(store)?;
        let chapter = screen.chapter;
        let outcome = run.outcome();

        Ok(Self {
            current_screen: screen.id,
            current_chapter: chapter,
            chapter_title: store.chapter(chapter).map(|info| info.title.clone()),
            completed_chapters: store.chapters_before(chapter).collect(),
            fundamentals_learned: run.visited_fundamentals().clone(),
            total_fundamentals: store.fundamental_count(),
            attempts: run.attempts(),
            hints_used: run.hints_used(),
            outcome,
            is_complete: outcome == Outcome::Completed,
        })
    }

    /// Fraction of fundamentals learned, 0.0-1.0.
    pub fn fundamentals_ratio(&self) -> f32 {
        if self.total_fundamentals == 0 {
            return 0.0;
        }
        self.fundamentals_learned.len() as f32 / self.total_fundamentals as f32
    }

    /// Plain-text summary, like the game's completion screen.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        match self.outcome {
            Outcome::Completed => out.push_str("## Mystery solved!\n\n"),
            Outcome::GameOver => out.push_str("## Game over\n\n"),
            Outcome::InProgress => out.push_str("## In progress\n\n"),
        }

        let _ = write!(out, "Chapter {}", self.current_chapter);
        if let Some(title) = &self.chapter_title {
            let _ = write!(out, ": {title}");
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "Fundamentals: {}/{}",
            self.fundamentals_learned.len(),
            self.total_fundamentals
        );
        let _ = writeln!(out, "Attempts: {}", self.attempts);
        let _ = writeln!(out, "Hints Used: {}", self.hints_used);

        out
    }
}
