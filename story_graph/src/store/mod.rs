//! Story store - the immutable screen graph shared by every run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::{StoryError, StoryResult};
use crate::screens::{Screen, ScreenId, ScreenKind};
use crate::validate::{validate, ValidationReport};

/// Metadata for one chapter of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub id: u32,
    pub title: String,
    /// The modeling concept the chapter is built around.
    pub concept: String,
}

impl ChapterInfo {
    pub fn new(id: u32, title: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            concept: concept.into(),
        }
    }
}

/// An authored story document, before it is frozen into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,

    /// Screen a new run begins on.
    pub start: ScreenId,

    #[serde(default)]
    pub chapters: Vec<ChapterInfo>,

    /// Screens in canonical play order.
    pub screens: Vec<Screen>,
}

/// How validation findings are treated when building a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Only error-level findings reject the story.
    #[default]
    Lenient,
    /// Warnings reject the story too.
    Strict,
}

/// The read-only screen graph.
///
/// Built once from a [`Story`] that passed validation and never mutated
/// afterwards. All lookups are pure.
#[derive(Debug, Clone)]
pub struct StoryStore {
    story: Story,

    /// Index: ScreenId -> position in `story.screens`.
    index: HashMap<ScreenId, usize>,

    chapters: BTreeMap<u32, ChapterInfo>,

    fundamental_count: usize,
}

impl StoryStore {
    /// Validate and freeze a story, rejecting error-level findings.
    pub fn new(story: Story) -> StoryResult<Self> {
        Self::with_strictness(story, Strictness::Lenient)
    }

    /// Validate and freeze a story under the given strictness.
    pub fn with_strictness(story: Story, strictness: Strictness) -> StoryResult<Self> {
        let report = validate(&story);
        for finding in &report.findings {
            if finding.is_error() {
                warn!(target: "story_graph", %finding, "story validation error");
            } else {
                debug!(target: "story_graph", %finding, "story validation warning");
            }
        }

        let rejected = match strictness {
            Strictness::Lenient => report.has_errors(),
            Strictness::Strict => !report.is_clean(),
        };
        if rejected {
            return Err(StoryError::invalid(report.findings));
        }

        let index = story
            .screens
            .iter()
            .enumerate()
            .map(|(pos, screen)| (screen.id, pos))
            .collect();
        let chapters = story
            .chapters
            .iter()
            .map(|chapter| (chapter.id, chapter.clone()))
            .collect();
        let fundamental_count = story.screens.iter().filter_map(Screen::fundamental).count();

        debug!(
            target: "story_graph",
            title = %story.title,
            screens = story.screens.len(),
            fundamentals = fundamental_count,
            "story store built"
        );

        Ok(Self {
            story,
            index,
            chapters,
            fundamental_count,
        })
    }

    /// Look up a screen by id.
    ///
    /// An unknown id means corrupt story data or a caller bug.
    pub fn screen(&self, id: ScreenId) -> StoryResult<&Screen> {
        self.index
            .get(&id)
            .map(|pos| &self.story.screens[*pos])
            .ok_or(StoryError::UnknownScreenId(id))
    }

    /// Check if a screen exists.
    pub fn contains(&self, id: ScreenId) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether the story ends on this screen: a dialogue or learning screen
    /// without a successor.
    pub fn is_terminal(&self, id: ScreenId) -> StoryResult<bool> {
        self.screen(id).map(Screen::is_terminal)
    }

    pub fn title(&self) -> &str {
        &self.story.title
    }

    /// The screen new runs begin on.
    pub fn start(&self) -> ScreenId {
        self.story.start
    }

    /// All screens in canonical play order.
    pub fn screens(&self) -> impl Iterator<Item = &Screen> {
        self.story.screens.iter()
    }

    pub fn len(&self) -> usize {
        self.story.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.story.screens.is_empty()
    }

    /// Chapters ordered by id.
    pub fn chapters(&self) -> impl Iterator<Item = &ChapterInfo> {
        self.chapters.values()
    }

    pub fn chapter(&self, id: u32) -> Option<&ChapterInfo> {
        self.chapters.get(&id)
    }

    /// Chapter ids strictly below `chapter`.
    pub fn chapters_before(&self, chapter: u32) -> impl Iterator<Item = u32> + '_ {
        self.chapters.range(..chapter).map(|(id, _)| *id)
    }

    /// Number of fundamentals taught by the story.
    pub fn fundamental_count(&self) -> usize {
        self.fundamental_count
    }

    /// Screens of a given kind, in play order.
    pub fn screens_of_kind(&self, kind: ScreenKind) -> impl Iterator<Item = &Screen> {
        self.story.screens.iter().filter(move |s| s.kind() == kind)
    }

    /// Screens belonging to one chapter, in play order.
    pub fn screens_in_chapter(&self, chapter: u32) -> impl Iterator<Item = &Screen> {
        self.story.screens.iter().filter(move |s| s.chapter == chapter)
    }

    /// Re-run the static validation pass over the frozen story.
    pub fn validate(&self) -> ValidationReport {
        validate(&self.story)
    }

    /// The underlying story document.
    pub fn story(&self) -> &Story {
        &self.story
    }
}
