//! Loading stories from TOML.
//!
//! Stories are authored as a flat screen table (see `stories/` for the
//! shipped one). Every loader validates before returning a store.

use std::path::Path;
use tracing::info;

use crate::error::{StoryError, StoryResult};
use crate::store::{Story, StoryStore, Strictness};

/// The shipped story, "The Mystery of the Mutating Cells".
pub const BUILTIN_STORY: &str = include_str!("../stories/mutating_cells.toml");

/// Parse a story document without validating it.
pub fn parse_story(source: &str) -> StoryResult<Story> {
    Ok(toml::from_str(source)?)
}

/// Parse and freeze a story from TOML text.
pub fn from_toml_str(source: &str, strictness: Strictness) -> StoryResult<StoryStore> {
    StoryStore::with_strictness(parse_story(source)?, strictness)
}

/// Read, parse and freeze a story file.
pub fn from_path(path: impl AsRef<Path>, strictness: Strictness) -> StoryResult<StoryStore> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| StoryError::io(path, e))?;
    let store = from_toml_str(&source, strictness)?;
    info!(
        target: "story_graph",
        path = %path.display(),
        title = store.title(),
        screens = store.len(),
        "loaded story"
    );
    Ok(store)
}

/// The shipped story as a store.
pub fn builtin() -> StoryResult<StoryStore> {
    from_toml_str(BUILTIN_STORY, Strictness::Strict)
}
