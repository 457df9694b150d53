//! Error types for loading and querying stories.

use std::path::PathBuf;

use thiserror::Error;

use crate::screens::ScreenId;
use crate::validate::Finding;

/// Errors raised by the story store and loader.
#[derive(Debug, Error)]
pub enum StoryError {
    /// A lookup referenced a screen the store does not contain.
    ///
    /// This always means corrupt story data or a caller bug; it is never
    /// recoverable at runtime.
    #[error("unknown screen id {0}")]
    UnknownScreenId(ScreenId),

    /// The story failed the static validation pass.
    #[error("story failed validation with {} finding(s)", .findings.len())]
    Invalid { findings: Vec<Finding> },

    /// The authored TOML could not be parsed.
    #[error("failed to parse story: {0}")]
    Parse(#[from] toml::de::Error),

    /// The story file could not be read.
    #[error("failed to read story file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoryError {
    /// Create an invalid-story error from validation findings.
    pub fn invalid(findings: Vec<Finding>) -> Self {
        Self::Invalid { findings }
    }

    /// Create an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used across the crate.
pub type StoryResult<T> = Result<T, StoryError>;
