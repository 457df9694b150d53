//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! story_path = "stories/mutating_cells.toml"  # omit for the built-in story
//! strict = true                               # warnings reject story_path too
//! log_filter = "info,story_engine=debug"
//! log_format = "json"                         # or "pretty"
//! ```
//!
//! The file path comes from `STORY_ENGINE_CONFIG`. Without it, defaults apply.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use story_graph::{loader, Strictness, StoryError, StoryStore};
use thiserror::Error;
use tracing::{error, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "STORY_ENGINE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Story(#[from] StoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Story file to load instead of the built-in one.
    pub story_path: Option<PathBuf>,

    /// Reject stories with warning-level findings as well as errors.
    ///
    /// Only applies to `story_path`. The built-in story is always loaded
    /// strictly, so `strict = false` does not relax it.
    pub strict: bool,

    /// `EnvFilter` directives, used when `STORY_LOG` is not set.
    pub log_filter: String,

    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            story_path: None,
            strict: false,
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `STORY_ENGINE_CONFIG`, or defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Ok(Self::default());
        };
        match Self::from_path(&path) {
            Ok(config) => {
                info!(target: "story_engine", %path, "loaded engine config");
                Ok(config)
            }
            Err(e) => {
                error!(target: "story_engine", %path, error = %e, "failed to load engine config");
                Err(e)
            }
        }
    }

    pub fn strictness(&self) -> Strictness {
        if self.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    /// Load the configured story, or the built-in one.
    pub fn load_story(&self) -> Result<StoryStore, ConfigError> {
        let store = match &self.story_path {
            Some(path) => loader::from_path(path, self.strictness())?,
            None => loader::builtin()?,
        };
        Ok(store)
    }
}
