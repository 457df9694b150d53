//! Tracing setup for binaries embedding the engine.
//!
//! - `STORY_LOG` controls the filter (e.g. "debug" or
//!   "info,story_engine=debug,story_graph=warn"). Falls back to the config's
//!   `log_filter`.
//! - `STORY_LOG_FORMAT` selects "pretty" or "json", overriding the config.
//!
//! Libraries only emit events; installing a subscriber is the host's call.

use tracing_subscriber::EnvFilter;

use crate::config::{EngineConfig, LogFormat};

pub const LOG_ENV: &str = "STORY_LOG";
pub const LOG_FORMAT_ENV: &str = "STORY_LOG_FORMAT";

fn format_from_env(config: &EngineConfig) -> LogFormat {
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("pretty") => LogFormat::Pretty,
        _ => config.log_format,
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = match format_from_env(config) {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}
