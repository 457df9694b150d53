//! # Story Engine
//!
//! Walks a player through a `story_graph` story. A [`Run`] is the only
//! mutable value: it is created on the start screen, advanced one [`Input`]
//! at a time, and reports what happened through a [`Transition`].
//!
//! ## Core Components
//!
//! - **run**: The navigation state machine (`Active`, `AwaitingRetry`, `Ended`)
//! - **grading**: Decides between advance, retry and terminal failure for a chosen option
//! - **progress**: Read-only summary derived from a run and the store
//! - **events**: What a transition did, for renderers and logs
//! - **snapshot**: Save/resume of a run as JSON
//! - **autoplay**: Scripted playthroughs used by the story checker
//! - **config** / **telemetry**: TOML engine config and tracing setup for hosts
//!
//! ## Design Philosophy
//!
//! - **Explicit State**: No ambient game state; every transition takes and updates a `Run`
//! - **Total Transitions**: An input either applies completely or leaves the run untouched
//! - **Soft Boss Failure**: A wrong boss answer offers a retry instead of ending the run

pub mod autoplay;
pub mod config;
pub mod error;
pub mod events;
pub mod grading;
pub mod progress;
pub mod run;
pub mod snapshot;
pub mod telemetry;

pub use autoplay::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use grading::*;
pub use progress::*;
pub use run::*;
pub use snapshot::*;
