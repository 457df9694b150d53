//! # Story Graph
//!
//! The immutable story store for ModelIt. This crate owns the canonical screen
//! model, chapter metadata, the static validation pass and TOML loading. It
//! holds no per-player state; runs live in `story_engine`.
//!
//! ## Core Components
//!
//! - **screens**: Screen ids, kinds and the kind-specific bodies
//! - **store**: The read-only graph with id lookups and terminal detection
//! - **validate**: Whole-story invariant checks (graph closure, boss options, fundamentals)
//! - **loader**: Parsing authored TOML stories, including the built-in story

pub mod error;
pub mod loader;
pub mod screens;
pub mod store;
pub mod validate;

pub use error::*;
pub use loader::*;
pub use screens::*;
pub use store::*;
pub use validate::*;
