//! # Story Runtime
//!
//! Plays a compiled Snippetweave story: loads the compiled document, renders
//! snippets against the shared state and drives navigation, history and
//! checkpoints.
//!
//! ## Core Components
//!
//! - **model**: Story, Snippet, Checkpoint and the save snapshot
//! - **template**: The rendering capability and its default `rhai` renderer
//! - **navigation**: The player state machine and declarative link bindings
//!
//! The runtime is single-threaded: each transition completes before the next
//! one is requested, and only the player mutates state and history.

pub mod error;
pub mod model;
pub mod navigation;
pub mod template;

pub use error::StoryError;
pub use model::*;
pub use navigation::*;
pub use template::*;
