//! # Story Compiler
//!
//! The build-time half of Snippetweave. Turns a project configuration and the
//! crawled snippets into a compiled story document the runtime can play.
//!
//! ## Core Components
//!
//! - **tag_rules**: Boolean rules over snippet tags (`(forest || cave) && !day`)
//! - **config**: Project configuration model, parsed from JSON or TOML text
//! - **injector**: Attaches global, tag-rule and snippet-specific code/styles
//! - **artifact**: The compile pipeline and the compiled story document
//!
//! Build errors are fatal: either the whole story compiles, or nothing is
//! produced.

pub mod artifact;
pub mod config;
pub mod injector;
pub mod tag_rules;

pub use artifact::*;
pub use config::*;
pub use injector::*;
pub use tag_rules::*;
