//! Rendering of run output.
//!
//! # Submodules
//!
//! - [`markdown`]: Builds the per-article summary sections and the article draft
//! - [`console`]: Renders pipeline progress for the `write` subcommand

pub mod console;
pub mod markdown;
