//! Command handlers for the CLI.
//!
//! - [`run_tool`]: dispatch on the tool's output mode
//! - [`compress_images`]: per-item compression, one output per image
//! - [`commit_documents`]: queue then commit once, one output file

mod tools;

pub use tools::*;
