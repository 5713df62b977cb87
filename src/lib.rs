// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod preview;
pub mod queue;
pub mod processing;
pub mod output;
pub mod commands;

// Public exports for external consumers
pub use crate::core::{
    AdmissionPolicy, CommitStatus, CompressionSettings, ItemId, ItemStatus, PageLayout,
    PipelineConfig, PipelineEvent, QueueItem, SourceFile, Stage, Tool, ToolSession,
};
pub use crate::output::OutputArtifact;
pub use crate::utils::{PipelineError, PipelineResult};

// The binary in main.rs is a thin CLI over this library.
