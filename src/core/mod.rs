//! Core pipeline types and the tool session.
//!
//! - [`ToolSession`]: one activated tool with its queue and event loop
//! - [`QueueItem`]: a source file plus its processing status
//! - [`Lifecycle`]: the status state machine shared by items and commits
//! - [`PipelineConfig`]: compression, layout and admission settings
//! - [`PipelineEvent`]: notifications for display layers

mod item;
mod progress;
mod state;
mod status;
mod tool;
mod types;

pub use item::{Artifact, ItemId, QueueItem, SourceFile};
pub use progress::{PipelineEvent, Progress};
pub use state::{CompletionOutcome, IngestOutcome, ToolSession};
pub use status::{CommitStatus, ItemStatus, Lifecycle, Stage};
pub use tool::{OutputMode, Tool};
pub use types::{AdmissionPolicy, CompressionSettings, CompressionStats, PageLayout, PipelineConfig};
