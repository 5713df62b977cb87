use serde::Serialize;

use crate::core::item::ItemId;
use crate::core::types::CompressionStats;
use crate::utils::Rejection;

/// Event published by a tool session for display layers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipelineEvent {
    #[serde(rename_all = "camelCase")]
    ItemQueued {
        id: ItemId,
        name: String,
        original_size: u64,
        preview_url: Option<String>,
    },
    ItemRejected { rejection: Rejection },
    ItemStarted { id: ItemId },
    ItemCompleted { id: ItemId, stats: CompressionStats },
    ItemFailed { id: ItemId, error: String },
    ItemRemoved { id: ItemId },
    QueueReordered { order: Vec<ItemId> },
    QueueCleared { removed: usize },
    /// A completion arrived for an id that is no longer queued
    CompletionDiscarded { id: ItemId },
    CommitStarted { items: usize },
    #[serde(rename_all = "camelCase")]
    CommitCompleted { file_name: String, size: u64 },
    CommitFailed { error: String },
}

/// Summary of a session's per-item progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Items that reached `Done`
    pub completed_tasks: usize,
    /// Items that reached `Error`
    pub failed_tasks: usize,
    /// Items currently queued
    pub total_tasks: usize,
    /// Finished (done or failed) share, 0-100
    pub progress_percentage: usize,
}

impl Progress {
    pub fn new(completed_tasks: usize, failed_tasks: usize, total_tasks: usize) -> Self {
        let progress_percentage = if total_tasks > 0 {
            ((completed_tasks + failed_tasks) * 100) / total_tasks
        } else {
            0
        };

        Self {
            completed_tasks,
            failed_tasks,
            total_tasks,
            progress_percentage,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed_tasks + self.failed_tasks == self.total_tasks
    }
}
