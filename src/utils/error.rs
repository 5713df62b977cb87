//! Error types for the file pipeline.
//!
//! Provides a hierarchy of error types using `thiserror`. Item-scoped failures
//! ([`PipelineError::TransformFailed`]) and queue-scoped failures
//! ([`PipelineError::CommitFailed`]) are distinct variants and are never
//! converted into one another.

use std::io;
use thiserror::Error;
use serde::Serialize;

use crate::core::ItemId;

/// Validation errors for configuration values.
#[derive(Error, Debug, Clone, Serialize)]
pub enum ValidationError {
    /// A quality factor outside 1-100
    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    Quality(u8),
    /// A dimension or size that must be positive was 0
    #[error("{0} cannot be 0")]
    Zero(&'static str),
    /// Any other settings problem
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Why a file was kept out of the queue.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RejectionReason {
    /// Neither the declared type nor the extension is accepted by the tool
    #[error("type '{declared}' is not accepted by this tool")]
    UnsupportedType { declared: String },
    /// Admitting the file would exceed the item count limit
    #[error("queue already holds the maximum of {max} items")]
    ItemLimit { max: usize },
    /// Admitting the file would exceed the cumulative byte limit
    #[error("adding {size} bytes would exceed the {max} byte limit")]
    ByteLimit { size: u64, max: u64 },
}

/// A single file rejected at the ingestion boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{name}: {reason}")]
pub struct Rejection {
    pub name: String,
    pub reason: RejectionReason,
}

/// Preview handle bookkeeping defects.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResourceError {
    /// The item already owns a live preview handle
    #[error("Preview already allocated for item {0}")]
    AlreadyAllocated(ItemId),
    /// The handle is not (or no longer) registered
    #[error("Preview handle {0} was never allocated or is already released")]
    NotAllocated(String),
}

/// Main error type for the pipeline.
#[derive(Error, Debug, Clone, Serialize)]
pub enum PipelineError {
    /// File kept out of the queue at ingestion
    #[error("Ingestion rejected: {0}")]
    IngestionRejected(#[from] Rejection),

    /// Per-item transform failure; isolated to that item
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    /// Whole-queue commit failure; the queue is left unchanged
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// Illegal lifecycle transition
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    /// Preview handle defect
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Configuration failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Corrupt, empty or unsupported input
    #[error("Format error: {0}")]
    Format(String),

    /// Codec or runtime failure while transforming
    #[error("Processing error: {0}")]
    Processing(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// No queue item with this id
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// Commit requested on an empty queue
    #[error("Nothing to commit: the queue is empty")]
    EmptyQueue,

    /// Operation not offered by the active tool
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

// Helper methods for error creation
impl PipelineError {
    pub fn processing<T: Into<String>>(msg: T) -> Self {
        Self::Processing(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        Self::Unsupported(msg.into())
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => Self::Format(e.to_string()),
            image::ImageError::Decoding(e) => Self::Format(e.to_string()),
            other => Self::Processing(other.to_string()),
        }
    }
}

impl From<lopdf::Error> for PipelineError {
    fn from(err: lopdf::Error) -> Self {
        Self::Format(err.to_string())
    }
}
