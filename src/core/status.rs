//! Lifecycle state machine shared by queue items and commit attempts.
//!
//! ```text
//! Pending ──begin──▶ Processing ──complete──▶ Done(T)
//!                          └────────fail─────▶ Error(reason)
//! ```
//!
//! `Done` and `Error` are terminal for an attempt. The output lives inside
//! `Done`, so a finished state without an artifact cannot be built. `Error`
//! keeps the typed failure: item transforms record
//! [`PipelineError::TransformFailed`], commits [`PipelineError::CommitFailed`].

use serde::Serialize;

use crate::core::item::Artifact;
use crate::output::OutputArtifact;
use crate::utils::{PipelineError, PipelineResult};

/// Lifecycle of one attempt producing a `T`.
#[derive(Debug, Clone)]
pub enum Lifecycle<T> {
    Pending,
    Processing,
    Done(T),
    Error(PipelineError),
}

/// Per-item status.
pub type ItemStatus = Lifecycle<Artifact>;

/// Status of one whole-queue commit attempt.
pub type CommitStatus = Lifecycle<OutputArtifact>;

/// Payload-free view of a [`Lifecycle`], for events and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Pending,
    Processing,
    Done,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> Lifecycle<T> {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Pending => Stage::Pending,
            Self::Processing => Stage::Processing,
            Self::Done(_) => Stage::Done,
            Self::Error(_) => Stage::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Error(_))
    }

    pub fn output(&self) -> Option<&T> {
        match self {
            Self::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// `Pending → Processing`
    pub fn begin(&mut self) -> PipelineResult<()> {
        match self {
            Self::Pending => {
                *self = Self::Processing;
                Ok(())
            }
            _ => Err(self.illegal(Stage::Processing)),
        }
    }

    /// `Processing → Done`
    pub fn complete(&mut self, output: T) -> PipelineResult<()> {
        match self {
            Self::Processing => {
                *self = Self::Done(output);
                Ok(())
            }
            _ => Err(self.illegal(Stage::Done)),
        }
    }

    /// `Processing → Error`
    pub fn fail(&mut self, error: PipelineError) -> PipelineResult<()> {
        match self {
            Self::Processing => {
                *self = Self::Error(error);
                Ok(())
            }
            _ => Err(self.illegal(Stage::Error)),
        }
    }

    /// Applies a transform outcome to a `Processing` state.
    pub fn settle(&mut self, outcome: PipelineResult<T>) -> PipelineResult<()> {
        match outcome {
            Ok(output) => self.complete(output),
            Err(e) => self.fail(e),
        }
    }

    fn illegal(&self, to: Stage) -> PipelineError {
        PipelineError::InvalidTransition {
            from: self.stage().as_str(),
            to: to.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut status: Lifecycle<u32> = Lifecycle::default();
        assert_eq!(status.stage(), Stage::Pending);

        status.begin().unwrap();
        assert_eq!(status.stage(), Stage::Processing);
        assert!(status.output().is_none());

        status.complete(7).unwrap();
        assert_eq!(status.output(), Some(&7));
        assert!(status.is_terminal());
    }

    #[test]
    fn test_error_is_terminal() {
        let mut status: Lifecycle<u32> = Lifecycle::Pending;
        status.begin().unwrap();
        status
            .fail(PipelineError::TransformFailed("corrupt".into()))
            .unwrap();

        assert!(matches!(
            status.error(),
            Some(PipelineError::TransformFailed(reason)) if reason == "corrupt"
        ));
        assert!(status.output().is_none());
        assert!(matches!(
            status.begin(),
            Err(PipelineError::InvalidTransition { from: "error", to: "processing" })
        ));
        assert!(status.complete(1).is_err());
    }

    #[test]
    fn test_cannot_skip_processing() {
        let mut status: Lifecycle<u32> = Lifecycle::Pending;
        assert!(status.complete(1).is_err());
        assert!(status.fail(PipelineError::processing("nope")).is_err());
        assert_eq!(status.stage(), Stage::Pending);
    }

    #[test]
    fn test_done_never_reenters_processing() {
        let mut status: Lifecycle<u32> = Lifecycle::Pending;
        status.begin().unwrap();
        status.settle(Ok(3)).unwrap();

        assert!(status.begin().is_err());
        assert!(status.fail(PipelineError::processing("late")).is_err());
        assert_eq!(status.output(), Some(&3));
    }

    #[test]
    fn test_settle_records_error_message() {
        let mut status: Lifecycle<u32> = Lifecycle::Pending;
        status.begin().unwrap();
        status
            .settle(Err(PipelineError::format("zero-byte input")))
            .unwrap();

        assert_eq!(
            status.error().map(ToString::to_string).as_deref(),
            Some("Format error: zero-byte input")
        );
    }
}
