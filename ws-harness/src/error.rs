use std::time::Duration;

use thiserror::Error;
use ws_core::ValidationError;

use crate::assertion::AssertionReport;
use crate::pipeline::Stage;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

fn joined(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything a scenario can fail with
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Form rejected before any request; also decoded from a 422 body.
    #[error("Validation failed: {}", joined(.0))]
    Validation(Vec<ValidationError>),

    /// Create conflicted with an existing name (pre-check or 409).
    #[error("Workspace name already exists: {0}")]
    DuplicateName(String),

    #[error("Workspace not found: {0}")]
    NotFound(String),

    /// Non-2xx response or connection failure.
    #[error("Transport error (status {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Timed out after {after:?} waiting for {stage}")]
    Timeout { stage: String, after: Duration },

    #[error("{0}")]
    Assertion(AssertionReport),

    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("No update is pending; click update first")]
    NothingPending,

    /// A second submit before the first response was awaited.
    #[error("An update is already in flight; wait for its response first")]
    UpdateInFlight,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    pub fn timeout(stage: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            stage: stage.into(),
            after,
        }
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Tag an error with the pipeline stage it came from.
    pub fn at(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The error with any stage wrappers peeled off.
    pub fn root(&self) -> &HarnessError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The outermost stage tag, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(e: reqwest::Error) -> Self {
        Self::transport(e.status().map(|s| s.as_u16()), e.to_string())
    }
}
