//! Error types for the Quill content generation engine.

use crate::types::StageKind;
use thiserror::Error;

/// Classification of completion-service failures.
///
/// Transient failures (rate limits, network) are safe to retry by re-invoking
/// the same stage with identical inputs; the coordinator's idempotent caching
/// ensures no duplicate work once a retry succeeds. Fatal failures (auth,
/// unknown model) must surface to the user without automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Transient,
    Fatal,
}

/// Error taxonomy for pipeline stages and chat turns.
///
/// Errors never propagate uncaught past a stage or chat-turn boundary: the
/// coordinator records them as the stage's `Failed` outcome and the chat
/// manager converts them into an error-text turn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuillError {
    #[error("Missing required parameter '{name}' for template '{template}'")]
    MissingParameter {
        template: &'static str,
        name: &'static str,
    },

    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },

    #[error("Stage {stage:?} invoked out of order: {missing}")]
    PrecedenceViolation { stage: StageKind, missing: String },

    #[error("Completion service error ({kind:?}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuillError {
    pub fn transient(message: impl Into<String>) -> Self {
        QuillError::Service {
            kind: ServiceErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        QuillError::Service {
            kind: ServiceErrorKind::Fatal,
            message: message.into(),
        }
    }

    /// True for service failures that are safe to retry with identical inputs.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QuillError::Service {
                kind: ServiceErrorKind::Transient,
                ..
            }
        )
    }
}
