//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use crate::types::LineRejection;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Input failed validation (missing field, bad template name, ...)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// One or more bulk lines were rejected; the whole batch is blocked
    #[error("{} line(s) rejected", .0.len())]
    BatchRejected(Vec<LineRejection>),

    /// Session missing or expired on the remote side (HTTP 401)
    #[error("Not authenticated")]
    Unauthenticated,

    /// Remote validation refused the supplied credentials
    #[error("Invalid credentials for: {0}")]
    InvalidCredentials(String),

    /// Request never produced a response (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Remote API answered with `success: false`
    #[error("API error: {0}")]
    ApiError(String),

    /// Record not found on the remote side
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Template not found
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Template cannot be deleted
    #[error("Template is protected: {0}")]
    TemplateProtected(String),

    /// Another bulk action is still running for this view
    #[error("An action is already in progress")]
    ActionInProgress,

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_)
            | Self::BatchRejected(_)
            | Self::Unauthenticated
            | Self::InvalidCredentials(_)
            | Self::RecordNotFound(_)
            | Self::TemplateNotFound(_)
            | Self::TemplateProtected(_)
            | Self::ActionInProgress => true,
            Self::NetworkError(_)
            | Self::ApiError(_)
            | Self::SerializationError(_)
            | Self::StorageError(_) => false,
        }
    }

    /// Whether the error means the stored session/credential is no longer usable.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::InvalidCredentials(_))
    }

    /// Whether a delete failed only because the target is already gone.
    ///
    /// Providers report this either as a dedicated not-found error or as a
    /// plain message such as `"Record does not exist"`.
    #[must_use]
    pub fn is_already_gone(&self) -> bool {
        match self {
            Self::RecordNotFound(_) => true,
            Self::ApiError(message) => is_already_gone_message(message),
            _ => false,
        }
    }
}

/// Matches provider messages that mean "the delete target no longer exists".
///
/// Only record-level wording counts. `"Domain not found"` or
/// `"API credentials not found"` are real failures.
#[must_use]
pub fn is_already_gone_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("record does not exist") || lower.contains("record not found")
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
