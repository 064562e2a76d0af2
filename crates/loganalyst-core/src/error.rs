//! Error types.
//!
//! [`ServiceError`] covers failures talking to the classification service.
//! The round controller treats every variant the same way (fall back or grade
//! as incorrect), but keeps the distinction for logging.

use thiserror::Error;

use crate::controller::Phase;

/// Errors that can occur when talking to the classification service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No answer within the request timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The service could not be reached.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service answered with an error status.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The service answered without the expected payload.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from driving the round controller incorrectly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("cannot {action} while in the {phase} phase")]
    InvalidTransition { action: &'static str, phase: Phase },

    #[error("both a technique and a mitigation must be selected before submitting")]
    IncompleteSelection,

    #[error("'{0}' is not one of the offered techniques")]
    UnknownClassification(String),

    #[error("'{0}' is not one of the offered mitigations")]
    UnknownMitigation(String),
}
