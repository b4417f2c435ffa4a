//! Error types for grading and for the semantic grading service.
//!
//! `ServiceError` is defined here rather than in the backends crate so the
//! retrying client can downcast and classify errors for retry decisions
//! without string matching.

use thiserror::Error;

/// Fatal errors for a grading or analytics call.
///
/// Everything else (a single evaluator failure, an unreachable grading
/// service) is contained in the result rather than raised: see
/// [`crate::results::QuestionStatus`] and
/// [`crate::adapter::SemanticOutcome`].
#[derive(Debug, Error)]
pub enum GradeError {
    /// The submission failed referential-integrity checks; nothing was
    /// evaluated.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// The exam is misconfigured (e.g. zero total points); rejected before
    /// grading begins.
    #[error("exam misconfigured: {0}")]
    Configuration(String),

    /// Analytics was requested on an empty result set.
    #[error("no submission results to analyze")]
    EmptyBatch,
}

/// Errors that can occur when calling the external semantic grading service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service returned a response the grading contract cannot accept
    /// (e.g. missing `score_fraction`).
    #[error("malformed grading response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ServiceError::AuthenticationFailed(_) | ServiceError::MalformedResponse(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ServiceError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
