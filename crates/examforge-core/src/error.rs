//! Error types shared across the engine.
//!
//! `GeneratorError` represents failures when calling the external
//! question-generation or grading-assist services. It lives here so the
//! exam engine can classify errors for retry decisions without string
//! matching.

use thiserror::Error;

/// Errors that can occur when calling an outbound service.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service endpoint does not exist.
    #[error("endpoint not found: {0}")]
    EndpointNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service answered, but the payload failed structural validation
    /// (empty question list, missing fields, negative marks).
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GeneratorError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GeneratorError::AuthenticationFailed(_) | GeneratorError::EndpointNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            GeneratorError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Input rejected before any scoring or analysis ran.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("question {id}: {reason}")]
    Question { id: String, reason: String },

    #[error("duplicate question id: {0}")]
    DuplicateId(String),

    #[error("grade table is not monotonic: cutoff {0} does not decrease")]
    GradeTable(f64),
}

/// Errors from the profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row changed under us; the conditional write did not apply.
    #[error("profile version conflict for {student_id}/{subject}")]
    Conflict { student_id: String, subject: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}
