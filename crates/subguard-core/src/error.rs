//! Error taxonomy shared by the pipeline stages.
//!
//! Only `Validation` and `RateLimitExceeded` ever block a submission. The
//! other kinds are corrected in place and surface as advisories.

use thiserror::Error;

/// Everything that can go wrong while gating a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// Content was too short or carried a blocking threat.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The action's fixed window is full.
    #[error("rate limit exceeded for {action}; retry in {retry_after_ms} ms")]
    RateLimitExceeded { action: String, retry_after_ms: u64 },

    /// Stored token was malformed or expired and has been replaced.
    #[error("anonymous token invalid ({0}); regenerated")]
    TokenInvalid(String),

    /// A single evidence link was dropped.
    #[error("url rejected: {url} ({reason})")]
    UrlRejected { url: String, reason: String },

    /// The random source or the local store could not be used.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl GuardError {
    /// Whether this error stops the submission outright.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            GuardError::Validation(_) | GuardError::RateLimitExceeded { .. }
        )
    }
}
