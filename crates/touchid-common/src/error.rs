//! Common error types for the challenge issuer.

use thiserror::Error;

/// Errors surfaced by the issuance core to the transport boundary
#[derive(Debug, Error)]
pub enum TouchIdError {
    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Admission controller refused the request
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Store unreachable or rejected the write
    #[error("Store error: {0}")]
    StoreUnavailable(String),

    /// Store did not answer within the deadline
    #[error("Store timed out: {0}")]
    StoreTimeout(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TouchIdError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::RateLimited(_) => 429,
            Self::StoreUnavailable(_) => 503,
            Self::StoreTimeout(_) => 504,
            Self::Internal(_) => 500,
        }
    }
}
