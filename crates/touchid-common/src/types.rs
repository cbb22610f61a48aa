//! Core types shared across the issuer.

use serde::{Deserialize, Serialize};

/// A challenge issued to a user.
///
/// This is both the persisted record and the in-memory value the service
/// hands back to the transport layer. Stored as `{"userId": .., "claim": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Caller-supplied identifier, opaque and untrusted
    pub user_id: String,

    /// Hex-encoded SHA-256 token the client signs
    pub claim: String,
}

/// How the store treats a second challenge for the same user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Replace the existing record; one live claim per user
    #[default]
    Upsert,
    /// Append a new record every time; history accumulates
    Insert,
}

/// Body of `POST /challenge`.
///
/// Both fields are optional at the binding level so a missing `userId`
/// surfaces as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub user_id: Option<String>,

    /// Accepted for compatibility, never trusted
    #[serde(default)]
    pub claim: Option<String>,
}

/// Successful issuance response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub status: String,
    pub user_id: String,
    pub claim: String,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            status: "OK".to_string(),
            user_id: challenge.user_id,
            claim: challenge.claim,
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

/// JSON body for every non-2xx answer produced by the issuer itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
        }
    }
}
