//! Claim generation.
//!
//! A claim is `hex(SHA-256(user_id || rfc3339_nanos(issued_at) || nonce))`.
//! With no extra entropy configured the nonce is empty and the claim is a
//! pure function of the user and the issuance instant.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use touchid_common::Challenge;

/// Challenge generator service
pub struct ChallengeGenerator {
    /// Random bytes mixed into every digest (0 = timestamp only)
    extra_entropy_bytes: usize,
}

impl ChallengeGenerator {
    pub fn new(extra_entropy_bytes: usize) -> Self {
        Self {
            extra_entropy_bytes,
        }
    }

    /// Issue a fresh challenge for `user_id` at the current instant
    pub fn issue(&self, user_id: &str) -> Challenge {
        let issued_at = Utc::now();

        let mut nonce = vec![0u8; self.extra_entropy_bytes];
        if !nonce.is_empty() {
            rand::rng().fill_bytes(&mut nonce);
        }

        let claim = derive_claim(user_id, issued_at, &nonce);

        tracing::debug!(
            user_id = %user_id,
            issued_at = %issued_at,
            extra_entropy = self.extra_entropy_bytes,
            "Generated challenge claim"
        );

        Challenge {
            user_id: user_id.to_string(),
            claim,
        }
    }
}

/// Derive the claim for a user at a given instant.
pub fn derive_claim(user_id: &str, issued_at: DateTime<Utc>, nonce: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(
        issued_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}
