//! Challenge issuance: validate, generate, persist.

use std::sync::Arc;

use touchid_common::{Challenge, ChallengeRequest, TouchIdError};

use super::generator::ChallengeGenerator;
use super::store::ChallengeStore;

/// Orchestrates a single issuance
pub struct ChallengeService<S> {
    generator: ChallengeGenerator,
    store: Arc<S>,
}

impl<S: ChallengeStore> ChallengeService<S> {
    pub fn new(generator: ChallengeGenerator, store: Arc<S>) -> Self {
        Self { generator, store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issue and persist a challenge for the requesting user.
    ///
    /// Any client-supplied claim is discarded. A persistence failure is
    /// reported as a failed issuance even though a claim was generated.
    pub async fn issue(&self, request: ChallengeRequest) -> Result<Challenge, TouchIdError> {
        let user_id = match request.user_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(TouchIdError::InvalidInput(
                    "userId is required".to_string(),
                ));
            }
        };

        if request.claim.is_some() {
            tracing::debug!(user_id = %user_id, "Ignoring client-supplied claim");
        }

        let challenge = self.generator.issue(user_id);

        if let Err(e) = self.store.persist(&challenge).await {
            tracing::error!(
                user_id = %user_id,
                policy = ?self.store.policy(),
                error = %e,
                "Failed to persist challenge"
            );
            return Err(e.into());
        }

        tracing::info!(user_id = %user_id, "Challenge issued");

        Ok(challenge)
    }
}
