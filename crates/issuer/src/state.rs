//! Application state and shared resources.

use anyhow::{Context, Result};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::sync::Arc;

use crate::admission::TokenBucket;
use crate::challenge::store::{StoreError, with_deadline};
use crate::challenge::{ChallengeGenerator, ChallengeService, ChallengeStore, RedisChallengeStore};
use crate::config::AppConfig;

/// Shared application state
pub struct AppState<S> {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Issuance orchestration (owns the store handle)
    pub challenges: Arc<ChallengeService<S>>,

    /// Global admission bucket
    pub admission: Arc<TokenBucket>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            challenges: self.challenges.clone(),
            admission: self.admission.clone(),
        }
    }
}

impl<S: ChallengeStore> AppState<S> {
    /// Wire the services around an already-connected store
    pub fn with_store(config: AppConfig, store: S) -> Self {
        let generator = ChallengeGenerator::new(config.challenge.extra_entropy_bytes);
        let challenges = Arc::new(ChallengeService::new(generator, Arc::new(store)));
        let admission = Arc::new(TokenBucket::new(
            config.rate_limit.capacity,
            config.rate_limit.refill_quantum,
            config.rate_limit.refill_interval(),
        ));

        Self {
            config: Arc::new(config),
            challenges,
            admission,
        }
    }

    pub fn store(&self) -> &S {
        self.challenges.store()
    }
}

impl AppState<RedisChallengeStore> {
    /// Create new application state, connecting to Redis.
    ///
    /// Fails if the store cannot be reached; the caller aborts startup.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        // Connect to Redis with connection manager (handles reconnection)
        let client = redis::Client::open(config.redis_url.as_str())
            .context("Failed to create Redis client")?;

        // Bound the whole connect: the manager retries its first connection with backoff
        let timeout = config.store.timeout();
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout);
        let redis = with_deadline(timeout, async {
            Ok::<_, StoreError>(ConnectionManager::new_with_config(client, manager_config).await?)
        })
        .await
        .context("Failed to connect to Redis")?;

        let store = RedisChallengeStore::new(
            redis,
            config.database.clone(),
            config.store.conflict_policy,
            timeout,
        );

        store.ping().await.context("Redis did not answer PING")?;

        Ok(Self::with_store(config, store))
    }
}
