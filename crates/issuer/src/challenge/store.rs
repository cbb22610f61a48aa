//! Challenge persistence.
//!
//! The store owns the persisted representation of a [`Challenge`]. Every
//! round trip is bounded by a deadline; nothing is retried here.

use std::future::Future;
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::{ConnectionLike, ConnectionManager};
use thiserror::Error;
use touchid_common::constants::redis_keys;
use touchid_common::{Challenge, ConflictPolicy, TouchIdError};

/// Failures reported by a [`ChallengeStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for TouchIdError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout(_) => TouchIdError::StoreTimeout(err.to_string()),
            StoreError::Encode(_) => TouchIdError::Internal(err.to_string()),
            StoreError::Redis(_) | StoreError::Unavailable(_) => {
                TouchIdError::StoreUnavailable(err.to_string())
            }
        }
    }
}

/// Persistent home for issued challenges
pub trait ChallengeStore: Send + Sync + 'static {
    /// Persist a challenge according to [`ChallengeStore::policy`]
    fn persist(&self, challenge: &Challenge) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Cheap liveness round trip
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn policy(&self) -> ConflictPolicy;
}

/// Run a store future, failing with [`StoreError::Timeout`] past `limit`
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Redis-backed store.
///
/// Generic over the connection so the command stream can be checked without
/// a server; production uses the auto-reconnecting [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisChallengeStore<C = ConnectionManager> {
    redis: C,
    /// Key namespace, one per logical database
    namespace: String,
    policy: ConflictPolicy,
    timeout: Duration,
}

impl<C> RedisChallengeStore<C> {
    pub fn new(
        redis: C,
        namespace: impl Into<String>,
        policy: ConflictPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
            policy,
            timeout,
        }
    }

    fn key_for(&self, user_id: &str) -> String {
        record_key(&self.namespace, self.policy, user_id)
    }
}

/// Key a user's record lives under for a given policy
pub fn record_key(namespace: &str, policy: ConflictPolicy, user_id: &str) -> String {
    let prefix = match policy {
        ConflictPolicy::Upsert => redis_keys::CHALLENGE_PREFIX,
        ConflictPolicy::Insert => redis_keys::CHALLENGE_LOG_PREFIX,
    };
    format!("{}:{}{}", namespace, prefix, user_id)
}

impl<C> ChallengeStore for RedisChallengeStore<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    async fn persist(&self, challenge: &Challenge) -> Result<(), StoreError> {
        let key = self.key_for(&challenge.user_id);
        let value = serde_json::to_string(challenge)?;
        let mut conn = self.redis.clone();

        with_deadline(self.timeout, async {
            match self.policy {
                ConflictPolicy::Upsert => conn.set::<_, _, ()>(&key, &value).await?,
                ConflictPolicy::Insert => conn.rpush::<_, _, ()>(&key, &value).await?,
            }
            Ok::<(), StoreError>(())
        })
        .await?;

        tracing::debug!(
            key = %key,
            policy = ?self.policy,
            "Challenge persisted"
        );

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        with_deadline(self.timeout, async {
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            if pong == "PONG" {
                Ok::<(), StoreError>(())
            } else {
                Err(StoreError::Unavailable(format!("unexpected PING reply: {}", pong)))
            }
        })
        .await
    }

    fn policy(&self) -> ConflictPolicy {
        self.policy
    }
}

#[cfg(test)]
pub mod memory {
    //! In-process stand-ins for Redis used by the service and route tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Keeps records in a `Vec`, honoring the conflict policy
    pub struct MemoryChallengeStore {
        policy: ConflictPolicy,
        records: Mutex<Vec<Challenge>>,
        calls: AtomicUsize,
    }

    impl MemoryChallengeStore {
        pub fn new(policy: ConflictPolicy) -> Self {
            Self {
                policy,
                records: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn records_for(&self, user_id: &str) -> Vec<Challenge> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect()
        }

        pub fn persist_calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChallengeStore for MemoryChallengeStore {
        async fn persist(&self, challenge: &Challenge) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().unwrap();
            match self.policy {
                ConflictPolicy::Upsert => {
                    match records.iter_mut().find(|c| c.user_id == challenge.user_id) {
                        Some(existing) => existing.claim = challenge.claim.clone(),
                        None => records.push(challenge.clone()),
                    }
                }
                ConflictPolicy::Insert => records.push(challenge.clone()),
            }
            Ok(())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn policy(&self) -> ConflictPolicy {
            self.policy
        }
    }

    /// Always fails, as an unreachable store would
    pub struct UnreachableStore;

    impl ChallengeStore for UnreachableStore {
        async fn persist(&self, _challenge: &Challenge) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn policy(&self) -> ConflictPolicy {
            ConflictPolicy::Upsert
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryChallengeStore;
    use super::*;

    fn challenge(user_id: &str, claim: &str) -> Challenge {
        Challenge {
            user_id: user_id.to_string(),
            claim: claim.to_string(),
        }
    }

    #[test]
    fn test_record_key_layout() {
        assert_eq!(
            record_key("touch-id", ConflictPolicy::Upsert, "alice"),
            "touch-id:challenge:alice"
        );
        assert_eq!(
            record_key("touch-id", ConflictPolicy::Insert, "alice"),
            "touch-id:challenge_log:alice"
        );
    }

    #[tokio::test]
    async fn test_upsert_keeps_latest_only() {
        let store = MemoryChallengeStore::new(ConflictPolicy::Upsert);
        store.persist(&challenge("alice", "first")).await.unwrap();
        store.persist(&challenge("alice", "second")).await.unwrap();
        store.persist(&challenge("bob", "other")).await.unwrap();

        assert_eq!(store.records_for("alice"), vec![challenge("alice", "second")]);
        assert_eq!(store.records_for("bob").len(), 1);
    }

    #[tokio::test]
    async fn test_insert_accumulates_history() {
        let store = MemoryChallengeStore::new(ConflictPolicy::Insert);
        for i in 0..5 {
            store
                .persist(&challenge("alice", &format!("claim-{}", i)))
                .await
                .unwrap();
        }
        assert_eq!(store.records_for("alice").len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let result: Result<(), _> = with_deadline(
            Duration::from_secs(10),
            std::future::pending::<Result<(), StoreError>>(),
        )
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_deadline_passes_through_result() {
        let ok = with_deadline(Duration::from_secs(10), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = with_deadline(Duration::from_secs(10), async {
            Err::<(), _>(StoreError::Unavailable("down".into()))
        })
        .await;
        assert!(matches!(err, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_store_errors_map_to_server_errors() {
        let timeout: TouchIdError = StoreError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(timeout.status_code(), 504);
        let down: TouchIdError = StoreError::Unavailable("refused".into()).into();
        assert_eq!(down.status_code(), 503);
    }

    mod redis_commands {
        use super::*;
        use redis::{ErrorKind, RedisError};
        use redis_test::{MockCmd, MockRedisConnection};

        fn store(policy: ConflictPolicy, commands: Vec<MockCmd>) -> RedisChallengeStore<MockRedisConnection> {
            RedisChallengeStore::new(
                MockRedisConnection::new(commands),
                "touch-id",
                policy,
                Duration::from_secs(10),
            )
        }

        fn record(claim: &str) -> String {
            format!(r#"{{"userId":"alice","claim":"{}"}}"#, claim)
        }

        #[tokio::test]
        async fn test_upsert_overwrites_with_set() {
            let store = store(
                ConflictPolicy::Upsert,
                vec![
                    MockCmd::new(
                        redis::cmd("SET").arg("touch-id:challenge:alice").arg(record("first")),
                        Ok("OK"),
                    ),
                    MockCmd::new(
                        redis::cmd("SET").arg("touch-id:challenge:alice").arg(record("second")),
                        Ok("OK"),
                    ),
                ],
            );

            store.persist(&challenge("alice", "first")).await.unwrap();
            store.persist(&challenge("alice", "second")).await.unwrap();
        }

        #[tokio::test]
        async fn test_insert_appends_with_rpush() {
            let commands = (1..=3i64)
                .map(|n| {
                    MockCmd::new(
                        redis::cmd("RPUSH")
                            .arg("touch-id:challenge_log:alice")
                            .arg(record(&format!("claim-{}", n))),
                        Ok(n),
                    )
                })
                .collect();
            let store = store(ConflictPolicy::Insert, commands);

            for n in 1..=3 {
                store
                    .persist(&challenge("alice", &format!("claim-{}", n)))
                    .await
                    .unwrap();
            }
        }

        #[tokio::test]
        async fn test_policy_picks_the_command() {
            // An upsert store must never append to the history list
            let store = store(
                ConflictPolicy::Upsert,
                vec![MockCmd::new(
                    redis::cmd("RPUSH").arg("touch-id:challenge_log:alice").arg(record("x")),
                    Ok(1i64),
                )],
            );
            assert!(store.persist(&challenge("alice", "x")).await.is_err());
        }

        #[tokio::test]
        async fn test_redis_failure_is_unavailable() {
            let store = store(
                ConflictPolicy::Upsert,
                vec![MockCmd::new(
                    redis::cmd("SET").arg("touch-id:challenge:alice").arg(record("x")),
                    Err::<String, _>(RedisError::from((ErrorKind::IoError, "connection reset"))),
                )],
            );

            let err = store.persist(&challenge("alice", "x")).await.unwrap_err();
            assert!(matches!(err, StoreError::Redis(_)));
            assert_eq!(TouchIdError::from(err).status_code(), 503);
        }

        #[tokio::test]
        async fn test_ping_checks_reply() {
            let store = store(
                ConflictPolicy::Upsert,
                vec![
                    MockCmd::new(redis::cmd("PING"), Ok("PONG")),
                    MockCmd::new(redis::cmd("PING"), Ok("LOADING")),
                ],
            );

            assert!(store.ping().await.is_ok());
            assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        }
    }
}
