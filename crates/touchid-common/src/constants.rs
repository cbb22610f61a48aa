//! Shared constants for the challenge issuer.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default store namespace (the "database" every key lives under)
pub const DEFAULT_DATABASE: &str = "touch-id";

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Upper bound on a single store round trip (10 seconds)
pub const STORE_TIMEOUT_SECS: u64 = 10;

/// Token bucket burst size
pub const BUCKET_CAPACITY: u64 = 20;

/// Tokens added per refill tick
pub const BUCKET_REFILL_QUANTUM: u64 = 1;

/// Refill tick length in milliseconds
pub const BUCKET_REFILL_INTERVAL_MS: u64 = 1000;

/// Maximum accepted request body (100 KiB)
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Plain-text body returned with a 429
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded";

/// Redis key layout
pub mod redis_keys {
    /// Latest claim per user (upsert policy): {db}:challenge:{user_id}
    pub const CHALLENGE_PREFIX: &str = "challenge:";

    /// Append-only claim history per user (insert policy): {db}:challenge_log:{user_id}
    pub const CHALLENGE_LOG_PREFIX: &str = "challenge_log:";
}
