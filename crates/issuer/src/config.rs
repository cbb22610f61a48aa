//! Configuration management for the issuer.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use touchid_common::ConflictPolicy;
use touchid_common::constants::{
    BUCKET_CAPACITY, BUCKET_REFILL_INTERVAL_MS, BUCKET_REFILL_QUANTUM, DEFAULT_DATABASE,
    DEFAULT_LISTEN_ADDR, DEFAULT_REDIS_URL, STORE_TIMEOUT_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Logical database; every key is namespaced under it
    #[serde(default = "default_database")]
    pub database: String,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Claim generation configuration
    #[serde(default)]
    pub challenge: ChallengeConfig,
}

/// Store-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// What a second issuance for the same user does
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Deadline for a single store round trip
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            timeout_secs: default_store_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Rate limiting configuration (global token bucket)
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Burst size; the bucket starts full
    #[serde(default = "default_capacity")]
    pub capacity: u64,

    /// Tokens added per refill tick
    #[serde(default = "default_refill_quantum")]
    pub refill_quantum: u64,

    /// Refill tick length in milliseconds
    #[serde(default = "default_refill_interval_ms")]
    pub refill_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_quantum: default_refill_quantum(),
            refill_interval_ms: default_refill_interval_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms)
    }
}

/// Claim generation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeConfig {
    /// Random bytes mixed into each claim digest (0 = timestamp only)
    #[serde(default)]
    pub extra_entropy_bytes: usize,
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_database() -> String { DEFAULT_DATABASE.to_string() }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_store_timeout() -> u64 { STORE_TIMEOUT_SECS } // 10 seconds
fn default_capacity() -> u64 { BUCKET_CAPACITY }
fn default_refill_quantum() -> u64 { BUCKET_REFILL_QUANTUM }
fn default_refill_interval_ms() -> u64 { BUCKET_REFILL_INTERVAL_MS } // 1 token/sec

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            Self::from_file(config_path)?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(ref database) = args.database {
            config.database = database.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .build()
            .context("Failed to load config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            bail!("database name must not be empty");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be at least 1");
        }
        if self.rate_limit.capacity == 0 {
            bail!("rate_limit.capacity must be at least 1");
        }
        if self.rate_limit.refill_quantum == 0 {
            bail!("rate_limit.refill_quantum must be at least 1");
        }
        if self.rate_limit.refill_interval_ms == 0 {
            bail!("rate_limit.refill_interval_ms must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            database: default_database(),
            listen_addr: default_listen_addr(),
            store: StoreConfig::default(),
            rate_limit: RateLimitConfig::default(),
            challenge: ChallengeConfig::default(),
        }
    }
}
