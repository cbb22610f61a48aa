//! # Issuer - Touch-ID Challenge Service
//!
//! Issues single-use challenges for platform-authenticator sign-in. A client
//! posts its user id, receives a claim, and signs it locally.
//!
//! ## Architecture
//! ```text
//! Client → Admission (token bucket) → Issuer → Redis (challenges)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod admission;
mod challenge;
mod config;
mod routes;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

/// Touch-ID Challenge Issuer
#[derive(Parser, Debug)]
#[command(name = "issuer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/issuer.toml")]
    config: String,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Store database / key namespace (overrides config)
    #[arg(long, env = "STORE_DATABASE")]
    database: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env feeds the clap `env` fallbacks, so it is read before parsing
    let dotenv = load_dotenv()?;

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("🔐 Starting Touch-ID issuer v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        info!("📄 Environment loaded from {}", path.display());
    }

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(
        database = %config.database,
        policy = ?config.store.conflict_policy,
        "📋 Configuration loaded from {}",
        args.config
    );

    // Connect to the store; any failure here aborts startup
    let state = AppState::connect(config.clone()).await?;
    info!("✅ Redis connected: {}", config.redis_url);
    info!(
        capacity = state.admission.capacity(),
        refill_quantum = config.rate_limit.refill_quantum,
        refill_interval_ms = config.rate_limit.refill_interval_ms,
        "🪣 Admission bucket ready"
    );

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Issuer listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Issuer shutdown complete");
    Ok(())
}

/// Load `.env` if present; a malformed file is fatal
fn load_dotenv() -> Result<Option<std::path::PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("Failed to load .env"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}
