//! # RingCaptcha Server
//!
//! Issues ring-counting captchas over JSON-RPC and verifies the answers.
//!
//! ## Architecture
//! ```text
//! Client → POST /rpc → CaptchaManager → ring-painter (compose + PNG)
//!                          ↓                 ↓
//!                   AnswerRegistry      ImageStore → GET /image
//!                          ↑
//!                       Sweeper
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod captcha;
mod config;
mod registry;
mod routes;
mod state;

use captcha::sweeper_worker;
use config::AppConfig;
use state::AppState;

/// RingCaptcha Server - ring-pattern captcha service
#[derive(Parser, Debug)]
#[command(name = "ring-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/ring-server.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Store images on disk and serve them from /image (overrides config)
    #[arg(long, default_value = "false")]
    store_images: bool,

    /// Images folder (overrides config)
    #[arg(long, env = "IMAGES_FOLDER")]
    images_folder: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!(
        "🔥 Starting RingCaptcha Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!("📋 Configuration loaded from {}", args.config);

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state
    let state = AppState::new(config.clone())?;
    if config.storage.store_images {
        info!("🗂️ Images stored in {}", config.storage.images_folder);
    } else {
        info!("🗂️ Images returned inline");
    }

    // Spawn expiry sweeper
    let sweeper_shutdown = shutdown_tx.subscribe();
    let sweeper = tokio::spawn(sweeper_worker(
        state.manager.clone(),
        config.captcha.sweep_interval(),
        sweeper_shutdown,
    ));

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 RingCaptcha listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("🛑 Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    sweeper.await.context("Sweeper task failed")?;

    info!("👋 RingCaptcha shutdown complete");
    Ok(())
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
