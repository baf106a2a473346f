//! DJ Rank server (djrank-server) - Main entry point
//!
//! Serves the performer store over HTTP. Storage is SQLite by default or an
//! in-memory map for throwaway sessions.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use djrank_common::api::FailedAttemptLimiter;
use djrank_common::config::{Backend, ConfigFile, ServerConfig, ServerOverrides, ADMIN_SECRET_ENV};
use djrank_common::db::init_database;
use djrank_common::events::EventBus;
use djrank_common::gateway::{MemoryGateway, SqliteGateway};
use djrank_common::Gateway;
use djrank_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired lockout records are dropped
const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Command-line arguments for djrank-server
#[derive(Parser, Debug)]
#[command(name = "djrank-server")]
#[command(about = "DJ Rank performer store and HTTP API")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "DJRANK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long, env = "DJRANK_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DJRANK_PORT")]
    port: Option<u16>,

    /// Storage backend: sqlite or memory
    #[arg(long, env = "DJRANK_BACKEND")]
    backend: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "DJRANK_DATABASE")]
    database: Option<PathBuf>,

    /// Admin secret; mutations are refused when unset
    #[arg(long, env = ADMIN_SECRET_ENV, hide_env_values = true)]
    admin_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "djrank_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting DJ Rank server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let file = ConfigFile::load(args.config.as_deref()).context("Failed to load configuration")?;
    let backend = args
        .backend
        .as_deref()
        .map(str::parse::<Backend>)
        .transpose()
        .context("Invalid --backend")?;
    let config = ServerConfig::resolve(
        ServerOverrides {
            bind: args.bind,
            port: args.port,
            backend,
            database_path: args.database,
            admin_secret: args.admin_secret,
        },
        &file,
    );

    let gateway = open_gateway(&config).await?;
    info!("Storage backend: {}", gateway.backend_name());

    if config.admin_secret.is_none() {
        warn!(
            "No admin secret configured ({}); all mutations will be refused",
            ADMIN_SECRET_ENV
        );
    }

    let state = AppState::new(gateway, config.admin_secret.clone())
        .with_limiter(FailedAttemptLimiter::new(
            config.max_failed_attempts,
            config.lockout_window,
        ))
        .with_events(Arc::new(EventBus::new(config.event_capacity)));

    spawn_limiter_pruning(state.limiter.clone());

    let app = build_router(state);

    let addr = config.listen_address();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn open_gateway(config: &ServerConfig) -> Result<Arc<dyn Gateway>> {
    match config.backend {
        Backend::Sqlite => {
            info!("Database: {}", config.database_path.display());
            let pool = init_database(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            Ok(Arc::new(SqliteGateway::new(pool)))
        }
        Backend::Memory => {
            warn!("Using in-memory storage; records are lost on shutdown");
            Ok(Arc::new(MemoryGateway::new()))
        }
    }
}

fn spawn_limiter_pruning(limiter: Arc<FailedAttemptLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = limiter.prune_expired_at(Instant::now());
            if pruned > 0 {
                info!("Pruned {} expired lockout records", pruned);
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
