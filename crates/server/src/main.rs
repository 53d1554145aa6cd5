use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaconv_core::{
    load_config, load_config_from_env, validate_config, ConversionService, Converter,
    FfmpegConverter, SessionStore, SqliteStore,
};
use mediaconv_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Pick up a local .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MEDIACONV_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("mediaconv.toml"));

    // Load configuration
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!(
            "No config file at {:?}, using defaults and environment",
            config_path
        );
        load_config_from_env().context("Failed to load config from environment")?
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Session timeout: {}s", config.session.timeout_secs);
    match config.cors.allowed_origin() {
        Some(origin) => info!("CORS origin: {}", origin),
        None => warn!("No CORS hostname configured; browsers on other origins will be refused"),
    }

    // Create SQLite session and file store
    let store = Arc::new(
        SqliteStore::new(&config.database.path, config.session.timeout())
            .context("Failed to create session store")?,
    );
    info!("Session store initialized");

    // Check the external converter
    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));
    match converter.validate().await {
        Ok(()) => info!(
            "Using converter {} at {:?}",
            converter.name(),
            config.converter.ffmpeg_path
        ),
        Err(e) => warn!("Converter unavailable, conversions will fail: {}", e),
    }

    let service = Arc::new(ConversionService::new(
        store.clone(),
        store.clone(),
        converter,
        &config.converter,
    ));

    let sweeper = spawn_session_sweeper(store, config.session.timeout());

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), service));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.abort();

    Ok(())
}

/// Remove expired sessions in the background, every half timeout.
///
/// Store operations sweep on their own; this keeps an idle server from
/// holding stale uploads.
fn spawn_session_sweeper(store: Arc<SqliteStore>, timeout: Duration) -> JoinHandle<()> {
    let period = (timeout / 2).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.sweep_expired()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Session sweep failed: {}", e),
                Err(e) => warn!("Session sweep task failed: {}", e),
            }
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
