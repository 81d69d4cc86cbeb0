use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gffree_core::{
    load_config, load_config_from_env, validate_config, Config, ProxyEndpoint, ResultCache,
    SanitizedConfig, Unit3dClient,
};
use gffree_server::{api::create_router, state::AppState};

/// Environment variable naming the config file
const CONFIG_PATH_ENV: &str = "GFFREE_CONFIG";

/// Config file used when `GFFREE_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = read_config()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!("Configuration loaded successfully");
    info!(
        base_url = %sanitized.upstream.base_url,
        api_token_configured = sanitized.upstream.api_token_configured,
        min_age_hours = sanitized.filter.min_age_hours,
        max_pages = sanitized.filter.max_pages,
        results_limit = sanitized.filter.results_limit,
        cache_ttl_secs = sanitized.cache.ttl_secs,
        "Upstream and filter settings"
    );
    if !sanitized.upstream.api_token_configured {
        warn!("No upstream API token configured; callers must pass apikey");
    }

    let client = Unit3dClient::new(&config.upstream).context("Failed to create upstream client")?;
    let cache = Arc::new(ResultCache::from_config(&config.cache));
    let endpoint = ProxyEndpoint::from_config(&config, Arc::new(client), cache)
        .context("Failed to build Torznab endpoint")?;

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, endpoint));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// An explicit `GFFREE_CONFIG` must exist; a missing default file falls back
/// to defaults plus environment.
fn read_config() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return load_from(&PathBuf::from(path));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        return load_from(default_path);
    }

    info!("No {} found, using defaults and environment", DEFAULT_CONFIG_PATH);
    load_config_from_env().context("Failed to load config from environment")
}

fn load_from(path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
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

    info!("Shutdown signal received");
}
