//! VulnScan HTTP Service
//!
//! Loads the hybrid vulnerability classifier once at startup and serves
//! `POST /scan` for single-snippet classification. Inference runs on the
//! blocking thread pool so the async executor keeps serving requests.

mod api;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use vulnscan_core::{LoggingConfig, VulnScanConfig};
use vulnscan_detector::VulnerabilityDetector;

use crate::api::{health_handler, root_handler, scan_handler, AppState};

#[derive(Parser, Debug)]
#[command(name = "vulnscan-server", about = "C/C++ vulnerability scanning service")]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long, env = "VULNSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen address.
    #[arg(long)]
    listen_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => VulnScanConfig::default(),
    };
    if let Some(addr) = cli.listen_addr {
        config.listen_addr = addr;
    }

    init_tracing(&config.logging);
    match &cli.config {
        Some(path) => info!(path = %path.display(), "Loaded configuration from file"),
        None => info!("No config file specified, using defaults"),
    }

    info!(
        listen_addr = %config.listen_addr,
        checkpoint = %config.model.checkpoint_path.display(),
        "Starting VulnScan server"
    );

    let state = build_app_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Load the detector described by `config`.
///
/// Any artifact problem fails startup; the service never runs without a
/// usable model.
async fn build_app_state(config: &VulnScanConfig) -> anyhow::Result<Arc<AppState>> {
    let detector = VulnerabilityDetector::from_config(&config.model)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize detector: {}", e))?;

    Ok(Arc::new(AppState {
        detector: Arc::new(detector),
    }))
}

/// Build the CORS layer from the configured origins.
///
/// Unparseable origins are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the axum [`Router`] with all routes.
fn build_router(state: Arc<AppState>, config: &VulnScanConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/scan", post(scan_handler))
        .layer(DefaultBodyLimit::max(config.max_request_size_bytes))
        .layer(cors_layer(&config.cors_allowed_origins))
        .with_state(state)
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received (Ctrl-C)"),
        _ = terminate => info!("Shutdown signal received (SIGTERM)"),
    }
}
