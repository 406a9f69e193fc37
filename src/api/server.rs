//! HTTP server for the Bespoke Model service.
//!
//! Axum router with permissive CORS, request tracing, and graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;

/// Server configuration, passed in at startup. There is no global mutable
/// state; everything the handlers need lives here.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The Bespoke Model template workbook to copy and fill.
    pub template_path: PathBuf,
    /// Where generated files are written and served from.
    pub temp_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            template_path: PathBuf::from("Bespoke Model - US - v2.xlsm"),
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub config: ServerConfig,
}

/// Build the router. Separated from `run_server` so tests can drive it
/// without binding a socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/api/process", post(handlers::process))
        .route("/api/project", post(handlers::project))
        .route("/api/download/:filename", get(handlers::download))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bespoke_server=info,bespoke_model=info,tower_http=info".into()),
        )
        .init();

    info!("Template: {}", config.template_path.display());
    if !config.template_path.exists() {
        tracing::warn!(
            "Template file not found at {}; /api/process requests will fail until it is in place",
            config.template_path.display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        config,
    });
    let app = build_router(state);

    info!("Bespoke Model server starting on http://{}", addr);
    info!("   Endpoints: POST /api/process, POST /api/project, GET /api/download/:filename");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bespoke Model server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
