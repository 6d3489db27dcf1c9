/// Server setup and initialization
///
/// Wires together the generation client, node executor, execution engine and HTTP
/// routes, and runs the server until Ctrl-C.

use crate::{
    api::{create_run_routes, AppState},
    config::Config,
    generation::HttpGenerationService,
    runtime::{
        engine::{EngineOptions, ExecutionEngine},
        executor::NodeExecutor,
    },
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes
///
/// `shutdown` is cancelled when the server stops, which cancels in-flight runs.
pub fn create_app(config: &Config, shutdown: CancellationToken) -> Router {
    tracing::info!("🔗 Generation service at {}", config.generation.base_url);
    let service = Arc::new(HttpGenerationService::new(config.generation.base_url.clone()));

    tracing::info!("⚙️ Initializing node executor");
    let executor = Arc::new(NodeExecutor::new(service));

    let options = EngineOptions {
        call_timeout: config.generation.request_timeout(),
        max_parallel: config.generation.max_parallel.max(1),
    };
    tracing::info!(
        "🚀 Initializing execution engine (timeout: {:?}, max parallel: {})",
        options.call_timeout,
        options.max_parallel
    );
    let engine = Arc::new(ExecutionEngine::with_options(executor, options));

    let app_state = AppState { engine, shutdown };

    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Workflow execution API
        .merge(create_run_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");

    app
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // RUST_LOG overrides the default "info" filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Mediaflow server...");

    let shutdown = CancellationToken::new();
    let app = create_app(&config, shutdown.clone());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⏹️ Shutdown requested, cancelling in-flight runs");
        }
        signal.cancel();
    });

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
