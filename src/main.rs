/// Mediaflow: dependency-ordered execution of content generation pipelines
///
/// Main entry point for the Mediaflow server. Loads configuration from the
/// environment and starts the HTTP server.

use mediaflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow execution at POST /api/runs
/// - Health check at /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (defaults to 0.0.0.0:3004, sequential execution)
    let config = Config::default();

    start_server(config).await
}
