/// HTTP API Layer
///
/// This module exposes the execution engine over HTTP. It handles:
/// - Accepting a workflow graph and running it to completion
/// - Returning the recorded per-node events and outputs

// Workflow run endpoint (POST /api/runs)
pub mod runs;

// Re-export router builder
pub use runs::{create_run_routes, AppState};
