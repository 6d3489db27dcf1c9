/// Workflow run endpoint
///
/// Runs a submitted graph to completion and answers with the recorded callback
/// stream plus the run report. Graph-level failures (cycles, dangling edges,
/// duplicate ids) answer 422 without executing anything.

use crate::runtime::{
    engine::{ExecutionEngine, RunReport},
    events::{EventRecorder, RunEvent},
};
use crate::workflow::types::WorkflowGraph;
use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Execution engine shared by every request
    pub engine: Arc<ExecutionEngine>,
    /// Cancelled on server shutdown; each run gets a child token
    pub shutdown: CancellationToken,
}

/// Response body for a finished run
#[derive(Debug, Serialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub report: RunReport,
    /// Callback invocations in the order they fired
    pub events: Vec<RunEvent>,
}

/// Create workflow run routes
pub fn create_run_routes() -> Router<AppState> {
    Router::new().route("/api/runs", post(run_workflow))
}

/// Run a workflow graph
///
/// POST /api/runs
/// Body: { "nodes": [...], "edges": [...] }
async fn run_workflow(
    State(state): State<AppState>,
    Json(graph): Json<WorkflowGraph>,
) -> Result<Json<RunResponse>, (StatusCode, Json<Value>)> {
    tracing::info!(
        "📥 Run request received: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    let recorder = EventRecorder::new();
    // Dropping the guard (client went away, or the run finished) cancels the run token
    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state.engine.execute_workflow(&graph, &recorder, cancel).await {
        Ok(report) => Ok(Json(RunResponse {
            report,
            events: recorder.into_events(),
        })),
        Err(e) => {
            tracing::warn!("❌ Rejected workflow run: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}
