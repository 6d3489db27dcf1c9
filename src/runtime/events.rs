/// Progress callbacks emitted while a run executes
///
/// The orchestrator reports to an `ExecutionCallbacks` implementation; callers pick
/// the transport. `EventRecorder` keeps an ordered log, used by the HTTP API and tests.

use crate::workflow::types::OutputBag;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Receiver of per-node progress notifications
///
/// Only invoked during the executing phase. Start and complete fire for generative
/// nodes only; error fires for any node kind.
pub trait ExecutionCallbacks: Send + Sync {
    fn on_node_start(&self, node_id: &str);

    fn on_node_complete(&self, node_id: &str, output: &OutputBag);

    fn on_node_error(&self, node_id: &str, message: &str);
}

/// One recorded callback invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    #[serde(rename_all = "camelCase")]
    NodeStart { node_id: String },

    #[serde(rename_all = "camelCase")]
    NodeComplete { node_id: String, output: OutputBag },

    #[serde(rename_all = "camelCase")]
    NodeError { node_id: String, message: String },
}

impl RunEvent {
    pub fn node_id(&self) -> &str {
        match self {
            RunEvent::NodeStart { node_id }
            | RunEvent::NodeComplete { node_id, .. }
            | RunEvent::NodeError { node_id, .. } => node_id,
        }
    }
}

/// Callbacks that record every invocation in order
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<RunEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<RunEvent> {
        self.lock().clone()
    }

    pub fn into_events(self) -> Vec<RunEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: RunEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RunEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExecutionCallbacks for EventRecorder {
    fn on_node_start(&self, node_id: &str) {
        self.push(RunEvent::NodeStart {
            node_id: node_id.to_string(),
        });
    }

    fn on_node_complete(&self, node_id: &str, output: &OutputBag) {
        self.push(RunEvent::NodeComplete {
            node_id: node_id.to_string(),
            output: output.clone(),
        });
    }

    fn on_node_error(&self, node_id: &str, message: &str) {
        self.push(RunEvent::NodeError {
            node_id: node_id.to_string(),
            message: message.to_string(),
        });
    }
}
