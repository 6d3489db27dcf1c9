/// Runtime Execution Engine
///
/// This module runs a submitted workflow graph end to end. It handles:
/// - Ordering nodes by dependency and driving each one (engine)
/// - Merging upstream outputs into a node's inputs (inputs)
/// - Per-kind node dispatch and remote generation calls (executor)
/// - Progress notifications to the caller (events)

// Orchestrator: ordering, scheduling and result bookkeeping
pub mod engine;

// Per-kind node handlers and the dispatch table
pub mod executor;

// Upstream output merging
pub mod inputs;

// Progress callbacks and the recording implementation
pub mod events;

// Re-export main types
pub use engine::{EngineOptions, ExecutionEngine, RunReport, RunState};
pub use events::{EventRecorder, ExecutionCallbacks, RunEvent};
pub use executor::{CallGuard, NodeExecutor, NodeHandler};
pub use inputs::collect_inputs;
