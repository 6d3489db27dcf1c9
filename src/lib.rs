/// Mediaflow: dependency-ordered execution of content generation pipelines
///
/// This library runs small graphs of text, upload, image, video and audio
/// generation steps, feeding each step the outputs of the steps it depends on
/// and reporting per-node progress without letting one failure stop the run.

// Core configuration and setup
pub mod config;

// Error taxonomy shared by the graph, runtime and generation layers
pub mod error;

// Workflow definition layer - graph types and dependency ordering
pub mod workflow;

// Remote generation services - trait seam plus the HTTP client
pub mod generation;

// Runtime execution engine - orchestration, dispatch and progress callbacks
pub mod runtime;

// HTTP API layer - run submission endpoint
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use error::{GraphError, NodeError, ServiceError};
pub use generation::{GenerationService, HttpGenerationService};
pub use runtime::{EventRecorder, ExecutionCallbacks, ExecutionEngine, NodeExecutor, RunEvent, RunReport};
pub use server::start_server;
pub use workflow::{Edge, Node, NodeKind, OutputBag, WorkflowGraph};
