/// Workflow Definition Layer
///
/// Type definitions for the graphs callers submit and the ordering logic that
/// turns them into an execution sequence:
/// - Type definitions (WorkflowGraph, Node, Edge, NodeKind, OutputBag)
/// - petgraph-based dependency ordering with cycle detection

// Core workflow type definitions
pub mod types;

// Topological ordering over a petgraph DiGraph
pub mod graph;

// Re-export commonly used types
pub use graph::{execution_order, ExecutionGraph};
pub use types::{Edge, Node, NodeData, NodeKind, OutputBag, WorkflowGraph};
