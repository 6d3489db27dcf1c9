/// Error taxonomy for graph ordering and node execution
///
/// Run-level errors (`GraphError`) stop a run before any node executes.
/// Node-level errors (`NodeError`) are caught at the node boundary and reported
/// through the progress callbacks; their `Display` text is the message the caller sees.

use thiserror::Error;

/// Fatal, whole-run errors detected while ordering the graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node/edge set is not acyclic
    #[error("Workflow contains a cycle among nodes [{}] - cannot execute", nodes.join(", "))]
    Cycle {
        /// Ids of every node that could not be ordered
        nodes: Vec<String>,
    },

    /// An edge references a node id that is not in the node list
    #[error("Edge '{edge_source}' -> '{edge_target}' references unknown node '{missing}'")]
    UnknownNode {
        edge_source: String,
        edge_target: String,
        missing: String,
    },

    /// Two nodes share the same id
    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),
}

/// Node-local failures, reported via `on_node_error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A required input or configuration value is missing or empty
    #[error("{0}")]
    Validation(String),

    /// The remote generation service failed or returned no usable result
    #[error("{0}")]
    Upstream(String),

    /// The remote call exceeded the configured per-call timeout
    #[error("Generation request timed out after {0}s")]
    Timeout(u64),

    /// The run was cancelled while this node was waiting on its remote call
    #[error("Run cancelled")]
    Cancelled,
}

impl NodeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}

/// Failure reported by a `GenerationService` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status
    #[error("Service rejected request with status {status}")]
    Rejected {
        status: u16,
        /// `error` or `message` field of the response body, verbatim
        message: Option<String>,
    },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Convert into a node error, preferring the service's own error text
    pub fn into_node_error(self, fallback: &str) -> NodeError {
        match self {
            ServiceError::Rejected { message: Some(message), .. } if !message.is_empty() => {
                NodeError::Upstream(message)
            }
            ServiceError::Rejected { .. } => NodeError::upstream(fallback),
            ServiceError::Transport(detail) | ServiceError::InvalidResponse(detail) => {
                NodeError::Upstream(format!("{}: {}", fallback, detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_displayed_verbatim() {
        let err = NodeError::validation("Image generation requires a prompt");
        assert_eq!(err.to_string(), "Image generation requires a prompt");
    }

    #[test]
    fn rejected_service_error_keeps_service_text() {
        let err = ServiceError::Rejected {
            status: 402,
            message: Some("Insufficient credits".to_string()),
        };
        assert_eq!(
            err.into_node_error("Image generation failed"),
            NodeError::upstream("Insufficient credits")
        );
    }

    #[test]
    fn rejected_without_body_uses_fallback() {
        let err = ServiceError::Rejected { status: 500, message: None };
        assert_eq!(
            err.into_node_error("Video generation failed").to_string(),
            "Video generation failed"
        );
    }

    #[test]
    fn cycle_error_lists_nodes() {
        let err = GraphError::Cycle {
            nodes: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "Workflow contains a cycle among nodes [a, b] - cannot execute"
        );
    }
}
