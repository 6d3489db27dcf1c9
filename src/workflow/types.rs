/// Core workflow type definitions
///
/// Defines the graph a caller submits (nodes, edges) and the output bag each node
/// produces. Field names follow the canvas editor's JSON so saved graphs can be
/// deserialized directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-node configuration bag, specific to the node kind
pub type NodeData = Map<String, Value>;

/// A graph submitted for execution
///
/// Owned by the caller and never mutated by a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes in caller order
    pub nodes: Vec<Node>,
    /// Dependencies between nodes, in caller order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}

/// A single unit of work in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within the graph
    pub id: String,
    /// Kind name as sent by the editor (e.g. "image-gen")
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Kind-specific configuration
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data,
        }
    }

    /// Resolve the kind name; `None` for kinds the engine does not know
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_type_name(&self.node_type)
    }

    /// Whether this node performs a remote generation call
    pub fn is_generative(&self) -> bool {
        self.kind().is_some_and(NodeKind::is_generative)
    }
}

/// Closed set of node kinds the engine can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Static text, passed through as `text`
    Text,
    /// Reference to an already-uploaded file
    Upload,
    /// Text-to-image synthesis
    #[serde(rename = "image-gen", alias = "image-generation")]
    ImageGen,
    /// Image + motion reference video to video synthesis
    #[serde(rename = "video-gen", alias = "video-generation")]
    VideoGen,
    /// Text-to-speech synthesis
    #[serde(rename = "audio", alias = "audio-generation")]
    Audio,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Text,
        NodeKind::Upload,
        NodeKind::ImageGen,
        NodeKind::VideoGen,
        NodeKind::Audio,
    ];

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(NodeKind::Text),
            "upload" => Some(NodeKind::Upload),
            "image-gen" | "image-generation" => Some(NodeKind::ImageGen),
            "video-gen" | "video-generation" => Some(NodeKind::VideoGen),
            "audio" | "audio-generation" => Some(NodeKind::Audio),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Upload => "upload",
            NodeKind::ImageGen => "image-gen",
            NodeKind::VideoGen => "video-gen",
            NodeKind::Audio => "audio",
        }
    }

    /// Generative kinds make exactly one remote call and are reported via
    /// start/complete callbacks
    pub fn is_generative(self) -> bool {
        matches!(self, NodeKind::ImageGen | NodeKind::VideoGen | NodeKind::Audio)
    }
}

/// Directed dependency: `target` consumes `source`'s output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Producer node ID
    pub source: String,
    /// Consumer node ID
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }
}

/// Named result values one node produces for its dependents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl OutputBag {
    pub fn is_empty(&self) -> bool {
        *self == OutputBag::default()
    }

    /// Overlay every slot `other` sets onto `self`; unset slots leave `self` untouched
    pub fn merge_from(&mut self, other: &OutputBag) {
        fn overlay(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        overlay(&mut self.text, &other.text);
        overlay(&mut self.file_url, &other.file_url);
        overlay(&mut self.file_type, &other.file_type);
        overlay(&mut self.image_url, &other.image_url);
        overlay(&mut self.video_url, &other.video_url);
        overlay(&mut self.audio_url, &other.audio_url);
    }
}
