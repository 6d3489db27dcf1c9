/// Node execution handlers for the built-in node kinds
///
/// Each kind is bound to a `NodeHandler` in a lookup table built at construction:
/// - text: passes its configured text through
/// - upload: exposes a stored file under the slot matching its media type
/// - image-gen / video-gen / audio: validate inputs, make one remote call, pick the
///   result URL out of the response
///
/// Node types outside the table resolve to `NoopHandler` and produce an empty bag.

use crate::error::NodeError;
use crate::generation::{AudioRequest, GenerationService, ImageRequest, VideoRequest};
use crate::workflow::types::{Node, NodeData, NodeKind, OutputBag};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_IMAGE_MODEL: &str = "google/nano-banana";
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";
pub const DEFAULT_VIDEO_MODE: &str = "pro";
pub const DEFAULT_VOICE: &str = "alloy";

/// Limits applied to every outbound generation call
#[derive(Debug, Clone, Default)]
pub struct CallGuard {
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl CallGuard {
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await `call`, giving up on cancellation or when the timeout elapses
    pub async fn run<T>(&self, call: impl Future<Output = T>) -> Result<T, NodeError> {
        let limited = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| NodeError::Timeout(limit.as_secs())),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NodeError::Cancelled),
            result = limited => result,
        }
    }
}

/// Execution contract shared by every node kind
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn execute(
        &self,
        data: &NodeData,
        inputs: &OutputBag,
        guard: &CallGuard,
    ) -> Result<OutputBag, NodeError>;
}

/// Dispatches a node to the handler registered for its kind
pub struct NodeExecutor {
    handlers: HashMap<NodeKind, Arc<dyn NodeHandler>>,
    fallback: Arc<dyn NodeHandler>,
}

impl fmt::Debug for NodeExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(|kind| kind.type_name()).collect();
        kinds.sort_unstable();
        f.debug_struct("NodeExecutor").field("kinds", &kinds).finish()
    }
}

impl NodeExecutor {
    /// Executor with every built-in kind bound to its handler
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        let mut handlers: HashMap<NodeKind, Arc<dyn NodeHandler>> = HashMap::new();
        handlers.insert(NodeKind::Text, Arc::new(TextHandler));
        handlers.insert(NodeKind::Upload, Arc::new(UploadHandler));
        handlers.insert(
            NodeKind::ImageGen,
            Arc::new(ImageGenHandler::new(Arc::clone(&service))),
        );
        handlers.insert(
            NodeKind::VideoGen,
            Arc::new(VideoGenHandler::new(Arc::clone(&service))),
        );
        handlers.insert(NodeKind::Audio, Arc::new(AudioHandler::new(service)));

        Self {
            handlers,
            fallback: Arc::new(NoopHandler),
        }
    }

    /// Replace the handler bound to `kind`
    pub fn register(&mut self, kind: NodeKind, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(kind, handler);
    }

    fn handler_for(&self, node: &Node) -> &Arc<dyn NodeHandler> {
        node.kind()
            .and_then(|kind| self.handlers.get(&kind))
            .unwrap_or(&self.fallback)
    }

    /// Execute a single node against its merged inputs
    pub async fn execute_node(
        &self,
        node: &Node,
        inputs: &OutputBag,
        guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        tracing::debug!("🚀 Executing node '{}' (type: {})", node.id, node.node_type);
        if node.kind().is_none() {
            tracing::debug!("⏭️ No handler for type '{}', producing empty output", node.node_type);
        }

        let start_time = std::time::Instant::now();
        let result = self.handler_for(node).execute(&node.data, inputs, guard).await;
        let duration = start_time.elapsed();

        match &result {
            Ok(output) => {
                tracing::debug!("✅ Node '{}' produced {:?} in {:?}", node.id, output, duration)
            }
            Err(e) => tracing::warn!("❌ Node '{}' failed in {:?}: {}", node.id, duration, e),
        }

        result
    }
}

/// Non-empty string value of a configuration key
fn config_str<'d>(data: &'d NodeData, key: &str) -> Option<&'d str> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Upstream input when non-empty, otherwise the node's own configuration
fn resolve<'v>(input: Option<&'v str>, data: &'v NodeData, key: &str) -> Option<&'v str> {
    input
        .filter(|value| !value.is_empty())
        .or_else(|| config_str(data, key))
}

fn url_field(value: &Value) -> Option<String> {
    value
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Emits the configured text, or an empty string
pub struct TextHandler;

#[async_trait]
impl NodeHandler for TextHandler {
    async fn execute(
        &self,
        data: &NodeData,
        _inputs: &OutputBag,
        _guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        Ok(OutputBag {
            text: Some(config_str(data, "text").unwrap_or_default().to_string()),
            ..Default::default()
        })
    }
}

/// Exposes an uploaded file under `fileUrl` and its media-specific slot
pub struct UploadHandler;

#[async_trait]
impl NodeHandler for UploadHandler {
    async fn execute(
        &self,
        data: &NodeData,
        _inputs: &OutputBag,
        _guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        let file_url = config_str(data, "fileUrl").map(str::to_string);
        let file_type = config_str(data, "fileType").map(str::to_string);
        let media_url = |media: &str| {
            if file_type.as_deref() == Some(media) {
                file_url.clone()
            } else {
                None
            }
        };

        Ok(OutputBag {
            image_url: media_url("image"),
            video_url: media_url("video"),
            audio_url: media_url("audio"),
            file_url: file_url.clone(),
            file_type: file_type.clone(),
            ..Default::default()
        })
    }
}

/// Text-to-image generation
pub struct ImageGenHandler {
    service: Arc<dyn GenerationService>,
}

impl ImageGenHandler {
    pub const PROMPT_REQUIRED: &'static str = "Image generation requires a prompt";

    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl NodeHandler for ImageGenHandler {
    async fn execute(
        &self,
        data: &NodeData,
        inputs: &OutputBag,
        guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        let prompt = resolve(inputs.text.as_deref(), data, "prompt")
            .unwrap_or_default()
            .trim();
        if prompt.is_empty() {
            return Err(NodeError::validation(Self::PROMPT_REQUIRED));
        }

        let request = ImageRequest {
            prompt: prompt.to_string(),
            model: config_str(data, "model").unwrap_or(DEFAULT_IMAGE_MODEL).to_string(),
            enhance_prompt: data
                .get("enhancePrompt")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            aspect_ratio: config_str(data, "aspectRatio")
                .unwrap_or(DEFAULT_ASPECT_RATIO)
                .to_string(),
        };

        let body = guard
            .run(self.service.generate_image(request))
            .await?
            .map_err(|e| e.into_node_error("Image generation failed"))?;

        let image_url = body
            .get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(url_field)
            .or_else(|| body.get("image").and_then(url_field))
            .ok_or_else(|| NodeError::upstream("No image URL in response"))?;

        Ok(OutputBag {
            image_url: Some(image_url),
            ..Default::default()
        })
    }
}

/// Image + reference video to video generation
pub struct VideoGenHandler {
    service: Arc<dyn GenerationService>,
}

impl VideoGenHandler {
    pub const INPUTS_REQUIRED: &'static str = "Video generation requires image and video inputs";

    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl NodeHandler for VideoGenHandler {
    async fn execute(
        &self,
        data: &NodeData,
        inputs: &OutputBag,
        guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        let image_url = resolve(inputs.image_url.as_deref(), data, "imageUrl");
        let video_url = resolve(inputs.video_url.as_deref(), data, "videoUrl");
        let (Some(image_url), Some(video_url)) = (image_url, video_url) else {
            return Err(NodeError::validation(Self::INPUTS_REQUIRED));
        };

        let request = VideoRequest {
            image_url: image_url.to_string(),
            video_url: video_url.to_string(),
            prompt: resolve(inputs.text.as_deref(), data, "prompt")
                .unwrap_or_default()
                .to_string(),
            mode: config_str(data, "mode").unwrap_or(DEFAULT_VIDEO_MODE).to_string(),
        };

        let body = guard
            .run(self.service.generate_video(request))
            .await?
            .map_err(|e| e.into_node_error("Video generation failed"))?;

        let video_url = body
            .get("video")
            .and_then(url_field)
            .ok_or_else(|| NodeError::upstream("No video URL in response"))?;

        Ok(OutputBag {
            video_url: Some(video_url),
            ..Default::default()
        })
    }
}

/// Text-to-speech generation
pub struct AudioHandler {
    service: Arc<dyn GenerationService>,
}

impl AudioHandler {
    pub const TEXT_REQUIRED: &'static str = "Audio generation requires text input";

    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl NodeHandler for AudioHandler {
    async fn execute(
        &self,
        data: &NodeData,
        inputs: &OutputBag,
        guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        let text = resolve(inputs.text.as_deref(), data, "text")
            .unwrap_or_default()
            .trim();
        if text.is_empty() {
            return Err(NodeError::validation(Self::TEXT_REQUIRED));
        }

        let request = AudioRequest {
            text: text.to_string(),
            voice: config_str(data, "voice").unwrap_or(DEFAULT_VOICE).to_string(),
        };

        let body = guard
            .run(self.service.generate_audio(request))
            .await?
            .map_err(|e| e.into_node_error("Audio generation failed"))?;

        // `audio.url` first, then a bare top-level `url`
        let audio_url = body
            .get("audio")
            .and_then(url_field)
            .or_else(|| url_field(&body))
            .ok_or_else(|| NodeError::upstream("No audio URL in response"))?;

        Ok(OutputBag {
            audio_url: Some(audio_url),
            ..Default::default()
        })
    }
}

/// Handler for node types the engine does not recognise
pub struct NoopHandler;

#[async_trait]
impl NodeHandler for NoopHandler {
    async fn execute(
        &self,
        _data: &NodeData,
        _inputs: &OutputBag,
        _guard: &CallGuard,
    ) -> Result<OutputBag, NodeError> {
        Ok(OutputBag::default())
    }
}
