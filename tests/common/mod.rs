//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mediaflow::error::ServiceError;
use mediaflow::generation::{AudioRequest, GenerationService, ImageRequest, VideoRequest};
use mediaflow::runtime::{EngineOptions, ExecutionEngine, NodeExecutor};
use mediaflow::workflow::{Edge, Node, WorkflowGraph};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const IMAGE_URL: &str = "https://cdn.test/image.png";
pub const VIDEO_URL: &str = "https://cdn.test/video.mp4";
pub const AUDIO_URL: &str = "https://cdn.test/audio.mp3";

/// A request the scripted service received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Image(ImageRequest),
    Video(VideoRequest),
    Audio(AudioRequest),
}

type Reply = Result<Value, ServiceError>;

/// In-memory generation service with queued replies per kind
///
/// When a queue is empty it answers with a successful body pointing at the
/// `*_URL` constants.
#[derive(Default)]
pub struct ScriptedService {
    image: Mutex<VecDeque<Reply>>,
    video: Mutex<VecDeque<Reply>>,
    audio: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reply_image(self, reply: Reply) -> Self {
        self.image.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply_video(self, reply: Reply) -> Self {
        self.video.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply_audio(self, reply: Reply) -> Self {
        self.audio.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of calls that were in progress at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn answer(&self, call: Call, queue: &Mutex<VecDeque<Reply>>, default: Value) -> Reply {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        queue.lock().unwrap().pop_front().unwrap_or(Ok(default))
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn generate_image(&self, request: ImageRequest) -> Result<Value, ServiceError> {
        self.answer(
            Call::Image(request),
            &self.image,
            json!({ "images": [{ "url": IMAGE_URL }] }),
        )
        .await
    }

    async fn generate_video(&self, request: VideoRequest) -> Result<Value, ServiceError> {
        self.answer(
            Call::Video(request),
            &self.video,
            json!({ "video": { "url": VIDEO_URL } }),
        )
        .await
    }

    async fn generate_audio(&self, request: AudioRequest) -> Result<Value, ServiceError> {
        self.answer(
            Call::Audio(request),
            &self.audio,
            json!({ "audio": { "url": AUDIO_URL } }),
        )
        .await
    }
}

pub fn engine(service: Arc<ScriptedService>) -> ExecutionEngine {
    engine_with(service, EngineOptions::default())
}

pub fn engine_with(service: Arc<ScriptedService>, options: EngineOptions) -> ExecutionEngine {
    ExecutionEngine::with_options(Arc::new(NodeExecutor::new(service)), options)
}

pub fn text(id: &str, value: &str) -> Node {
    Node::new(id, "text", json!({ "text": value }))
}

pub fn image_gen(id: &str, data: Value) -> Node {
    Node::new(id, "image-gen", data)
}

pub fn video_gen(id: &str, data: Value) -> Node {
    Node::new(id, "video-gen", data)
}

pub fn audio_gen(id: &str, data: Value) -> Node {
    Node::new(id, "audio", data)
}

pub fn upload(id: &str, file_url: &str, file_type: &str) -> Node {
    Node::new(id, "upload", json!({ "fileUrl": file_url, "fileType": file_type }))
}

pub fn graph(nodes: Vec<Node>, edges: &[(&str, &str)]) -> WorkflowGraph {
    WorkflowGraph::new(
        nodes,
        edges.iter().map(|(source, target)| Edge::new(*source, *target)).collect(),
    )
}
