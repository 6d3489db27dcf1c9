/// Remote Generation Services
///
/// The executor talks to image, video and audio synthesis through the
/// `GenerationService` trait. Implementations return the service's raw JSON body;
/// picking the result URL out of it is the executor's job.
///
/// - `HttpGenerationService`: reqwest client for the hosted generation endpoints

use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

// reqwest-backed implementation
pub mod http;

pub use http::HttpGenerationService;

/// Text-to-image request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub enhance_prompt: bool,
    pub aspect_ratio: String,
}

/// Image + reference video to video request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub image_url: String,
    pub video_url: String,
    /// Empty when neither inputs nor configuration supply one
    pub prompt: String,
    pub mode: String,
}

/// Text-to-speech request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioRequest {
    pub text: String,
    pub voice: String,
}

/// One outbound call per method; implementations never retry
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_image(&self, request: ImageRequest) -> Result<Value, ServiceError>;

    async fn generate_video(&self, request: VideoRequest) -> Result<Value, ServiceError>;

    async fn generate_audio(&self, request: AudioRequest) -> Result<Value, ServiceError>;
}
