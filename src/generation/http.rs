/// HTTP client for the hosted generation endpoints
///
/// Image requests go out as multipart form data, video and audio requests as JSON.
/// A non-success status becomes `ServiceError::Rejected` carrying the body's `error`
/// (or `message`) field verbatim.

use crate::error::ServiceError;
use crate::generation::{AudioRequest, GenerationService, ImageRequest, VideoRequest};
use async_trait::async_trait;
use reqwest::multipart::Form;
use serde_json::{json, Value};

const IMAGE_PATH: &str = "/api/generate-image";
const VIDEO_PATH: &str = "/api/generate-video";
const AUDIO_PATH: &str = "/api/generate-audio";

/// reqwest-backed `GenerationService`
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
    client: reqwest::Client,
    /// Base URL without trailing slash, e.g. "http://localhost:3000"
    base_url: String,
}

impl HttpGenerationService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!("📡 Generation service responded with status {}", status);

        let body_text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to read response body: {}", e)))?;
        let body = serde_json::from_str::<Value>(&body_text);

        if !status.is_success() {
            let message = body.ok().as_ref().and_then(error_text);
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        body.map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

/// `error` takes precedence over `message`; empty strings count as absent
fn error_text(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate_image(&self, request: ImageRequest) -> Result<Value, ServiceError> {
        tracing::debug!("🖼️ POST {} (model: {})", IMAGE_PATH, request.model);
        let form = Form::new()
            .text("prompt", request.prompt)
            .text("model", request.model)
            .text("enhancePrompt", request.enhance_prompt.to_string())
            .text("aspectRatio", request.aspect_ratio.clone())
            .text("aspect_ratio", request.aspect_ratio);

        self.send(self.client.post(self.endpoint(IMAGE_PATH)).multipart(form))
            .await
    }

    async fn generate_video(&self, request: VideoRequest) -> Result<Value, ServiceError> {
        tracing::debug!("🎬 POST {} (mode: {})", VIDEO_PATH, request.mode);
        let body = json!({
            "imageUrl": request.image_url,
            "videoUrl": request.video_url,
            "imageStoragePath": "",
            "videoStoragePath": "",
            "prompt": request.prompt,
            "mode": request.mode,
        });

        self.send(self.client.post(self.endpoint(VIDEO_PATH)).json(&body))
            .await
    }

    async fn generate_audio(&self, request: AudioRequest) -> Result<Value, ServiceError> {
        tracing::debug!("🔊 POST {} (voice: {})", AUDIO_PATH, request.voice);
        self.send(self.client.post(self.endpoint(AUDIO_PATH)).json(&request))
            .await
    }
}
