/// Configuration management for the Mediaflow engine
///
/// Handles server binding, the generation service endpoint, and runtime limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Remote generation and execution limits
    pub generation: GenerationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Generation service and engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL hosting /api/generate-{image,video,audio}
    pub base_url: String,
    /// Per-call timeout in seconds; 0 disables it
    pub request_timeout_secs: u64,
    /// Nodes allowed in flight at once; 1 means strictly sequential
    pub max_parallel: usize,
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("MEDIAFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("MEDIAFLOW_PORT", 3004),
            },
            generation: GenerationConfig {
                base_url: std::env::var("MEDIAFLOW_GENERATION_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                request_timeout_secs: env_parse("MEDIAFLOW_REQUEST_TIMEOUT_SECS", 300),
                max_parallel: env_parse::<usize>("MEDIAFLOW_MAX_PARALLEL", 1).max(1),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
