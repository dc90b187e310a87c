use crate::types::{DEFAULT_JPEG_QUALITY, FacingMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CLASSIFY_PATH: &str = "/predict";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_url: String,
    pub classify_path: String,
    pub facing: FacingMode,
    pub jpeg_quality: f32,
    pub submit_timeout_ms: u64,
    pub connect_timeout_ms: u64,

    // When false, the camera is released on Succeeded/Failed and must be restarted.
    pub keep_device_between_captures: bool,

    // Sent as `X-Api-Key` when present. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            classify_path: DEFAULT_CLASSIFY_PATH.into(),
            facing: FacingMode::Environment,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            submit_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            keep_device_between_captures: false,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("classify_path", &self.classify_path)
            .field("facing", &self.facing)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("submit_timeout_ms", &self.submit_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("keep_device_between_captures", &self.keep_device_between_captures)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SessionConfig {
    pub fn classify_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.classify_path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
