use fishid_core::types::{ClassificationResult, StillImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ErrorKind, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    DeviceActive,
    FrameCaptured,
    Submitting,
    Succeeded,
    Failed,
}

impl SessionStatus {
    // A stable string label for UI display.
    // This is intentionally not derived from `Debug`.
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::DeviceActive => "device active",
            SessionStatus::FrameCaptured => "frame captured",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only view the rendering layer binds to.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub status_label: String,
    pub device_active: bool,
    pub acquiring: bool,

    #[serde(skip)]
    pub last_frame: Option<Arc<StillImage>>,
    pub last_result: Option<ClassificationResult>,

    #[serde(skip)]
    pub last_error: Option<SessionError>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,

    pub history_len: usize,
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
