use fishid_core::normalize::NormalizeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::session::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DeviceUnavailable,
    NotReady,
    MalformedResponse,
    NetworkFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("video stream has not produced a frame yet")]
    NotReady,

    #[error("device handle {0} is not live")]
    InvalidHandle(u64),

    #[error("failed to encode still image: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("{0}")]
    Transport(String),

    #[error("classification service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Malformed(#[from] NormalizeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("camera has not produced a frame yet")]
    NotReady,

    #[error("classification response was unusable: {0}")]
    MalformedResponse(String),

    #[error("classification request failed: {0}")]
    NetworkFailure(String),

    #[error("a {0} is already in progress")]
    Busy(&'static str),

    #[error("cannot {op} while {status}")]
    InvalidState {
        op: &'static str,
        status: SessionStatus,
    },

    #[error("session was stopped during {0}")]
    Cancelled(&'static str),
}

impl SessionError {
    /// `None` for controller-level rejections; those are never recorded as `last_error`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SessionError::DeviceUnavailable(_) => Some(ErrorKind::DeviceUnavailable),
            SessionError::NotReady => Some(ErrorKind::NotReady),
            SessionError::MalformedResponse(_) => Some(ErrorKind::MalformedResponse),
            SessionError::NetworkFailure(_) => Some(ErrorKind::NetworkFailure),
            SessionError::Busy(_)
            | SessionError::InvalidState { .. }
            | SessionError::Cancelled(_) => None,
        }
    }

    pub fn is_user_visible(&self) -> bool {
        self.user_message().is_some()
    }

    // Keep messages actionable and short; details are in logs.
    pub fn user_message(&self) -> Option<&'static str> {
        match self.kind()? {
            ErrorKind::DeviceUnavailable => {
                Some("Cannot access the camera. Allow camera permissions and start it again.")
            }
            ErrorKind::MalformedResponse => {
                Some("The classifier sent back an unreadable answer. Try identifying again.")
            }
            ErrorKind::NetworkFailure => {
                Some("Could not classify the fish. Check the backend and network connection.")
            }
            ErrorKind::NotReady => None,
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::NotReady => SessionError::NotReady,
            other => SessionError::DeviceUnavailable(other.to_string()),
        }
    }
}

impl From<ClassifyError> for SessionError {
    fn from(e: ClassifyError) -> Self {
        match e {
            ClassifyError::Malformed(inner) => SessionError::MalformedResponse(inner.to_string()),
            other => SessionError::NetworkFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_errors_map_onto_taxonomy() {
        let e: SessionError = ClassifyError::Status {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert_eq!(e.kind(), Some(ErrorKind::NetworkFailure));

        let e: SessionError = ClassifyError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(e.kind(), Some(ErrorKind::NetworkFailure));
        assert!(e.to_string().contains("30s"));

        let e: SessionError = ClassifyError::Malformed(NormalizeError::NotAnObject).into();
        assert_eq!(e.kind(), Some(ErrorKind::MalformedResponse));
    }

    #[test]
    fn capture_errors_map_onto_taxonomy() {
        assert_eq!(SessionError::from(CaptureError::NotReady), SessionError::NotReady);
        let e = SessionError::from(CaptureError::Unavailable("permission denied".into()));
        assert_eq!(e.kind(), Some(ErrorKind::DeviceUnavailable));
        assert!(e.to_string().contains("permission denied"));
    }

    #[test]
    fn only_user_facing_kinds_have_messages() {
        assert!(SessionError::DeviceUnavailable("x".into()).is_user_visible());
        assert!(SessionError::NetworkFailure("x".into()).is_user_visible());
        assert!(SessionError::MalformedResponse("x".into()).is_user_visible());
        assert!(!SessionError::NotReady.is_user_visible());
        assert!(!SessionError::Busy("submission").is_user_visible());
        assert_eq!(SessionError::Cancelled("camera start").kind(), None);
    }

    #[test]
    fn invalid_state_reads_naturally() {
        let e = SessionError::InvalidState {
            op: "submit",
            status: SessionStatus::Idle,
        };
        assert_eq!(e.to_string(), "cannot submit while idle");
    }
}
