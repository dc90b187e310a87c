use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use fishid_core::config::SessionConfig;
use fishid_core::normalize::normalize;
use fishid_core::types::{ClassificationResult, StillImage};

use crate::error::{CaptureError, ClassifyError, SessionError};
use crate::history::{HistoryEntry, HistoryStore};
use crate::session::{SessionSnapshot, SessionStatus, ms};
use crate::traits::{CaptureDevice, Classifier, DeviceHandle};

const OP_START: &str = "camera start";
const OP_SUBMIT: &str = "submission";
const OP_CAPTURE: &str = "capture";

#[derive(Default)]
struct Inner {
    status: SessionStatus,
    device: Option<DeviceHandle>,
    last_frame: Option<Arc<StillImage>>,
    last_result: Option<ClassificationResult>,
    last_error: Option<SessionError>,
    acquiring: bool,

    // Set while a classifier call is outstanding, including one orphaned by `stop`.
    submitting: bool,

    // Bumped by `stop`. Work resuming under an older generation is stale and must not touch
    // the session status.
    generation: u64,
    history: HistoryStore,
}

impl Inner {
    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            log::info!("session status: {} -> {}", self.status, status);
        }
        self.status = status;
    }

    fn record_error(&mut self, err: &SessionError) {
        if err.is_user_visible() {
            self.last_error = Some(err.clone());
        }
    }
}

struct Shared {
    cfg: SessionConfig,
    camera: Arc<dyn CaptureDevice>,
    classifier: Arc<dyn Classifier>,
    state: Mutex<Inner>,
}

impl Shared {
    // The lock is never held across an await point.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = match self.state.get_mut() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = inner.device.take() {
            log::info!("releasing camera {} on session teardown", handle.id());
            self.camera.release(handle);
        }
    }
}

// Clears `acquiring` if the start future is dropped mid-acquisition.
struct AcquireGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for AcquireGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("camera start abandoned before the device answered");
            self.shared.lock().acquiring = false;
        }
    }
}

// Returns the session to FrameCaptured if the submit future is dropped mid-flight.
struct SubmitGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    armed: bool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.shared.lock();
        inner.submitting = false;
        if inner.generation == self.generation && inner.status == SessionStatus::Submitting {
            log::warn!("submission abandoned by caller; frame kept for retry");
            inner.set_status(SessionStatus::FrameCaptured);
        }
    }
}

/// Owns the one capture session of a user flow: camera handle, last frame, last result,
/// last error and the history.
///
/// Commands are rejected (never queued) while a conflicting one is in flight. Cloning is
/// cheap and every clone drives the same session.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        cfg: SessionConfig,
        camera: Arc<dyn CaptureDevice>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                camera,
                classifier,
                state: Mutex::new(Inner::default()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.cfg
    }

    /// Idle/Succeeded/Failed without a held device -> DeviceActive.
    ///
    /// If `stop` runs while the device is still answering, the fresh handle is released
    /// straight away and `Cancelled` is returned.
    pub async fn start_camera(&self) -> Result<(), SessionError> {
        let generation = {
            let mut inner = self.shared.lock();
            if inner.acquiring {
                return Err(reject(SessionError::Busy(OP_START)));
            }
            if inner.device.is_some() {
                return Err(reject(SessionError::InvalidState {
                    op: "start the camera",
                    status: inner.status,
                }));
            }
            inner.acquiring = true;
            inner.generation
        };
        let mut guard = AcquireGuard {
            shared: &self.shared,
            armed: true,
        };

        let facing = self.shared.cfg.facing;
        log::info!("acquiring camera (prefers {facing:?})");
        let acquired = self.shared.camera.acquire(facing).await;

        let mut inner = self.shared.lock();
        guard.armed = false;
        inner.acquiring = false;

        if inner.generation != generation {
            drop(inner);
            if let Ok(handle) = acquired {
                log::info!("session stopped while acquiring; releasing camera {}", handle.id());
                self.shared.camera.release(handle);
            }
            return Err(SessionError::Cancelled(OP_START));
        }

        match acquired {
            Ok(handle) => {
                log::info!("camera {} acquired ({:?})", handle.id(), handle.facing());
                inner.device = Some(handle);
                inner.last_error = None;
                inner.set_status(SessionStatus::DeviceActive);
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from(e);
                log::error!("camera start failed: {err}");
                inner.record_error(&err);
                inner.set_status(SessionStatus::Idle);
                Err(err)
            }
        }
    }

    /// Takes one still from the held device. Retakes are allowed until submission starts.
    ///
    /// The device is sampled and encoded without holding the session lock. If `stop` runs in
    /// the meantime the frame is dropped and `Cancelled` is returned.
    pub fn capture(&self) -> Result<Arc<StillImage>, SessionError> {
        let (view, generation) = {
            let inner = self.shared.lock();
            if inner.status == SessionStatus::Submitting {
                return Err(reject(SessionError::Busy(OP_SUBMIT)));
            }
            let Some(handle) = inner.device.as_ref() else {
                return Err(reject(SessionError::InvalidState {
                    op: OP_CAPTURE,
                    status: inner.status,
                }));
            };
            // Borrowed view for sampling; the owned handle stays in the session.
            (DeviceHandle::new(handle.id(), handle.facing()), inner.generation)
        };

        let captured = self.shared.camera.capture_frame(&view);

        let mut inner = self.shared.lock();
        let still_held = inner.generation == generation
            && inner.device.as_ref().is_some_and(|d| d.id() == view.id());
        if !still_held {
            log::debug!("camera released while capturing; frame dropped");
            return Err(SessionError::Cancelled(OP_CAPTURE));
        }
        if inner.status == SessionStatus::Submitting {
            return Err(reject(SessionError::Busy(OP_SUBMIT)));
        }

        match captured {
            Ok(still) => {
                let still = Arc::new(still);
                log::info!(
                    "captured {}x{} still ({} bytes)",
                    still.width(),
                    still.height(),
                    still.len()
                );
                inner.last_frame = Some(still.clone());
                inner.last_result = None;
                inner.last_error = None;
                inner.set_status(SessionStatus::FrameCaptured);
                Ok(still)
            }
            Err(CaptureError::NotReady) => {
                log::debug!("capture attempted before the stream produced a frame");
                Err(SessionError::NotReady)
            }
            Err(e) => {
                let err = SessionError::from(e);
                log::error!("capture failed: {err}");
                inner.record_error(&err);
                Err(err)
            }
        }
    }

    /// Uploads the last frame and normalizes the answer.
    ///
    /// Allowed from FrameCaptured, or from Failed to retry the same frame. If `stop` runs
    /// while the request is in flight, a successful result is still appended to history but
    /// the session status is left alone; a failure is discarded. Until that orphaned request
    /// settles, new submissions are rejected as busy.
    pub async fn submit(&self) -> Result<ClassificationResult, SessionError> {
        let (frame, generation) = {
            let mut inner = self.shared.lock();
            if inner.submitting {
                return Err(reject(SessionError::Busy(OP_SUBMIT)));
            }
            match inner.status {
                SessionStatus::Submitting => {
                    return Err(reject(SessionError::Busy(OP_SUBMIT)));
                }
                SessionStatus::FrameCaptured | SessionStatus::Failed => {}
                status => {
                    return Err(reject(SessionError::InvalidState { op: "submit", status }));
                }
            }
            let Some(frame) = inner.last_frame.clone() else {
                return Err(reject(SessionError::InvalidState {
                    op: "submit without a captured frame",
                    status: inner.status,
                }));
            };
            inner.last_error = None;
            inner.submitting = true;
            inner.set_status(SessionStatus::Submitting);
            (frame, inner.generation)
        };
        let mut guard = SubmitGuard {
            shared: &self.shared,
            generation,
            armed: true,
        };

        let timeout = self.shared.cfg.submit_timeout();
        let t0 = Instant::now();
        let outcome =
            match tokio::time::timeout(timeout, self.shared.classifier.classify(&frame)).await {
                Ok(Ok(payload)) => Ok(normalize(&payload)),
                Ok(Err(e)) => Err(SessionError::from(e)),
                Err(_) => Err(SessionError::from(ClassifyError::Timeout(timeout))),
            };
        let elapsed_ms = ms(t0.elapsed());

        let mut inner = self.shared.lock();
        guard.armed = false;
        inner.submitting = false;

        if inner.generation != generation {
            match &outcome {
                Ok(result) => {
                    log::info!(
                        "submission finished after stop; recording {} in history only",
                        result.fish_type
                    );
                    inner.history.record(frame, result.clone());
                }
                Err(e) => log::warn!("submission failed after stop; discarded: {e}"),
            }
            return outcome;
        }

        match &outcome {
            Ok(result) => {
                log::info!("classified as {} in {elapsed_ms}ms", result.fish_type);
                inner.history.record(frame, result.clone());
                inner.last_result = Some(result.clone());
                inner.set_status(SessionStatus::Succeeded);
            }
            Err(e) => {
                log::error!("submission failed after {elapsed_ms}ms: {e}");
                inner.record_error(e);
                inner.set_status(SessionStatus::Failed);
            }
        }

        let released = if self.shared.cfg.keep_device_between_captures {
            None
        } else {
            inner.device.take()
        };
        drop(inner);

        if let Some(handle) = released {
            log::info!("releasing camera {} after submission", handle.id());
            self.shared.camera.release(handle);
        }

        outcome
    }

    /// Valid from any state. Releases the device, clears the frame and returns to Idle.
    pub fn stop(&self) {
        let released = {
            let mut inner = self.shared.lock();
            inner.generation = inner.generation.wrapping_add(1);
            inner.last_frame = None;
            inner.last_error = None;
            inner.set_status(SessionStatus::Idle);
            inner.device.take()
        };

        if let Some(handle) = released {
            log::info!("releasing camera {}", handle.id());
            self.shared.camera.release(handle);
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().status
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.lock().last_error.clone()
    }

    /// Newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.shared.lock().history.all()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.lock();
        SessionSnapshot {
            status: inner.status,
            status_label: inner.status.label().into(),
            device_active: inner.device.is_some(),
            acquiring: inner.acquiring,
            last_frame: inner.last_frame.clone(),
            last_result: inner.last_result.clone(),
            last_error: inner.last_error.clone(),
            error_kind: inner.last_error.as_ref().and_then(SessionError::kind),
            error: inner
                .last_error
                .as_ref()
                .and_then(SessionError::user_message)
                .map(Into::into),
            history_len: inner.history.len(),
        }
    }
}

fn reject(err: SessionError) -> SessionError {
    log::debug!("rejected command: {err}");
    err
}
