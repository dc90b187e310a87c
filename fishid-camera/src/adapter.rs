use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use fishid_core::types::{FacingMode, StillImage};
use fishid_engine::error::CaptureError;
use fishid_engine::traits::{CaptureDevice, DeviceHandle};

use crate::backend::{VideoBackend, VideoStream};
use crate::encode::encode_jpeg;

/// Bridges a `VideoBackend` to the session's `CaptureDevice` seam.
///
/// Each acquired handle owns one open stream; releasing the handle stops it.
pub struct CameraAdapter {
    backend: Arc<dyn VideoBackend>,
    quality: f32,
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, Box<dyn VideoStream>>>,
}

impl CameraAdapter {
    pub fn new(backend: Arc<dyn VideoBackend>, quality: f32) -> Self {
        Self {
            backend,
            quality,
            next_id: AtomicU64::new(1),
            streams: Mutex::new(HashMap::new()),
        }
    }

    pub fn open_streams(&self) -> usize {
        self.streams().len()
    }

    fn streams(&self) -> MutexGuard<'_, HashMap<u64, Box<dyn VideoStream>>> {
        match self.streams.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CaptureDevice for CameraAdapter {
    async fn acquire(&self, facing: FacingMode) -> Result<DeviceHandle, CaptureError> {
        let stream = self.backend.open(facing).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams().insert(id, stream);
        log::debug!("stream {id} opened");
        Ok(DeviceHandle::new(id, facing))
    }

    fn capture_frame(&self, handle: &DeviceHandle) -> Result<StillImage, CaptureError> {
        let mut streams = self.streams();
        let stream = streams
            .get_mut(&handle.id())
            .ok_or(CaptureError::InvalidHandle(handle.id()))?;

        let (w, h) = stream.dimensions();
        if w == 0 || h == 0 {
            return Err(CaptureError::NotReady);
        }
        let frame = stream.draw().ok_or(CaptureError::NotReady)?;
        encode_jpeg(&frame, self.quality)
    }

    fn release(&self, handle: DeviceHandle) {
        let stream = self.streams().remove(&handle.id());
        match stream {
            Some(mut stream) => {
                stream.stop();
                log::debug!("stream {} stopped", handle.id());
            }
            None => log::debug!("release of unknown stream {} ignored", handle.id()),
        }
    }
}

impl Drop for CameraAdapter {
    fn drop(&mut self) {
        let streams = match self.streams.get_mut() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (id, mut stream) in streams.drain() {
            log::warn!("stream {id} still open at shutdown; stopping");
            stream.stop();
        }
    }
}
