use async_trait::async_trait;
use fishid_core::normalize::RawPayload;
use fishid_core::types::{FacingMode, StillImage};

use crate::error::{CaptureError, ClassifyError};

/// Exclusive claim on an acquired video stream.
///
/// Not `Clone`: the only way to give it up is `CaptureDevice::release`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    id: u64,
    facing: FacingMode,
}

impl DeviceHandle {
    pub fn new(id: u64, facing: FacingMode) -> Self {
        Self { id, facing }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Waits for permission/hardware. `facing` is a preference only.
    async fn acquire(&self, facing: FacingMode) -> Result<DeviceHandle, CaptureError>;

    /// Samples exactly one frame, at the moment of the call.
    fn capture_frame(&self, handle: &DeviceHandle) -> Result<StillImage, CaptureError>;

    /// Stops all tracks behind the handle. Unknown handles are ignored.
    fn release(&self, handle: DeviceHandle);
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &StillImage) -> Result<RawPayload, ClassifyError>;
}
