use async_trait::async_trait;
use fishid_core::types::FacingMode;
use fishid_engine::error::CaptureError;

/// One decoded video frame, packed RGB8.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgb_len", &self.rgb.len())
            .finish()
    }
}

/// A source of live video: OS camera, file, or synthetic.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Resolves once permission is granted and the stream is running.
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CaptureError>;
}

pub trait VideoStream: Send {
    /// Intrinsic frame size; `(0, 0)` until the first frame has arrived.
    fn dimensions(&self) -> (u32, u32);

    /// The current frame, if any.
    fn draw(&mut self) -> Option<RawFrame>;

    /// Stops every track. Must be idempotent.
    fn stop(&mut self);
}
