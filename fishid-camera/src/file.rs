use std::path::PathBuf;

use async_trait::async_trait;
use fishid_core::types::FacingMode;
use fishid_engine::error::CaptureError;

use crate::backend::{RawFrame, VideoBackend, VideoStream};

/// Serves a single image file as a frozen video stream.
///
/// Lets the CLI run a full session on machines without a camera.
#[derive(Debug, Clone)]
pub struct ImageFileBackend {
    path: PathBuf,
}

impl ImageFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VideoBackend for ImageFileBackend {
    async fn open(&self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, CaptureError> {
        let img = image::open(&self.path).map_err(|e| {
            CaptureError::Unavailable(format!("cannot open {}: {e}", self.path.display()))
        })?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        log::info!("image source {} ({width}x{height})", self.path.display());

        Ok(Box::new(FileStream {
            frame: Some(RawFrame {
                width,
                height,
                rgb: rgb.into_raw(),
            }),
        }))
    }
}

struct FileStream {
    frame: Option<RawFrame>,
}

impl VideoStream for FileStream {
    fn dimensions(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn draw(&mut self) -> Option<RawFrame> {
        self.frame.clone()
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
