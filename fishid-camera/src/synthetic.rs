use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fishid_core::types::FacingMode;
use fishid_engine::error::CaptureError;

use crate::backend::{RawFrame, VideoBackend, VideoStream};

/// Shared counters so tests can check that every opened stream was stopped.
#[derive(Debug, Clone, Default)]
pub struct SyntheticCounters {
    opened: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl SyntheticCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.stopped())
    }
}

/// Produces gradient frames without any hardware.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    width: u32,
    height: u32,
    deny: Option<String>,
    warmup_polls: usize,
    counters: SyntheticCounters,
}

impl SyntheticBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            deny: None,
            warmup_polls: 0,
            counters: SyntheticCounters::default(),
        }
    }

    /// Every `open` fails as if the user refused camera access.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            deny: Some(reason.into()),
            ..Self::new(0, 0)
        }
    }

    /// The first `polls` dimension queries of each stream report no frame yet.
    pub fn with_warmup(mut self, polls: usize) -> Self {
        self.warmup_polls = polls;
        self
    }

    pub fn counters(&self) -> SyntheticCounters {
        self.counters.clone()
    }
}

#[async_trait]
impl VideoBackend for SyntheticBackend {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CaptureError> {
        if let Some(reason) = &self.deny {
            return Err(CaptureError::Unavailable(reason.clone()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        log::debug!("synthetic stream opened ({facing:?}, {}x{})", self.width, self.height);

        Ok(Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            warmup: Cell::new(self.warmup_polls),
            frame_no: 0,
            stopped: false,
            counters: self.counters.clone(),
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    warmup: Cell<usize>,
    frame_no: u8,
    stopped: bool,
    counters: SyntheticCounters,
}

impl VideoStream for SyntheticStream {
    fn dimensions(&self) -> (u32, u32) {
        if self.stopped {
            return (0, 0);
        }
        let left = self.warmup.get();
        if left > 0 {
            self.warmup.set(left - 1);
            return (0, 0);
        }
        (self.width, self.height)
    }

    fn draw(&mut self) -> Option<RawFrame> {
        if self.stopped || self.warmup.get() > 0 || self.width == 0 || self.height == 0 {
            return None;
        }
        self.frame_no = self.frame_no.wrapping_add(1);
        let shade = self.frame_no;
        let (w, h) = (self.width, self.height);

        let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
        for y in 0..h {
            for x in 0..w {
                rgb.push((x * 255 / w.max(1)) as u8);
                rgb.push((y * 255 / h.max(1)) as u8);
                rgb.push(shade);
            }
        }
        Some(RawFrame {
            width: w,
            height: h,
            rgb,
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}
