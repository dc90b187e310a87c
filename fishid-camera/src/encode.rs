use fishid_core::types::StillImage;
use fishid_engine::error::CaptureError;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::backend::RawFrame;

/// Encodes a frame at its intrinsic size.
pub fn encode_jpeg(frame: &RawFrame, quality: f32) -> Result<StillImage, CaptureError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptureError::NotReady);
    }

    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.rgb.len() != expected {
        return Err(CaptureError::Encode(format!(
            "frame is {}x{} but carries {} bytes (expected {expected})",
            frame.width,
            frame.height,
            frame.rgb.len()
        )));
    }

    let mut out = Vec::with_capacity(expected / 8);
    JpegEncoder::new_with_quality(&mut out, quality_percent(quality))
        .encode(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    Ok(StillImage::jpeg(out, frame.width, frame.height, quality))
}

// 0.0..=1.0 onto the encoder's 1..=100.
fn quality_percent(quality: f32) -> u8 {
    let q = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 1.0 };
    ((q * 100.0).round() as u8).max(1)
}
