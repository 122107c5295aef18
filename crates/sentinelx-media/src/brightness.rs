//! Brightness extraction.
//!
//! Reduces a frame to a single scalar: the mean of its grayscale
//! conversion. Grayscale uses the ITU-R BT.601 weights and rounds each
//! pixel to an 8-bit level, the same conversion OpenCV's `COLOR_BGR2GRAY`
//! performs, so baselines are comparable with frames measured there.

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// BT.601 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Grayscale level of one RGB pixel.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb;
    let y = LUMA_WEIGHTS[0] * r as f64 + LUMA_WEIGHTS[1] * g as f64 + LUMA_WEIGHTS[2] * b as f64;
    y.round().clamp(0.0, 255.0) as u8
}

/// Average luminance of a frame, in 0..=255.
///
/// Fails only for frames with no pixels.
pub fn mean_luminance(frame: &Frame) -> MediaResult<f64> {
    if frame.is_empty() {
        return Err(MediaError::EmptyFrame {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let total: u64 = frame
        .image()
        .pixels()
        .map(|p| luma(p.0) as u64)
        .sum();

    Ok(total as f64 / frame.pixel_count() as f64)
}
