//! JPEG encoding and MJPEG multipart framing for live streams.

use std::sync::OnceLock;

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Multipart boundary used between stream parts.
pub const MJPEG_BOUNDARY: &str = "frame";

/// Content type of an MJPEG stream response.
pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Default JPEG quality for stream frames and snapshots.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encode a frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> MediaResult<Vec<u8>> {
    if frame.is_empty() {
        return Err(MediaError::EmptyFrame {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .encode(
            frame.image().as_raw(),
            frame.width(),
            frame.height(),
            ColorType::Rgb8,
        )
        .map_err(|e| MediaError::encode_failed(e.to_string()))?;

    Ok(buf)
}

/// Wrap JPEG bytes as one part of a `multipart/x-mixed-replace` stream.
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{MJPEG_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

/// Small black JPEG substituted when a frame cannot be encoded.
///
/// `None` only if the encoder itself is unusable.
pub fn fallback_jpeg() -> Option<&'static [u8]> {
    static FALLBACK: OnceLock<Option<Vec<u8>>> = OnceLock::new();
    FALLBACK
        .get_or_init(|| encode_jpeg(&Frame::gray(2, 2, 0, 0), DEFAULT_JPEG_QUALITY).ok())
        .as_deref()
}
