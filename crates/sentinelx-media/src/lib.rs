#![deny(unreachable_patterns)]
//! Frame plumbing for the SentinelX smoke monitor.
//!
//! This crate provides:
//! - Decoded frame type and brightness extraction
//! - Frame sources (image sequences, scripted frames, OpenCV video files)
//! - Snapshot persistence as JPEG files
//! - MJPEG multipart framing for live streams

pub mod brightness;
pub mod error;
pub mod frame;
pub mod mjpeg;
pub mod snapshot;
pub mod source;
#[cfg(feature = "opencv")]
pub mod video;

pub use brightness::{luma, mean_luminance};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use mjpeg::{encode_jpeg, fallback_jpeg, multipart_part, MJPEG_CONTENT_TYPE};
pub use snapshot::{snapshot_name, validate_snapshot_name, FsSnapshotWriter, SnapshotWriter};
pub use source::{
    open_first_available, open_frame_source, FrameSource, ImageSequenceSource, ScriptStep,
    ScriptedSource, SourceEvent,
};
#[cfg(feature = "opencv")]
pub use video::VideoCaptureSource;
