//! Snapshot persistence.
//!
//! The detection core hands a frame and a suggested file name to a
//! [`SnapshotWriter`] and only cares whether the save succeeded.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::mjpeg::{encode_jpeg, DEFAULT_JPEG_QUALITY};

/// Durable storage for alert snapshots.
pub trait SnapshotWriter: Send + Sync {
    /// Persist `frame` under `suggested_name`, returning the stored reference.
    fn save(&self, frame: &Frame, suggested_name: &str) -> MediaResult<String>;
}

/// File name for the snapshot of a given alert.
pub fn snapshot_name(id: impl Display) -> String {
    format!("snapshot_{id}.jpg")
}

/// Reject names that could escape the snapshot directory or are not JPEGs.
pub fn validate_snapshot_name(name: &str) -> MediaResult<()> {
    let invalid = name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(MediaError::InvalidSnapshotName(name.to_string()));
    }

    let lower = name.to_ascii_lowercase();
    if !(lower.ends_with(".jpg") || lower.ends_with(".jpeg")) {
        return Err(MediaError::InvalidSnapshotName(name.to_string()));
    }

    Ok(())
}

/// Writes snapshots as JPEG files into a directory.
#[derive(Debug, Clone)]
pub struct FsSnapshotWriter {
    dir: PathBuf,
    quality: u8,
}

impl FsSnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Builder-style setter for JPEG quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a stored snapshot, after validating its name.
    pub fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        validate_snapshot_name(name)?;
        Ok(self.dir.join(name))
    }
}

impl SnapshotWriter for FsSnapshotWriter {
    fn save(&self, frame: &Frame, suggested_name: &str) -> MediaResult<String> {
        let path = self.resolve(suggested_name)?;
        let jpeg = encode_jpeg(frame, self.quality)?;

        std::fs::create_dir_all(&self.dir)?;

        // Write to a temp file first so readers never see a partial JPEG
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, &jpeg)?;
        std::fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), bytes = jpeg.len(), "Snapshot written");
        Ok(suggested_name.to_string())
    }
}
