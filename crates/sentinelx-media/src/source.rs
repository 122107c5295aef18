//! Frame sources.
//!
//! A source yields decoded frames in order and signals the end of the
//! stream; the pipeline then asks it to rewind so the stream loops.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// What a source produced on one read.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    Frame(Frame),
    /// The stream ended; call [`FrameSource::rewind`] to loop.
    EndOfStream,
}

/// Ordered supplier of decoded frames.
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// An `Err` means this one frame could not be produced; the source
    /// stays usable unless [`MediaError::is_permanent`] says otherwise.
    fn next_frame(&mut self) -> MediaResult<SourceEvent>;

    /// Restart from the first frame.
    ///
    /// Failure means the source has ended permanently.
    fn rewind(&mut self) -> MediaResult<()>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// File extensions accepted by [`ImageSequenceSource`].
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Loops over a directory of still images in file-name order.
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    produced: u64,
}

impl ImageSequenceSource {
    /// Open a directory of frames.
    pub fn open(dir: impl AsRef<Path>) -> MediaResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(MediaError::FileNotFound(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(MediaError::source_unavailable(format!(
                "no image frames in {}",
                dir.display()
            )));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            cursor: 0,
            produced: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> MediaResult<SourceEvent> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(SourceEvent::EndOfStream);
        };
        self.cursor += 1;

        let image = image::open(path)
            .map_err(|e| MediaError::decode_failed(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        let frame = Frame::new(image, self.produced);
        self.produced += 1;
        Ok(SourceEvent::Frame(frame))
    }

    fn rewind(&mut self) -> MediaResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("image sequence {} ({} frames)", self.dir.display(), self.files.len())
    }
}

/// One step of a [`ScriptedSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    /// A uniform gray frame at this level.
    Level(u8),
    /// A frame with no pixels (brightness cannot be measured).
    Corrupt,
    /// The read itself fails.
    DecodeError,
}

/// In-memory source replaying a fixed brightness script.
///
/// Used for demos and tests; optionally stops after a number of loops.
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
    cursor: usize,
    width: u32,
    height: u32,
    loops_completed: usize,
    max_loops: Option<usize>,
    produced: u64,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            width: 4,
            height: 4,
            loops_completed: 0,
            max_loops: None,
            produced: 0,
        }
    }

    /// Script of uniform gray levels.
    pub fn from_levels(levels: impl IntoIterator<Item = u8>) -> Self {
        Self::new(levels.into_iter().map(ScriptStep::Level).collect())
    }

    /// Stop permanently after the script has played `loops` times.
    pub fn with_max_loops(mut self, loops: usize) -> Self {
        self.max_loops = Some(loops);
        self
    }

    /// Builder-style setter for frame dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn loops_completed(&self) -> usize {
        self.loops_completed
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> MediaResult<SourceEvent> {
        let Some(step) = self.steps.get(self.cursor).copied() else {
            return Ok(SourceEvent::EndOfStream);
        };
        self.cursor += 1;

        let index = self.produced;
        self.produced += 1;

        match step {
            ScriptStep::Level(level) => Ok(SourceEvent::Frame(Frame::gray(
                self.width,
                self.height,
                level,
                index,
            ))),
            ScriptStep::Corrupt => Ok(SourceEvent::Frame(Frame::gray(0, 0, 0, index))),
            ScriptStep::DecodeError => Err(MediaError::decode_failed(format!(
                "scripted decode failure at step {}",
                self.cursor - 1
            ))),
        }
    }

    fn rewind(&mut self) -> MediaResult<()> {
        self.loops_completed += 1;
        if let Some(max) = self.max_loops {
            if self.loops_completed >= max {
                return Err(MediaError::SourceExhausted);
            }
        }
        self.cursor = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("scripted source ({} steps)", self.steps.len())
    }
}

/// Open a frame source for a path.
///
/// Directories are read as image sequences; video files need the
/// `opencv` feature.
pub fn open_frame_source(path: impl AsRef<Path>) -> MediaResult<Box<dyn FrameSource>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(path)?));
    }

    open_video_file(path)
}

#[cfg(feature = "opencv")]
fn open_video_file(path: &Path) -> MediaResult<Box<dyn FrameSource>> {
    Ok(Box::new(crate::video::VideoCaptureSource::open(path)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video_file(path: &Path) -> MediaResult<Box<dyn FrameSource>> {
    Err(MediaError::UnsupportedFormat(format!(
        "{}: video decoding requires the `opencv` feature",
        path.display()
    )))
}

/// Try each candidate path in order, returning the first source that opens.
pub fn open_first_available(candidates: &[PathBuf]) -> MediaResult<Box<dyn FrameSource>> {
    let mut last_error = MediaError::source_unavailable("no frame source candidates configured");

    for (attempt, path) in candidates.iter().enumerate() {
        match open_frame_source(path) {
            Ok(source) => {
                info!(source = %source.describe(), "Frame source opened");
                return Ok(source);
            }
            Err(e) => {
                if attempt + 1 < candidates.len() {
                    warn!(path = %path.display(), error = %e, "Frame source failed to open, trying fallback path");
                } else {
                    error!(path = %path.display(), error = %e, "Frame source failed to open");
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}
