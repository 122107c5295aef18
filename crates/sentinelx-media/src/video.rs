//! Video file frame source backed by OpenCV's `VideoCapture`.

use std::path::{Path, PathBuf};

use image::RgbImage;
use opencv::{
    core::{AlgorithmHint, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::source::{FrameSource, SourceEvent};

/// Decodes frames from a video file, looping on rewind.
pub struct VideoCaptureSource {
    path: PathBuf,
    capture: VideoCapture,
    bgr: Mat,
    rgb: Mat,
    produced: u64,
}

impl VideoCaptureSource {
    /// Open a video file.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| MediaError::source_unavailable(format!("non UTF-8 path: {}", path.display())))?;

        let capture = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(MediaError::source_unavailable(format!(
                "VideoCapture failed to open {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            capture,
            bgr: Mat::default(),
            rgb: Mat::default(),
            produced: 0,
        })
    }

    fn to_frame(&mut self) -> MediaResult<Frame> {
        imgproc::cvt_color(
            &self.bgr,
            &mut self.rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| MediaError::decode_failed(format!("bgr2rgb: {e}")))?;

        let width = self.rgb.cols() as u32;
        let height = self.rgb.rows() as u32;
        let data = self.rgb.data_bytes()?.to_vec();

        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            MediaError::decode_failed(format!("frame buffer does not match {width}x{height}"))
        })?;

        let frame = Frame::new(image, self.produced);
        self.produced += 1;
        Ok(frame)
    }
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> MediaResult<SourceEvent> {
        let read = self.capture.read(&mut self.bgr)?;
        if !read || self.bgr.empty() {
            return Ok(SourceEvent::EndOfStream);
        }

        self.to_frame().map(SourceEvent::Frame)
    }

    fn rewind(&mut self) -> MediaResult<()> {
        let seeked = self.capture.set(videoio::CAP_PROP_POS_FRAMES, 0.0)?;
        if !seeked {
            return Err(MediaError::source_unavailable(format!(
                "cannot seek {} back to the first frame",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("video file {}", self.path.display())
    }
}
