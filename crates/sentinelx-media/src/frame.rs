//! Decoded video frame.

use image::{Rgb, RgbImage};

/// A decoded frame: an RGB pixel grid plus its position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    index: u64,
}

impl Frame {
    pub fn new(image: RgbImage, index: u64) -> Self {
        Self { image, index }
    }

    /// Frame filled with a single color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], index: u64) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(rgb)), index)
    }

    /// Uniform gray frame at the given level.
    pub fn gray(width: u32, height: u32, level: u8, index: u64) -> Self {
        Self::solid(width, height, [level, level, level], index)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// A frame with no pixels cannot be measured or encoded.
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}
