//! Common frame types shared by the visage pipeline crates.
//!
//! A [`Frame`] is a plain pixel buffer with known dimensions and channel
//! layout, produced by an external capture source and consumed synchronously
//! by the preprocessing stages. Camera hardware access itself lives behind
//! the [`FrameSource`] trait and is not implemented here.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing or supplying frames
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },

    #[error("Frame dimensions must be nonzero: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Frame capture failed: {0}")]
    Capture(String),
}

/// Channel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B order
    Rgb8,
    /// 4 bytes per pixel, R G B A order (alpha ignored downstream)
    Rgba8,
}

impl PixelFormat {
    /// Number of bytes per pixel for this format
    #[must_use]
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// A single captured video frame.
///
/// Pixels are stored row-major with the origin at the top-left corner.
/// Frames are immutable once constructed; the pipeline clones the one frame
/// it retains for crop mapping and drops everything else at cycle end.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame, validating that the buffer matches the dimensions
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }

        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(FrameError::BufferLengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create an RGB frame from a raw buffer
    pub fn rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        Self::new(width, height, PixelFormat::Rgb8, data)
    }

    /// Create a frame filled with a single RGB color
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Result<Self, FrameError> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&color);
        }
        Self::rgb(width, height, data)
    }

    /// Convert an [`image::RgbImage`] into a frame
    #[must_use]
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            format: PixelFormat::Rgb8,
            data: img.as_raw().clone(),
        }
    }

    /// Convert the frame into an [`image::RgbImage`], dropping any alpha
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut img = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                img.put_pixel(x, y, image::Rgb(self.pixel(x, y)));
            }
        }
        img
    }

    /// Frame width in pixels
    #[must_use]
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    #[must_use]
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout of the underlying buffer
    #[must_use]
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel buffer, row-major from the top-left corner
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read the RGB channels of the pixel at (x, y).
    ///
    /// The alpha channel of RGBA frames is skipped. Coordinates must be in
    /// bounds; `Frame::new` guarantees the buffer covers every (x, y).
    #[must_use]
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let stride = self.format.channels();
        let offset = (y as usize * self.width as usize + x as usize) * stride;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }
}

/// Abstract supplier of captured frames.
///
/// `Ok(None)` signals transient absence (camera not ready yet); the pipeline
/// stays idle and retries on the next tick. A hard `Err` is treated as a
/// fatal capture fault.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameError>;
}
