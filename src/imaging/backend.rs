//! Rendering/encoding backend traits and shared types.
//!
//! Two capabilities sit at the seam between edit logic and pixel work:
//!
//! - [`Rasterizer`] turns a source image plus [`RenderParams`] into a new
//!   raster buffer in one pass.
//! - [`Encoder`] serializes a buffer at a [`Quality`] and reports the exact
//!   payload.
//!
//! [`ImageBackend`] is both. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the
//! [`MockBackend`](tests::MockBackend) below with synthetic size curves.

use super::params::{Quality, RenderParams};
use image::RgbaImage;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Invalid buffer: {width}x{height} has no area")]
    InvalidBuffer { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// In-memory RGBA raster produced by a [`Rasterizer`].
pub type RasterBuffer = RgbaImage;

/// An immutable decoded source image.
///
/// Cloning shares the pixel data; nothing ever mutates it. Loading a new file
/// produces a new `RasterImage` rather than changing this one.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Container format of an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy, quality-parameterized.
    Jpeg,
    /// Lossless.
    Png,
}

impl OutputFormat {
    /// Lossless exactly when quality is 100%.
    pub fn for_quality(quality: Quality) -> Self {
        if quality.is_lossless() {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn is_lossless(self) -> bool {
        self == OutputFormat::Png
    }
}

/// Encoded payload plus the format it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl EncodedImage {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Fails with [`BackendError::InvalidBuffer`] when a buffer has no pixels.
pub fn ensure_area(width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidBuffer { width, height });
    }
    Ok(())
}

/// Single-pass rasterization of a source image.
pub trait Rasterizer {
    /// Render `source` into a `params.width × params.height` buffer with
    /// geometry and color applied.
    fn render(
        &self,
        source: &RasterImage,
        params: &RenderParams,
    ) -> Result<RasterBuffer, BackendError>;
}

/// Serialization of a raster buffer.
pub trait Encoder {
    /// Encode `buffer`. Quality 100 selects the lossless format.
    fn encode(&self, buffer: &RasterBuffer, quality: Quality)
    -> Result<EncodedImage, BackendError>;
}

/// A full backend: both capabilities behind one value.
pub trait ImageBackend: Rasterizer + Encoder {}

impl<T: Rasterizer + Encoder> ImageBackend for T {}
