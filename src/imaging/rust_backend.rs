//! Pure Rust backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | Rasterize | inverse-mapped single pass, rows in parallel with `rayon` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (quality 100) |
//!
//! ## Rasterization
//!
//! Each output pixel center is mapped back through the inverse of
//! `translate(center) · R(θ) · S(flip)` into the drawn rectangle, which is the
//! output canvas size centered on the origin. Points that land outside the
//! rectangle stay transparent. Inside, the source is sampled at the matching
//! scaled position and the color filter runs on the sample. There is no
//! intermediate buffer between resize, geometry and color.

use super::backend::{
    BackendError, EncodedImage, Encoder, OutputFormat, RasterBuffer, RasterImage, Rasterizer,
    ensure_area,
};
use super::color::ColorFilter;
use super::params::{Quality, RenderParams, Sampling};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Whether `path` has an extension we can decode.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            INPUT_CANDIDATES
                .iter()
                .any(|(candidate, fmt)| ext.eq_ignore_ascii_case(candidate) && fmt.reading_enabled())
        })
}

/// Load and decode an image from disk.
///
/// Files without a supported image extension are rejected before any bytes
/// are read.
pub fn load_image(path: &Path) -> Result<RasterImage, BackendError> {
    if !is_supported_input(path) {
        return Err(BackendError::UnsupportedFormat(path.to_path_buf()));
    }
    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
    Ok(RasterImage::new(decoded.to_rgba8()))
}

/// Decode an in-memory payload (e.g. a dropped file).
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, BackendError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(RasterImage::new(decoded.to_rgba8()))
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Bilinear sample at continuous source coordinates (pixel centers at `.5`).
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> [u8; 4] {
    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;
    let fx = (sx - 0.5).clamp(0.0, max_x);
    let fy = (sy - 0.5).clamp(0.0, max_y);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    std::array::from_fn(|i| {
        let top = p00[i] as f64 * (1.0 - tx) + p10[i] as f64 * tx;
        let bottom = p01[i] as f64 * (1.0 - tx) + p11[i] as f64 * tx;
        (top * (1.0 - ty) + bottom * ty).round() as u8
    })
}

fn sample_nearest(src: &RgbaImage, sx: f64, sy: f64) -> [u8; 4] {
    let x = (sx.floor().max(0.0) as u32).min(src.width() - 1);
    let y = (sy.floor().max(0.0) as u32).min(src.height() - 1);
    src.get_pixel(x, y).0
}

impl Rasterizer for RustBackend {
    fn render(
        &self,
        source: &RasterImage,
        params: &RenderParams,
    ) -> Result<RasterBuffer, BackendError> {
        let (width, height) = (params.width, params.height);
        ensure_area(width, height)?;
        ensure_area(source.width(), source.height())?;

        let (w, h) = (width as f64, height as f64);
        let inverse = params
            .geometry
            .transform()
            .about_center(w / 2.0, h / 2.0)
            .invert()
            .ok_or(BackendError::InvalidBuffer { width, height })?;
        let filter: ColorFilter = params.color.filter();
        let src = source.pixels();
        let scale_x = src.width() as f64 / w;
        let scale_y = src.height() as f64 / h;

        let mut out = RgbaImage::new(width, height);
        let row_len = width as usize * 4;
        let buf: &mut [u8] = &mut out;
        buf.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let cy = y as f64 + 0.5;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let (lx, ly) = inverse.apply(x as f64 + 0.5, cy);
                    // Drawn rectangle spans [-w/2, w/2) × [-h/2, h/2).
                    let u = lx + w / 2.0;
                    let v = ly + h / 2.0;
                    if !(0.0..w).contains(&u) || !(0.0..h).contains(&v) {
                        continue;
                    }
                    let sampled = match params.sampling {
                        Sampling::Bilinear => sample_bilinear(src, u * scale_x, v * scale_y),
                        Sampling::Nearest => sample_nearest(src, u * scale_x, v * scale_y),
                    };
                    px.copy_from_slice(&filter.apply(sampled));
                }
            });

        Ok(out)
    }
}

/// Flatten RGBA onto black, as a canvas does when exporting without alpha.
fn flatten_onto_black(buffer: &RasterBuffer) -> Vec<u8> {
    buffer
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            [r, g, b].map(|c| ((c as u32 * a as u32 + 127) / 255) as u8)
        })
        .collect()
}

impl Encoder for RustBackend {
    fn encode(
        &self,
        buffer: &RasterBuffer,
        quality: Quality,
    ) -> Result<EncodedImage, BackendError> {
        ensure_area(buffer.width(), buffer.height())?;
        let format = OutputFormat::for_quality(quality);
        let mut bytes = Vec::new();
        let cursor = Cursor::new(&mut bytes);

        match format {
            OutputFormat::Png => PngEncoder::new(cursor)
                .write_image(
                    buffer.as_raw(),
                    buffer.width(),
                    buffer.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| BackendError::Encode(format!("PNG encode failed: {}", e)))?,
            OutputFormat::Jpeg => {
                let rgb = flatten_onto_black(buffer);
                JpegEncoder::new_with_quality(cursor, quality.value() as u8)
                    .write_image(
                        &rgb,
                        buffer.width(),
                        buffer.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?
            }
        }

        Ok(EncodedImage { bytes, format })
    }
}
