//! Shared test utilities for the edito test suite.
//!
//! Builders for small synthetic source images, so backend and session tests
//! never depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = gradient_image(64, 32);
//! let noisy = noise_image(64, 64, 7);
//! assert_eq!(source.pixels().get_pixel(0, 0).0, [0, 0, 128, 255]);
//! ```

use crate::imaging::RasterImage;
use image::{Rgba, RgbaImage};

/// Opaque image whose red channel ramps left to right and green channel top
/// to bottom. Every pixel is distinct along both axes, so any rotation or
/// mirror produces a different image.
pub fn gradient_image(width: u32, height: u32) -> RasterImage {
    let ramp = |v: u32, len: u32| -> u8 {
        if len <= 1 {
            0
        } else {
            (v * 255 / (len - 1)) as u8
        }
    };
    RasterImage::new(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([ramp(x, width), ramp(y, height), 128, 255])
    }))
}

/// Opaque deterministic noise. Noise compresses poorly, which makes encoded
/// size respond strongly to quality.
pub fn noise_image(width: u32, height: u32, seed: u64) -> RasterImage {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u8
    };
    RasterImage::new(RgbaImage::from_fn(width, height, |_, _| {
        Rgba([next(), next(), next(), 255])
    }))
}
