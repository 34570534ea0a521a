//! Parameter types for image operations.
//!
//! These structs describe *what* to render and encode, not *how*. They are the
//! interface between the [`session`](crate::session) (which owns the user's
//! current choices) and the [`backend`](super::backend) (which does the actual
//! pixel work). Keeping them plain data lets tests drive the backend with
//! synthetic parameters.
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality as a percent (1–100, default 92). Clamped on
//!   construction. 100 selects the lossless path.
//! - [`OutputDimensions`]: Output canvas size with the optional aspect-ratio lock.
//! - [`Sampling`]: How source pixels are sampled while drawing.
//! - [`RenderParams`]: Everything the rasterizer needs for one pass.

use super::calculations::{locked_height_for_width, locked_width_for_height};
use super::color::ColorAdjustment;
use super::geometry::GeometryState;
use serde::{Deserialize, Serialize};

pub const MIN_QUALITY: u32 = 1;
pub const MAX_QUALITY: u32 = 100;

/// Encoding quality as a percentage (1-100).
///
/// The fractional form in `[0.01, 1.0]` is what the codec sees. `100` is only
/// meaningful as "lossless": the lossy path never runs at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_QUALITY, MAX_QUALITY))
    }

    /// Build from a fraction in `[0.01, 1.0]`, rounding to the nearest percent.
    ///
    /// Only exactly `1.0` is lossless: anything below rounds to at most 99.
    pub fn from_fraction(fraction: f32) -> Self {
        let percent = (fraction * 100.0).round();
        if percent.is_nan() || percent < MIN_QUALITY as f32 {
            return Self(MIN_QUALITY);
        }
        let percent = percent as u32;
        if fraction < 1.0 {
            return Self::new(percent.min(MAX_QUALITY - 1));
        }
        Self::new(percent)
    }

    pub fn lossless() -> Self {
        Self(MAX_QUALITY)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }

    pub fn is_lossless(self) -> bool {
        self.0 == MAX_QUALITY
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

/// Output canvas size.
///
/// Both fields are always positive. When `locked` is set, every edit to one
/// field re-derives the other from the original aspect ratio; the field being
/// edited is the driving one and is never itself re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputDimensions {
    pub width: u32,
    pub height: u32,
    pub locked: bool,
    /// Source size the lock ratio and the empty-field fallback are taken from.
    pub original: (u32, u32),
}

impl OutputDimensions {
    /// Dimensions equal to the source, unlocked.
    pub fn from_source(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            locked: false,
            original: (width.max(1), height.max(1)),
        }
    }

    /// Set the width. `None` (an empty field) or zero falls back to the
    /// original width and leaves the height alone.
    pub fn with_width(self, width: Option<u32>) -> Self {
        match width.filter(|&w| w > 0) {
            Some(w) => {
                let height = if self.locked {
                    locked_height_for_width(w, self.original)
                } else {
                    self.height
                };
                Self {
                    width: w,
                    height,
                    ..self
                }
            }
            None => Self {
                width: self.original.0,
                ..self
            },
        }
    }

    /// Set the height. Mirror image of [`with_width`](Self::with_width).
    pub fn with_height(self, height: Option<u32>) -> Self {
        match height.filter(|&h| h > 0) {
            Some(h) => {
                let width = if self.locked {
                    locked_width_for_height(h, self.original)
                } else {
                    self.width
                };
                Self {
                    width,
                    height: h,
                    ..self
                }
            }
            None => Self {
                height: self.original.1,
                ..self
            },
        }
    }

    /// Toggling the lock does not re-derive anything by itself.
    pub fn with_lock(self, locked: bool) -> Self {
        Self { locked, ..self }
    }

    pub fn is_source_size(&self) -> bool {
        (self.width, self.height) == self.original
    }
}

/// Source sampling used while drawing the scaled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    #[default]
    Bilinear,
    Nearest,
}

/// Parameters for a single rasterization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub geometry: GeometryState,
    pub color: ColorAdjustment,
    pub sampling: Sampling,
}
