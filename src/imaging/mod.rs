//! Image processing: one source image in, one encoded image out.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` crate (JPEG, PNG, TIFF, WebP) |
//! | **Rasterize** | single inverse-mapped pass, rows split across `rayon` |
//! | **Encode** | `JpegEncoder` at 1–99%, `PngEncoder` at 100% |
//! | **Fit to size** | binary (or linear) search over quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and size math (unit testable)
//! - **Geometry / Color**: Rotation-and-mirror transform, color filter pipeline
//! - **Parameters**: Data structures describing a render or encode
//! - **Backend**: [`Rasterizer`] + [`Encoder`] traits and [`RustBackend`]
//! - **Search**: Quality search under a size budget
//! - **Operations**: High-level functions combining a session with a backend

pub mod backend;
mod calculations;
pub mod color;
pub mod geometry;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod search;

pub use backend::{
    BackendError, EncodedImage, Encoder, ImageBackend, OutputFormat, RasterBuffer, RasterImage,
    Rasterizer,
};
pub use calculations::{add_degrees, kilobytes, target_bytes_from_kb};
pub use color::ColorAdjustment;
pub use geometry::{AffineTransform, Flip, GeometryState, compose};
pub use operations::{EncodedResult, ExportArtifact, export, fit_to_target, measure, render};
pub use params::{MAX_QUALITY, MIN_QUALITY, OutputDimensions, Quality, RenderParams, Sampling};
pub use rust_backend::{RustBackend, decode_image, load_image};
pub use search::{Probe, SearchConfig, SearchOutcome, SearchStatus, SearchStrategy, find_quality};
