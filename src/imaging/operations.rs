//! High-level image operations.
//!
//! These functions combine an [`EditSession`] with a backend: they build
//! [`RenderParams`], rasterize, encode and search. The session itself is never
//! modified here; callers decide what to do with the results.

use super::backend::{BackendError, ImageBackend, OutputFormat, RasterBuffer, RasterImage};
use super::params::{Quality, RenderParams, Sampling};
use super::search::{Probe, SearchConfig, SearchOutcome, find_quality};
use crate::naming::export_filename;
use crate::session::EditSession;
use serde::Serialize;
use std::sync::mpsc::Sender;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Size and format of the current edit, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodedResult {
    pub byte_size: u64,
    pub format: OutputFormat,
    pub quality: Quality,
}

/// Everything an export sink needs to save the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub filename: String,
}

impl ExportArtifact {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Plan the rasterization pass for a session without executing it.
pub fn plan_render(session: &EditSession, sampling: Sampling) -> RenderParams {
    RenderParams {
        width: session.dimensions.width,
        height: session.dimensions.height,
        geometry: session.geometry,
        color: session.color,
        sampling,
    }
}

/// Rasterize the session's edits of `source`.
pub fn render(
    backend: &impl ImageBackend,
    source: &RasterImage,
    session: &EditSession,
    sampling: Sampling,
) -> Result<RasterBuffer> {
    backend.render(source, &plan_render(session, sampling))
}

/// Render and encode at the session's quality, reporting the exact size.
pub fn measure(
    backend: &impl ImageBackend,
    source: &RasterImage,
    session: &EditSession,
    sampling: Sampling,
) -> Result<EncodedResult> {
    let buffer = render(backend, source, session, sampling)?;
    let encoded = backend.encode(&buffer, session.quality)?;
    Ok(EncodedResult {
        byte_size: encoded.byte_size(),
        format: encoded.format,
        quality: session.quality,
    })
}

/// Render once, then search the quality that fits `target_bytes`.
pub fn fit_to_target(
    backend: &impl ImageBackend,
    source: &RasterImage,
    session: &EditSession,
    sampling: Sampling,
    target_bytes: u64,
    search: &SearchConfig,
    events: Option<&Sender<Probe>>,
) -> Result<SearchOutcome> {
    let buffer = render(backend, source, session, sampling)?;
    find_quality(backend, &buffer, target_bytes, search, events)
}

/// Render and encode for saving. The filename carries `timestamp_ms` and the
/// extension of the chosen format.
pub fn export(
    backend: &impl ImageBackend,
    source: &RasterImage,
    session: &EditSession,
    sampling: Sampling,
    filename_prefix: &str,
    timestamp_ms: u128,
) -> Result<ExportArtifact> {
    let buffer = render(backend, source, session, sampling)?;
    let encoded = backend.encode(&buffer, session.quality)?;
    Ok(ExportArtifact {
        filename: export_filename(filename_prefix, timestamp_ms, encoded.format),
        format: encoded.format,
        bytes: encoded.bytes,
    })
}
