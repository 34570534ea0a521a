//! # edito
//!
//! A single-image editor pipeline: geometry and color edits, resizing, and
//! encoding under a file-size budget. One source image goes in, one encoded
//! file comes out, and the encoded size is known after every edit.
//!
//! # Architecture: Session → Render → Encode
//!
//! ```text
//! ParameterChange  →  EditSession        (pure state update)
//! EditSession      →  RasterBuffer       (one rasterization pass)
//! RasterBuffer     →  EncodedImage       (JPEG 1-99%, PNG at 100%)
//! target KB        →  Quality            (search over encodes of one buffer)
//! ```
//!
//! Every stage is derived from the session and the source image alone. Nothing
//! is cached between edits: each change re-renders and re-encodes, so the size
//! readout is always the size the export would have.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | `EditSession`, `ParameterChange` dispatch, and the `Editor` controller with its progress events |
//! | [`imaging`] | Geometry, color filters, rasterizer, encoder, quality search |
//! | [`config`] | `edito.toml` loading, validation, merging over stock defaults |
//! | [`naming`] | `<prefix>-<millis>.<ext>` export filenames |
//! | [`output`] | CLI output formatting for sizes, searches and exports |
//!
//! # Design Decisions
//!
//! ## One Pass, Then Encode Many
//!
//! Rendering does not depend on quality. A target-size search renders the
//! session once and encodes that buffer at each probed quality, so a search
//! costs one render plus about seven encodes.
//!
//! ## Lossless Means PNG
//!
//! Quality 100 is not "JPEG at 100": it switches the encoder to PNG, keeping
//! transparency. Every other quality is JPEG, where transparent areas (the
//! corners left uncovered by a resize that changes aspect) are flattened onto
//! black.
//!
//! ## Search Outcomes Are Values
//!
//! A size target that cannot be met is not an error. The search always returns
//! a usable quality and a [`SearchStatus`](imaging::SearchStatus) saying whether
//! it is the exact best fit, an approximation from an exhausted iteration
//! budget, or the lowest quality tried for a target no encoding reaches.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
