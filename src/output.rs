//! CLI output formatting for editor results and progress.
//!
//! # Output Format
//!
//! ## Size readout
//!
//! Printed after every edit, and by `edito size`:
//!
//! ```text
//! Image: 1600x1200
//! Output: 800x600 (aspect locked)
//! Geometry: rotate(90deg) scale(-1, 1)
//! Filter: brightness(120%) saturate(100%) invert(0%) grayscale(0%)
//! Current: 143 KB (Quality: 92%)
//! ```
//!
//! ## Target search
//!
//! ```text
//! Target: 100 KB
//!     51% → 88 KB fits
//!     76% → 121 KB too large
//!     ...
//! Quality: 68% (99 KB)
//! ```
//!
//! A search that could not converge adds a `Warning:` line below the result.
//!
//! ## Export
//!
//! ```text
//! Export: edito-image-1718031234567.jpg
//! Final file size: 99 KB
//! Wrote ./edito-image-1718031234567.jpg
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{EncodedResult, Probe, SearchOutcome, SearchStatus, kilobytes};
use crate::session::{EditSession, EditorEvent};
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `Current: N KB (Quality: Q%)`.
pub fn format_size_line(result: &EncodedResult) -> String {
    format!(
        "Current: {} KB (Quality: {}%)",
        kilobytes(result.byte_size),
        result.quality.value()
    )
}

/// Output geometry and filter of a session, one aspect per line.
pub fn format_session(session: &EditSession) -> Vec<String> {
    let dims = &session.dimensions;
    let lock = if dims.locked { " (aspect locked)" } else { "" };
    vec![
        format!("Output: {}x{}{}", dims.width, dims.height, lock),
        format!("Geometry: {}", session.geometry.describe()),
        format!("Filter: {}", session.color.describe()),
    ]
}

pub fn format_probe(probe: &Probe) -> String {
    let verdict = if probe.fits { "fits" } else { "too large" };
    format!(
        "{}{}% → {} KB {}",
        indent(1),
        probe.quality,
        kilobytes(probe.bytes),
        verdict
    )
}

/// Result line plus a warning when the quality is not the exact optimum.
pub fn format_search_outcome(outcome: &SearchOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome.encoded_bytes {
        Some(bytes) => lines.push(format!(
            "Quality: {}% ({} KB)",
            outcome.quality.value(),
            kilobytes(bytes)
        )),
        None => lines.push(format!("Quality: {}%", outcome.quality.value())),
    }
    if outcome.is_exact() {
        return lines;
    }
    lines.push(match outcome.status {
        SearchStatus::UnreachableTarget => format!(
            "Warning: {} KB is below the smallest encoding; using the lowest quality tried",
            kilobytes(outcome.target_bytes)
        ),
        _ => format!(
            "Warning: stopped after {} encodes; quality is approximate",
            outcome.probes.len()
        ),
    });
    lines
}

pub fn format_export(filename: &str, byte_size: u64) -> Vec<String> {
    vec![
        format!("Export: {}", filename),
        format!("Final file size: {} KB", kilobytes(byte_size)),
    ]
}

/// Lines for one progress event.
pub fn format_editor_event(event: &EditorEvent) -> Vec<String> {
    match event {
        EditorEvent::ImageLoaded { width, height } => {
            vec![format!("Image: {}x{}", width, height)]
        }
        EditorEvent::ChangeApplied { change, result } => {
            vec![format!("{}{} → {}", indent(1), change, format_size_line(result))]
        }
        EditorEvent::SearchStarted { target_bytes } => {
            vec![format!("Target: {} KB", kilobytes(*target_bytes))]
        }
        EditorEvent::SearchProbe(probe) => vec![format_probe(probe)],
        EditorEvent::SearchFinished(outcome) => format_search_outcome(outcome),
        EditorEvent::Exported {
            filename,
            byte_size,
        } => format_export(filename, *byte_size),
    }
}

pub fn print_editor_event(event: &EditorEvent) {
    for line in format_editor_event(event) {
        println!("{}", line);
    }
}

pub fn print_session(session: &EditSession, result: &EncodedResult) {
    for line in format_session(session) {
        println!("{}", line);
    }
    println!("{}", format_size_line(result));
}

pub fn print_written(path: &Path) {
    println!("Wrote {}", path.display());
}
