//! Export filename convention.
//!
//! Exported files are named `<prefix>-<millis>.<ext>`:
//! - `prefix` comes from config (`edito-image` by default)
//! - `millis` is the creation time in milliseconds since the Unix epoch, so two
//!   exports of the same edit never collide
//! - `ext` is `png` for lossless output and `jpg` otherwise
//!
//! For example `edito-image-1718031234567.jpg`.

use crate::imaging::OutputFormat;
use std::time::{SystemTime, UNIX_EPOCH};

/// Build the suggested filename for an export.
pub fn export_filename(prefix: &str, timestamp_ms: u128, format: OutputFormat) -> String {
    format!("{}-{}.{}", prefix, timestamp_ms, format.extension())
}

/// Current time in milliseconds since the Unix epoch (0 if the clock is before it).
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Whether `prefix` can be used as a filename prefix on every platform.
pub fn is_valid_prefix(prefix: &str) -> bool {
    const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    !prefix.is_empty()
        && !prefix
            .chars()
            .any(|c| RESERVED.contains(&c) || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossy_export_uses_jpg() {
        assert_eq!(
            export_filename("edito-image", 1718031234567, OutputFormat::Jpeg),
            "edito-image-1718031234567.jpg"
        );
    }

    #[test]
    fn lossless_export_uses_png() {
        assert_eq!(
            export_filename("edito-image", 42, OutputFormat::Png),
            "edito-image-42.png"
        );
    }

    #[test]
    fn timestamp_is_after_2020() {
        assert!(timestamp_millis() > 1_577_836_800_000);
    }

    #[test]
    fn prefix_validation() {
        assert!(is_valid_prefix("edito-image"));
        assert!(is_valid_prefix("holiday 2024"));
        assert!(!is_valid_prefix(""));
        assert!(!is_valid_prefix("../escape"));
        assert!(!is_valid_prefix("a\\b"));
        assert!(!is_valid_prefix("tab\there"));
    }
}
