//! Pure calculation functions for dimensions, sizes and quality mapping.
//!
//! All functions here are pure and testable without any I/O or images.

/// Height that keeps the original aspect ratio for a given width.
///
/// `round(width × original_height / original_width)`, never below 1.
/// A 1000×500 original locked to width 400 gives height 200.
pub fn locked_height_for_width(width: u32, original: (u32, u32)) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return width.max(1);
    }
    let ratio = orig_h as f64 / orig_w as f64;
    ((width as f64 * ratio).round() as u32).max(1)
}

/// Width that keeps the original aspect ratio for a given height.
pub fn locked_width_for_height(height: u32, original: (u32, u32)) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_h == 0 {
        return height.max(1);
    }
    let ratio = orig_w as f64 / orig_h as f64;
    ((height as f64 * ratio).round() as u32).max(1)
}

/// Byte count as whole kilobytes (1 KB = 1024 bytes), rounded to nearest.
pub fn kilobytes(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}

/// Byte budget for a size target entered in kilobytes.
pub fn target_bytes_from_kb(kb: u64) -> u64 {
    kb.saturating_mul(1024)
}

/// Midpoint of a quality interval, rounding halves up.
pub fn midpoint(low: u32, high: u32) -> u32 {
    (low + high).div_ceil(2)
}

/// Normalize a rotation in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Accumulate a rotation. Keeps the running total while it fits in `i32`;
/// past that, falls back to the equivalent angle in `[0, 360)`.
pub fn add_degrees(current: i32, delta: i32) -> i32 {
    current
        .checked_add(delta)
        .unwrap_or_else(|| (i64::from(current) + i64::from(delta)).rem_euclid(360) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_height_landscape() {
        assert_eq!(locked_height_for_width(400, (1000, 500)), 200);
        assert_eq!(locked_height_for_width(333, (1000, 500)), 167);
    }

    #[test]
    fn locked_width_landscape() {
        assert_eq!(locked_width_for_height(100, (1000, 500)), 200);
    }

    #[test]
    fn locked_dimensions_never_zero() {
        assert_eq!(locked_height_for_width(1, (1000, 10)), 1);
        assert_eq!(locked_width_for_height(1, (10, 1000)), 1);
    }

    #[test]
    fn locked_dimensions_degenerate_original() {
        assert_eq!(locked_height_for_width(50, (0, 100)), 50);
        assert_eq!(locked_width_for_height(50, (100, 0)), 50);
    }

    #[test]
    fn kilobytes_rounds_to_nearest() {
        assert_eq!(kilobytes(0), 0);
        assert_eq!(kilobytes(511), 0);
        assert_eq!(kilobytes(512), 1);
        assert_eq!(kilobytes(1024), 1);
        assert_eq!(kilobytes(1535), 1);
        assert_eq!(kilobytes(1536), 2);
    }

    #[test]
    fn target_bytes_saturates() {
        assert_eq!(target_bytes_from_kb(50), 51_200);
        assert_eq!(target_bytes_from_kb(u64::MAX), u64::MAX);
    }

    #[test]
    fn midpoint_rounds_half_up() {
        assert_eq!(midpoint(1, 100), 51);
        assert_eq!(midpoint(1, 2), 2);
        assert_eq!(midpoint(98, 100), 99);
        assert_eq!(midpoint(50, 50), 50);
    }

    #[test]
    fn normalize_degrees_wraps_both_directions() {
        assert_eq!(normalize_degrees(0), 0);
        assert_eq!(normalize_degrees(450), 90);
        assert_eq!(normalize_degrees(-90), 270);
        assert_eq!(normalize_degrees(-720), 0);
    }

    #[test]
    fn add_degrees_accumulates() {
        assert_eq!(add_degrees(-360, -90), -450);
        assert_eq!(add_degrees(90, 270), 360);
    }

    #[test]
    fn add_degrees_keeps_orientation_at_i32_limits() {
        let near_max = 2_147_483_610;
        let turned = add_degrees(near_max, 90);
        assert_eq!(
            normalize_degrees(turned),
            ((i64::from(near_max) + 90) % 360) as i32
        );

        let near_min = -2_147_483_610;
        let turned = add_degrees(near_min, -90);
        assert_eq!(
            normalize_degrees(turned),
            (i64::from(near_min) - 90).rem_euclid(360) as i32
        );
    }
}
