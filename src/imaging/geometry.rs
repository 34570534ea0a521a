//! Rotation and mirroring around the canvas center.
//!
//! The composed transform is `R(θ) · S(flip_h, flip_v)`: a point in the drawn
//! image is mirrored first and rotated second. Swapping the factors changes the
//! result for quarter turns (mirror-then-rotate-90 is not rotate-90-then-mirror),
//! so [`compose`] is the only place that builds the linear part.
//!
//! Coordinates are y-down, so a positive angle turns clockwise on screen.

use super::calculations::normalize_degrees;
use serde::Serialize;

/// Mirror state of one axis, a scale factor of `+1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Flip {
    #[default]
    Normal,
    Mirrored,
}

impl Flip {
    pub fn toggled(self) -> Self {
        match self {
            Flip::Normal => Flip::Mirrored,
            Flip::Mirrored => Flip::Normal,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Flip::Normal => 1.0,
            Flip::Mirrored => -1.0,
        }
    }
}

/// User-facing geometry choices.
///
/// `rotation_degrees` is kept unbounded (rotating left four times gives -360)
/// and only wraps when a transform is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GeometryState {
    pub rotation_degrees: i32,
    pub flip_horizontal: Flip,
    pub flip_vertical: Flip,
}

impl GeometryState {
    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.rotation_degrees) == 0
            && self.flip_horizontal == Flip::Normal
            && self.flip_vertical == Flip::Normal
    }

    pub fn transform(&self) -> AffineTransform {
        compose(
            self.rotation_degrees,
            self.flip_horizontal,
            self.flip_vertical,
        )
    }

    /// CSS-style description, e.g. `rotate(90deg) scale(-1, 1)`.
    pub fn describe(&self) -> String {
        format!(
            "rotate({}deg) scale({}, {})",
            self.rotation_degrees,
            self.flip_horizontal.sign(),
            self.flip_vertical.sign()
        )
    }
}

/// 2D affine transform in canvas form:
///
/// ```text
/// x' = a·x + c·y + e
/// y' = b·x + d·y + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation. Quarter turns use exact coefficients so that
    /// `R` and `R + 360` produce bit-identical matrices.
    pub fn rotation(degrees: i32) -> Self {
        let (sin, cos) = match normalize_degrees(degrees) {
            0 => (0.0, 1.0),
            90 => (1.0, 0.0),
            180 => (0.0, -1.0),
            270 => (-1.0, 0.0),
            other => (other as f64).to_radians().sin_cos(),
        };
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self · other`: `other` is applied to a point first.
    pub fn then_apply_after(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }

    /// Same linear part applied about `(cx, cy)` instead of the origin.
    pub fn about_center(&self, cx: f64, cy: f64) -> Self {
        AffineTransform::translation(cx, cy).then_apply_after(self)
    }
}

/// Compose rotation and mirroring into one transform about the origin.
pub fn compose(rotation_degrees: i32, flip_h: Flip, flip_v: Flip) -> AffineTransform {
    AffineTransform::rotation(rotation_degrees)
        .then_apply_after(&AffineTransform::scale(flip_h.sign(), flip_v.sign()))
}
