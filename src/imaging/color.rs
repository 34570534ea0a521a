//! Color adjustments and the per-pixel filter pipeline.
//!
//! Stages always run in the order brightness → saturate → invert → grayscale,
//! with the Filter Effects definitions browsers use for the CSS functions of the
//! same names. Each stage clamps its output to `[0, 1]`. Stages at their
//! neutral value are dropped from the pipeline entirely, so an identity
//! adjustment leaves pixels bit-for-bit untouched.

use serde::Serialize;

/// The four user-facing color controls, in percent.
///
/// Ranges: brightness and saturation `0..=200`, inversion and grayscale
/// `0..=100`. The input layer clamps; values outside the ranges are accepted
/// here and simply produce out-of-range filter amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorAdjustment {
    pub brightness: u32,
    pub saturation: u32,
    pub inversion: u32,
    pub grayscale: u32,
}

impl Default for ColorAdjustment {
    fn default() -> Self {
        Self {
            brightness: 100,
            saturation: 100,
            inversion: 0,
            grayscale: 0,
        }
    }
}

impl ColorAdjustment {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Build the filter pipeline for these settings.
    pub fn filter(&self) -> ColorFilter {
        let candidates = [
            (self.brightness != 100).then(|| FilterStage::Brightness(percent(self.brightness))),
            (self.saturation != 100).then(|| FilterStage::Saturate(percent(self.saturation))),
            (self.inversion != 0).then(|| FilterStage::Invert(percent(self.inversion).min(1.0))),
            (self.grayscale != 0).then(|| FilterStage::Grayscale(percent(self.grayscale).min(1.0))),
        ];
        ColorFilter {
            stages: candidates.into_iter().flatten().collect(),
        }
    }

    /// CSS `filter` string, e.g. `brightness(120%) saturate(100%) invert(0%) grayscale(0%)`.
    pub fn describe(&self) -> String {
        format!(
            "brightness({}%) saturate({}%) invert({}%) grayscale({}%)",
            self.brightness, self.saturation, self.inversion, self.grayscale
        )
    }
}

fn percent(value: u32) -> f32 {
    value as f32 / 100.0
}

/// One filter primitive with its amount as a fraction (1.0 = 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStage {
    Brightness(f32),
    Saturate(f32),
    Invert(f32),
    Grayscale(f32),
}

impl FilterStage {
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let out = match *self {
            FilterStage::Brightness(amount) => rgb.map(|c| c * amount),
            FilterStage::Saturate(s) => apply_matrix(&saturate_matrix(s), rgb),
            FilterStage::Invert(amount) => rgb.map(|c| amount + c * (1.0 - 2.0 * amount)),
            FilterStage::Grayscale(amount) => apply_matrix(&grayscale_matrix(amount), rgb),
        };
        out.map(|c| c.clamp(0.0, 1.0))
    }
}

fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn grayscale_matrix(amount: f32) -> [[f32; 3]; 3] {
    let g = 1.0 - amount;
    [
        [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
    ]
}

fn apply_matrix(m: &[[f32; 3]; 3], [r, g, b]: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * r + m[0][1] * g + m[0][2] * b,
        m[1][0] * r + m[1][1] * g + m[1][2] * b,
        m[2][0] * r + m[2][1] * g + m[2][2] * b,
    ]
}

/// Ordered filter pipeline. Alpha is never touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorFilter {
    stages: Vec<FilterStage>,
}

impl ColorFilter {
    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply(&self, pixel: [u8; 4]) -> [u8; 4] {
        if self.stages.is_empty() {
            return pixel;
        }
        let [r, g, b, a] = pixel;
        let rgb = self
            .stages
            .iter()
            .fold([r, g, b].map(|c| c as f32 / 255.0), |acc, stage| {
                stage.apply(acc)
            });
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        [r, g, b, a]
    }
}
