use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SkinToneError;

// Heuristic thresholds with no calibration dataset behind them. Kept as-is
// for compatibility with existing callers; change only with ground truth.

/// Minimum luminance for the Fair category.
pub const FAIR_MIN_LUMINANCE: f64 = 180.0;
/// Minimum red channel for the Fair category.
pub const FAIR_MIN_RED: f64 = 170.0;
/// Minimum luminance for Medium and Olive.
pub const MID_MIN_LUMINANCE: f64 = 140.0;
/// Lower bound of `g / r` for an olive undertone.
pub const OLIVE_MIN_GREEN_RATIO: f64 = 0.92;
/// Upper bound of `g / r` for an olive undertone.
pub const OLIVE_MAX_GREEN_RATIO: f64 = 1.08;

/// Skin-tone category, ordered from lightest to darkest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkinTone {
    /// Light skin with high red dominance.
    Fair,
    /// Mid-range luminance.
    Medium,
    /// Mid-range luminance with green close to red.
    Olive,
    /// Low luminance.
    Deep,
}

impl SkinTone {
    /// Every category, lightest first.
    pub const ALL: [SkinTone; 4] = [
        SkinTone::Fair,
        SkinTone::Medium,
        SkinTone::Olive,
        SkinTone::Deep,
    ];

    /// Display name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinTone::Fair => "Fair",
            SkinTone::Medium => "Medium",
            SkinTone::Olive => "Olive",
            SkinTone::Deep => "Deep",
        }
    }
}

impl fmt::Display for SkinTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkinTone {
    type Err = SkinToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkinTone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SkinToneError::UnknownTone(s.to_string()))
    }
}

/// Perceived brightness of an RGB triple (ITU-R BT.601 weights).
pub fn luminance(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Map an average face color to a [`SkinTone`].
///
/// First match wins:
/// 1. luminance ≥ 180 and r ≥ 170 → Fair
/// 2. luminance ≥ 140 and 0.92·r ≤ g ≤ 1.08·r → Olive
/// 3. luminance ≥ 140 → Medium
/// 4. otherwise → Deep
///
/// Every comparison is inclusive.
pub fn classify(r: f64, g: f64, b: f64) -> SkinTone {
    let lum = luminance(r, g, b);
    if lum >= FAIR_MIN_LUMINANCE && r >= FAIR_MIN_RED {
        return SkinTone::Fair;
    }
    if lum >= MID_MIN_LUMINANCE {
        if g >= r * OLIVE_MIN_GREEN_RATIO && g <= r * OLIVE_MAX_GREEN_RATIO {
            return SkinTone::Olive;
        }
        return SkinTone::Medium;
    }
    SkinTone::Deep
}
