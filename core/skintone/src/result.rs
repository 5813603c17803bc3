use serde::{Deserialize, Serialize};

use crate::error::SkinToneError;
use crate::sampler::ColorSample;
use crate::tone::SkinTone;

/// Tone reported whenever analysis cannot produce a measurement.
pub const FALLBACK_TONE: SkinTone = SkinTone::Medium;

/// Color reported whenever analysis cannot produce a measurement.
pub const FALLBACK_RGB: [u8; 3] = [150, 120, 100];

/// Status messages carried in [`DetectionResult::message`].
pub mod messages {
    /// A face was found and sampled.
    pub const FACE_DETECTED: &str = "Face detected; skin tone from face region.";
    /// No face was found; the center of the image was sampled.
    pub const NO_FACE: &str = "No face detected; used center region for color.";
    /// The input path does not point at a file.
    pub const FILE_NOT_FOUND: &str = "Image file not found.";
    /// The file exists but could not be read or decoded.
    pub const UNREADABLE: &str = "Could not read image.";
    /// The sampling region came out with zero pixels.
    pub const EMPTY_REGION: &str = "Could not extract region.";
    /// Any other failure during analysis.
    pub const ANALYSIS_FAILED: &str = "Analysis failed; using default.";
}

/// Outcome of one skin-tone analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Classified tone.
    #[serde(rename = "skin_tone")]
    pub tone: SkinTone,
    /// Integer color triple.
    pub rgb: [u8; 3],
    /// Mean red channel, one decimal place.
    pub r: f64,
    /// Mean green channel, one decimal place.
    pub g: f64,
    /// Mean blue channel, one decimal place.
    pub b: f64,
    /// Whether a face was located in the image.
    pub face_detected: bool,
    /// Human-readable status.
    pub message: String,
}

impl DetectionResult {
    /// The fixed result returned on every failure path.
    ///
    /// Host layers that guard calls into the analyzer should build their
    /// own fallback through this function rather than repeating the values.
    pub fn fallback(message: &str) -> Self {
        let [r, g, b] = FALLBACK_RGB;
        Self {
            tone: FALLBACK_TONE,
            rgb: FALLBACK_RGB,
            r: r as f64,
            g: g as f64,
            b: b as f64,
            face_detected: false,
            message: message.to_string(),
        }
    }

    /// Fallback result for an analysis error.
    pub fn from_error(err: &SkinToneError) -> Self {
        let message = match err {
            SkinToneError::NotFound(_) => messages::FILE_NOT_FOUND,
            SkinToneError::Io(_) | SkinToneError::DecodeError(_) => messages::UNREADABLE,
            SkinToneError::EmptyRegion => messages::EMPTY_REGION,
            _ => messages::ANALYSIS_FAILED,
        };
        Self::fallback(message)
    }

    /// Successful measurement.
    pub(crate) fn measured(tone: SkinTone, sample: ColorSample, face_detected: bool) -> Self {
        let message = if face_detected {
            messages::FACE_DETECTED
        } else {
            messages::NO_FACE
        };
        Self {
            tone,
            rgb: sample.rgb(),
            r: sample.r,
            g: sample.g,
            b: sample.b,
            face_detected,
            message: message.to_string(),
        }
    }

    /// The color triple as plain integers.
    ///
    /// Bindings convert `[u8; N]` to byte strings; hosts expecting a list of
    /// ints should build it from this.
    pub fn rgb_values(&self) -> [u32; 3] {
        self.rgb.map(u32::from)
    }

    /// True if this is one of the fallback results rather than a measurement.
    pub fn is_fallback(&self) -> bool {
        !matches!(self.message.as_str(), messages::FACE_DETECTED | messages::NO_FACE)
    }

    /// Serialize to a JSON object with the host layer's field names.
    pub fn to_json(&self) -> Result<String, SkinToneError> {
        serde_json::to_string(self).map_err(|e| SkinToneError::EncodeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fallback_uses_sentinel_values() {
        let result = DetectionResult::fallback(messages::ANALYSIS_FAILED);
        assert_eq!(result.tone, SkinTone::Medium);
        assert_eq!(result.rgb, [150, 120, 100]);
        assert_eq!((result.r, result.g, result.b), (150.0, 120.0, 100.0));
        assert!(!result.face_detected);
        assert!(result.is_fallback());
    }

    #[test]
    fn errors_map_to_messages() {
        let cases = [
            (
                SkinToneError::NotFound(PathBuf::from("x.png")),
                messages::FILE_NOT_FOUND,
            ),
            (
                SkinToneError::DecodeError("bad".to_string()),
                messages::UNREADABLE,
            ),
            (SkinToneError::Io("denied".to_string()), messages::UNREADABLE),
            (SkinToneError::EmptyRegion, messages::EMPTY_REGION),
            (SkinToneError::Panicked("boom".to_string()), messages::ANALYSIS_FAILED),
        ];
        for (err, expected) in cases {
            assert_eq!(DetectionResult::from_error(&err).message, expected);
        }
    }

    #[test]
    fn measured_result_reports_face_flag() {
        let sample = ColorSample {
            r: 200.0,
            g: 100.0,
            b: 50.0,
        };
        let with_face = DetectionResult::measured(SkinTone::Medium, sample, true);
        assert_eq!(with_face.message, messages::FACE_DETECTED);
        assert!(!with_face.is_fallback());

        let without = DetectionResult::measured(SkinTone::Medium, sample, false);
        assert_eq!(without.message, messages::NO_FACE);
        assert!(!without.face_detected);
    }

    #[test]
    fn json_uses_host_field_names() {
        let json = DetectionResult::fallback(messages::FILE_NOT_FOUND)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["skin_tone"], "Medium");
        assert_eq!(value["rgb"], serde_json::json!([150, 120, 100]));
        assert_eq!(value["face_detected"], false);
        assert_eq!(value["message"], messages::FILE_NOT_FOUND);
    }

    #[test]
    fn rgb_values_are_integers_not_bytes() {
        let result = DetectionResult::fallback(messages::NO_FACE);
        let values: [u32; 3] = result.rgb_values();
        assert_eq!(values, [150, 120, 100]);

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        let rgb = json["rgb"].as_array().unwrap();
        assert!(rgb.iter().all(|v| v.is_u64()));
        assert_eq!(rgb.len(), 3);
    }
}
