use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SkinToneError;
use crate::region::DEFAULT_MARGIN_RATIO;

/// Image file extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Largest accepted upload: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Tuning constants for the multi-scale face detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorTuning {
    /// Ratio between consecutive pyramid scales. Must be > 1.0.
    pub scale_step: f64,
    /// Overlapping detections a candidate needs before it is reported.
    pub min_neighbors: u32,
    /// Smallest face edge, in pixels, the detector will report.
    pub min_face_size: u32,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self {
            scale_step: 1.1,
            min_neighbors: 5,
            min_face_size: 30,
        }
    }
}

impl DetectorTuning {
    /// Validate tuning values.
    pub fn validate(&self) -> Result<(), SkinToneError> {
        if !self.scale_step.is_finite() || self.scale_step <= 1.0 {
            return Err(SkinToneError::InvalidTuning(format!(
                "scale step must be > 1.0, got {}",
                self.scale_step
            )));
        }
        if self.min_face_size == 0 {
            return Err(SkinToneError::InvalidTuning(
                "minimum face size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Limits applied to uploaded photos before they reach the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    /// Lowercase extensions, without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// True if `filename` carries an allowed extension (case-insensitive).
    pub fn allowed_file(&self, filename: &str) -> bool {
        extension_of(filename)
            .is_some_and(|ext| self.allowed_extensions.iter().any(|a| *a == ext))
    }

    /// Check an upload's name and size against the policy.
    pub fn check(&self, filename: &str, size: u64) -> Result<(), SkinToneError> {
        let ext = extension_of(filename).ok_or(SkinToneError::MissingExtension)?;
        if !self.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(SkinToneError::DisallowedExtension(format!(
                "allowed: {}",
                self.allowed_extensions.join(", ")
            )));
        }
        if size > self.max_bytes {
            return Err(SkinToneError::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercased text after the last `.` of `filename`.
fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Immutable settings handed to [`crate::SkinToneAnalyzer`] at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Margin added around a detected face, as a fraction of its size.
    pub margin_ratio: f64,
    /// Face detector tuning.
    pub detector: DetectorTuning,
    /// SeetaFace model file for the built-in detector. When `None` and no
    /// custom detector is supplied, every analysis uses the center region.
    pub model_path: Option<PathBuf>,
    /// Upload limits enforced by the host layer.
    pub upload: UploadPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            margin_ratio: DEFAULT_MARGIN_RATIO,
            detector: DetectorTuning::default(),
            model_path: None,
            upload: UploadPolicy::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Parse a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, SkinToneError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SkinToneError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, SkinToneError> {
        let text = std::fs::read_to_string(path).map_err(|e| SkinToneError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SkinToneError> {
        if !self.margin_ratio.is_finite() || self.margin_ratio < 0.0 {
            return Err(SkinToneError::InvalidMarginRatio(self.margin_ratio));
        }
        self.detector.validate()?;
        if self.upload.allowed_extensions.is_empty() {
            return Err(SkinToneError::InvalidConfig(
                "at least one upload extension must be allowed".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_constants() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.margin_ratio, 0.2);
        assert_eq!(config.detector.scale_step, 1.1);
        assert_eq!(config.detector.min_neighbors, 5);
        assert_eq!(config.detector.min_face_size, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = AnalyzerConfig::from_json(r#"{"margin_ratio": 0.3}"#).unwrap();
        assert_eq!(config.margin_ratio, 0.3);
        assert_eq!(config.detector, DetectorTuning::default());
        assert_eq!(config.upload.max_bytes, MAX_UPLOAD_BYTES);
    }

    #[test]
    fn json_rejects_negative_margin() {
        let result = AnalyzerConfig::from_json(r#"{"margin_ratio": -0.1}"#);
        assert!(matches!(result, Err(SkinToneError::InvalidMarginRatio(_))));
    }

    #[test]
    fn json_rejects_garbage() {
        let result = AnalyzerConfig::from_json("not json");
        assert!(matches!(result, Err(SkinToneError::InvalidConfig(_))));
    }

    #[test]
    fn tuning_rejects_shrinking_scale_step() {
        let tuning = DetectorTuning {
            scale_step: 0.9,
            ..DetectorTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn upload_accepts_known_extensions() {
        let policy = UploadPolicy::default();
        assert!(policy.check("portrait.JPG", 1024).is_ok());
        assert!(policy.check("a.b.webp", 1024).is_ok());
        assert!(policy.allowed_file("face.png"));
    }

    #[test]
    fn upload_rejects_missing_extension() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.check("portrait", 10),
            Err(SkinToneError::MissingExtension)
        ));
        assert!(matches!(
            policy.check("", 10),
            Err(SkinToneError::MissingExtension)
        ));
    }

    #[test]
    fn upload_rejects_other_types() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.check("notes.txt", 10),
            Err(SkinToneError::DisallowedExtension(_))
        ));
        assert!(!policy.allowed_file("archive.tar.gz"));
    }

    #[test]
    fn upload_rejects_large_files() {
        let policy = UploadPolicy::default();
        assert!(policy.check("big.png", MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            policy.check("big.png", MAX_UPLOAD_BYTES + 1),
            Err(SkinToneError::FileTooLarge { .. })
        ));
    }
}
