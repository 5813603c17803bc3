use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::config::DetectorTuning;
use crate::error::SkinToneError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// SeetaFace score credited per required neighbor vote. With the default
/// five votes this lands on a threshold of 2.0.
const SCORE_PER_NEIGHBOR: f64 = 0.4;

/// Sliding-window stride in pixels, both axes.
const WINDOW_STEP: u32 = 4;

/// Face detector backed by the `rustface` crate (SeetaFace funnel cascade).
///
/// The model is not bundled; load `seeta_fd_frontal_v1.0.bin` from disk with
/// [`RustfaceDetector::from_path`] or from memory with
/// [`RustfaceDetector::from_bytes`].
pub struct RustfaceDetector {
    model: rustface::Model,
    tuning: DetectorTuning,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file.
    pub fn from_path(path: &Path, tuning: DetectorTuning) -> Result<Self, SkinToneError> {
        let data = std::fs::read(path)
            .map_err(|e| SkinToneError::Model(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&data, tuning)
    }

    /// Parse a SeetaFace model from an in-memory buffer.
    pub fn from_bytes(data: &[u8], tuning: DetectorTuning) -> Result<Self, SkinToneError> {
        tuning.validate()?;
        let model = rustface::read_model(Cursor::new(data))
            .map_err(|e| SkinToneError::Model(e.to_string()))?;
        Ok(Self { model, tuning })
    }

    /// Tuning this detector was built with.
    pub fn tuning(&self) -> &DetectorTuning {
        &self.tuning
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBounds> {
        // The SeetaFace pyramid shrinks the image instead of growing the window.
        let pyramid_factor = (1.0 / self.tuning.scale_step) as f32;
        let score_thresh = self.tuning.min_neighbors as f64 * SCORE_PER_NEIGHBOR;

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.tuning.min_face_size);
        detector.set_score_thresh(score_thresh);
        detector.set_pyramid_scale_factor(pyramid_factor);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));
        debug!(faces = faces.len(), width, height, "rustface pass complete");

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    confidence: face.score(),
                }
            })
            .collect()
    }
}
