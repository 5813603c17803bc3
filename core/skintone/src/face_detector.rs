use image::DynamicImage;
use tracing::debug;

use crate::region::{expand_rect, Region};

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score.
    pub confidence: f64,
}

impl FaceBounds {
    /// Integer pixel rectangle for these bounds, clamped to the image.
    ///
    /// Negative coordinates (detectors may report boxes that start just
    /// outside the frame) are pulled to zero and the size shrinks to match.
    pub fn to_region(&self, image_width: u32, image_height: u32) -> Region {
        let x1 = self.x.max(0.0).min(image_width as f64) as u32;
        let y1 = self.y.max(0.0).min(image_height as f64) as u32;
        let x2 = (self.x + self.width).max(0.0).min(image_width as f64) as u32;
        let y2 = (self.y + self.height).max(0.0).min(image_height as f64) as u32;
        Region::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    /// Sampling region: these bounds grown by `margin_ratio` of their own
    /// size, then clamped to the image. Coordinates are truncated to whole
    /// pixels first. Empty when the box lies outside the image.
    pub fn expand(&self, image_width: u32, image_height: u32, margin_ratio: f64) -> Region {
        expand_rect(
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
            image_width,
            image_height,
            margin_ratio,
        )
    }

    /// Raw box area, before any clamping.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom face detector (ONNX, Haar cascade,
/// etc.) and pass it to [`crate::SkinToneAnalyzer::face_detector`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBounds>;
}

/// Pick the candidate with the largest `width × height`; on ties the
/// earliest wins. Boxes are compared as reported, so one that overhangs the
/// image (or misses it entirely) can still be chosen.
pub fn largest_face(faces: &[FaceBounds]) -> Option<&FaceBounds> {
    let mut best: Option<&FaceBounds> = None;
    for face in faces {
        match best {
            Some(current) if current.area() >= face.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

/// Run `detector` over the luma channel of `image` and return the largest face.
pub fn locate(detector: &dyn FaceDetector, image: &DynamicImage) -> Option<FaceBounds> {
    let gray = image.to_luma8();
    let (width, height) = (gray.width(), gray.height());
    let faces = detector.detect(gray.as_raw(), width, height);
    debug!(candidates = faces.len(), "face detection finished");
    largest_face(&faces).cloned()
}
