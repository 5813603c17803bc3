//! Skin-tone estimation from portrait photos: locate the face, sample its
//! color, and classify it as Fair, Medium, Olive or Deep.
//!
//! # Example
//!
//! ```no_run
//! use skintone::SkinToneAnalyzer;
//!
//! let result = SkinToneAnalyzer::new().analyze("photo.jpg");
//! println!("{} {:?} ({})", result.tone, result.rgb, result.message);
//! ```
//!
//! Analysis never fails outward: missing files, undecodable images, empty
//! regions and internal errors all produce the fallback
//! [`DetectionResult`] with an explanatory message.
#![warn(missing_docs)]

/// Analyzer configuration and upload limits.
pub mod config;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod pipeline;
pub mod recommend;
/// Region-of-interest geometry.
pub mod region;
/// Analysis result and fallback values.
pub mod result;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Channel averaging over a region.
pub mod sampler;
/// Tone categories and the classifier.
pub mod tone;

use std::path::Path;

use image::DynamicImage;
use tracing::instrument;

pub use config::{AnalyzerConfig, DetectorTuning, UploadPolicy};
/// Error type returned by skintone operations.
pub use error::SkinToneError;
/// Face detection trait and face bounding-box type.
pub use face_detector::{FaceBounds, FaceDetector};
pub use recommend::{Presentation, Recommendation, Recommender, TemplateRecommender};
pub use region::Region;
pub use result::{DetectionResult, FALLBACK_RGB, FALLBACK_TONE};
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;
pub use sampler::{ChannelOrder, ColorSample};
pub use tone::{classify, SkinTone};

/// Skin-tone analyzer.
///
/// Holds an immutable [`AnalyzerConfig`] and an optional face detector. Each
/// `analyze*` call is independent; one analyzer can serve many threads.
pub struct SkinToneAnalyzer {
    config: AnalyzerConfig,
    /// When `None`, every image is sampled from its center region.
    detector: Option<Box<dyn FaceDetector>>,
}

impl Default for SkinToneAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SkinToneAnalyzer {
    /// Analyzer with default configuration and no face detector.
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            detector: None,
        }
    }

    /// Analyzer built from `config`.
    ///
    /// With the `rustface` feature, a configured `model_path` loads the
    /// built-in detector; a model that fails to load is an error here rather
    /// than a silent per-request fallback.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self, SkinToneError> {
        config.validate()?;

        #[cfg(feature = "rustface")]
        let detector: Option<Box<dyn FaceDetector>> = match &config.model_path {
            Some(path) => Some(Box::new(RustfaceDetector::from_path(
                path,
                config.detector.clone(),
            )?)),
            None => None,
        };

        #[cfg(not(feature = "rustface"))]
        let detector: Option<Box<dyn FaceDetector>> = None;

        Ok(Self { config, detector })
    }

    /// Set the face margin ratio (default: 0.2).
    ///
    /// The sampled region grows by `ratio` × the face's width and height on
    /// every side.
    pub fn margin_ratio(mut self, ratio: f64) -> Result<Self, SkinToneError> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(SkinToneError::InvalidMarginRatio(ratio));
        }
        self.config.margin_ratio = ratio;
        Ok(self)
    }

    /// Provide a custom face detector implementation.
    ///
    /// Replaces any detector loaded from the configuration.
    ///
    /// ```no_run
    /// use skintone::{FaceBounds, FaceDetector, SkinToneAnalyzer};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBounds> {
    ///         // Your detection logic here
    ///         vec![]
    ///     }
    /// }
    ///
    /// let result = SkinToneAnalyzer::new()
    ///     .face_detector(Box::new(MyDetector))
    ///     .analyze("photo.jpg");
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// True if a face detector is available.
    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    /// Analyze the image file at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn analyze(&self, path: impl AsRef<Path>) -> DetectionResult {
        pipeline::settle(self.try_analyze(path))
    }

    /// Analyze encoded image bytes (PNG, JPEG, GIF or WebP).
    #[instrument(skip_all, fields(len = input.len()))]
    pub fn analyze_bytes(&self, input: &[u8]) -> DetectionResult {
        pipeline::settle(pipeline::guarded(|| {
            let image = pipeline::decode_image(input)?;
            self.measure(&image)
        }))
    }

    /// Analyze an already decoded image.
    pub fn analyze_image(&self, image: &DynamicImage) -> DetectionResult {
        pipeline::settle(pipeline::guarded(|| self.measure(image)))
    }

    /// Analyze a packed 8-bit three-channel pixel buffer.
    pub fn analyze_raw(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        order: ChannelOrder,
    ) -> DetectionResult {
        pipeline::settle(pipeline::guarded(|| {
            let rgb = sampler::rgb_from_raw(data, width, height, order)?;
            self.measure(&DynamicImage::ImageRgb8(rgb))
        }))
    }

    /// Like [`SkinToneAnalyzer::analyze`] but returns the underlying error
    /// instead of the fallback result. Panics during decoding or analysis
    /// come back as [`SkinToneError::Panicked`].
    pub fn try_analyze(&self, path: impl AsRef<Path>) -> Result<DetectionResult, SkinToneError> {
        let path = path.as_ref();
        pipeline::guarded(|| {
            let image = pipeline::load_image(path)?;
            self.measure(&image)
        })
    }

    fn measure(&self, image: &DynamicImage) -> Result<DetectionResult, SkinToneError> {
        pipeline::measure(image, self.detector.as_deref(), self.config.margin_ratio)
    }
}

/// Analyze the image at `path` with default settings and no face detector.
pub fn analyze(path: impl AsRef<Path>) -> DetectionResult {
    SkinToneAnalyzer::new().analyze(path)
}
