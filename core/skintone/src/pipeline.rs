use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{debug, info, warn};

use crate::error::SkinToneError;
use crate::face_detector::{locate, FaceDetector};
use crate::region::{center_region, Region};
use crate::result::DetectionResult;
use crate::sampler::sample;
use crate::tone::classify;

/// Region chosen for sampling, and the face it was grown from (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection {
    pub region: Region,
    pub face: Option<Region>,
}

/// Read and decode an image file.
pub(crate) fn load_image(path: &Path) -> Result<DynamicImage, SkinToneError> {
    if !path.is_file() {
        return Err(SkinToneError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| SkinToneError::Io(e.to_string()))?;
    decode_image(&bytes)
}

/// Decode input bytes into a `DynamicImage`, upright.
///
/// The EXIF orientation tag is applied, so a portrait phone photo stored
/// sideways reaches the face detector the way it is displayed.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, SkinToneError> {
    let decode_err = |e: image::ImageError| SkinToneError::DecodeError(e.to_string());

    let reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| SkinToneError::DecodeError(e.to_string()))?;
    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Locate the largest face and pick the sampling region around it, or the
/// center of the image when no face is found.
pub(crate) fn select_region(
    image: &DynamicImage,
    detector: Option<&dyn FaceDetector>,
    margin_ratio: f64,
) -> Selection {
    let (width, height) = (image.width(), image.height());
    let face = match detector {
        Some(detector) if width > 0 && height > 0 => locate(detector, image),
        _ => None,
    };

    let region = match &face {
        Some(face) => face.expand(width, height, margin_ratio),
        None => center_region(width, height),
    };
    let face = face.map(|face| face.to_region(width, height));
    debug!(?face, ?region, "sampling region selected");

    Selection { region, face }
}

/// Locate, select, sample and classify. Errors are returned, not mapped.
pub(crate) fn measure(
    image: &DynamicImage,
    detector: Option<&dyn FaceDetector>,
    margin_ratio: f64,
) -> Result<DetectionResult, SkinToneError> {
    let Selection { region, face } = select_region(image, detector, margin_ratio);
    if region.is_empty() {
        return Err(SkinToneError::EmptyRegion);
    }

    let color = sample(image, region)?;
    let tone = classify(color.r, color.g, color.b);
    info!(%tone, r = color.r, g = color.g, b = color.b, face = face.is_some(), "skin tone classified");

    Ok(DetectionResult::measured(tone, color, face.is_some()))
}

/// Run one analysis step with panics from the decoders, the detector or the
/// image code turned into [`SkinToneError::Panicked`].
pub(crate) fn guarded<T>(
    step: impl FnOnce() -> Result<T, SkinToneError>,
) -> Result<T, SkinToneError> {
    panic::catch_unwind(AssertUnwindSafe(step))
        .unwrap_or_else(|payload| Err(SkinToneError::Panicked(panic_message(payload.as_ref()))))
}

/// Collapse any analysis error into its fallback result.
pub(crate) fn settle(outcome: Result<DetectionResult, SkinToneError>) -> DetectionResult {
    match outcome {
        Ok(result) => result,
        Err(err) => {
            let result = DetectionResult::from_error(&err);
            warn!(error = %err, message = %result.message, "skin tone analysis fell back to default");
            result
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_detector::FaceBounds;
    use crate::result::messages;
    use crate::tone::SkinTone;
    use image::{ImageEncoder, RgbImage};

    struct FixedDetector(Vec<FaceBounds>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceBounds> {
            self.0.clone()
        }
    }

    struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceBounds> {
            panic!("model exploded");
        }
    }

    fn face(x: f64, y: f64, size: f64) -> FaceBounds {
        FaceBounds {
            x,
            y,
            width: size,
            height: size,
            confidence: 5.0,
        }
    }

    /// 100×100 image: background (20, 20, 20), center square (200, 100, 50),
    /// top-left 30×30 block (230, 210, 200).
    fn make_test_image() -> DynamicImage {
        let mut img = RgbImage::from_pixel(100, 100, image::Rgb([20, 20, 20]));
        for y in 25..75 {
            for x in 25..75 {
                img.put_pixel(x, y, image::Rgb([200, 100, 50]));
            }
        }
        for y in 0..30 {
            for x in 0..30 {
                img.put_pixel(x, y, image::Rgb([230, 210, 200]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([150, 150, 150]));
        let mut buffer = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    #[test]
    fn no_detector_uses_center_region() {
        let selection = select_region(&make_test_image(), None, 0.2);
        assert_eq!(selection.face, None);
        assert_eq!(selection.region, Region::new(25, 25, 50, 50));
    }

    #[test]
    fn detected_face_is_expanded() {
        let detector = FixedDetector(vec![face(40.0, 40.0, 20.0)]);
        let selection = select_region(&make_test_image(), Some(&detector), 0.2);
        assert_eq!(selection.face, Some(Region::new(40, 40, 20, 20)));
        assert_eq!(selection.region, Region::new(36, 36, 28, 28));
    }

    #[test]
    fn center_fallback_samples_center_color() {
        let result = measure(&make_test_image(), None, 0.2).unwrap();
        assert_eq!(result.rgb, [200, 100, 50]);
        assert!(!result.face_detected);
        assert_eq!(result.message, messages::NO_FACE);
    }

    #[test]
    fn face_region_drives_classification() {
        // face fully inside the light block; margin 0.2 of 20 → 4, still inside 30×30
        let detector = FixedDetector(vec![face(4.0, 4.0, 20.0)]);
        let result = measure(&make_test_image(), Some(&detector), 0.2).unwrap();
        assert_eq!(result.rgb, [230, 210, 200]);
        assert_eq!(result.tone, SkinTone::Fair);
        assert!(result.face_detected);
        assert_eq!(result.message, messages::FACE_DETECTED);
    }

    #[test]
    fn largest_face_is_used() {
        let detector = FixedDetector(vec![face(4.0, 4.0, 10.0), face(40.0, 40.0, 20.0)]);
        let result = measure(&make_test_image(), Some(&detector), 0.0).unwrap();
        assert_eq!(result.rgb, [200, 100, 50]);
    }

    #[test]
    fn largest_face_compares_reported_size() {
        // overhanging 100×100 box beats the 60×60 one even though it clamps
        // down to 50×50
        let detector = FixedDetector(vec![
            face(-50.0, -50.0, 100.0),
            face(40.0, 40.0, 60.0),
        ]);
        let selection = select_region(&make_test_image(), Some(&detector), 0.0);
        assert_eq!(selection.face, Some(Region::new(0, 0, 50, 50)));
        assert_eq!(selection.region, Region::new(0, 0, 50, 50));
    }

    #[test]
    fn face_outside_image_is_an_empty_region() {
        let detector = FixedDetector(vec![face(200.0, 200.0, 40.0)]);
        let selection = select_region(&make_test_image(), Some(&detector), 0.2);
        assert!(selection.face.is_some());
        assert!(selection.region.is_empty());

        let outcome = measure(&make_test_image(), Some(&detector), 0.2);
        assert!(matches!(outcome, Err(SkinToneError::EmptyRegion)));
        assert_eq!(settle(outcome).message, messages::EMPTY_REGION);
    }

    #[test]
    fn tiny_image_has_empty_region() {
        let image = DynamicImage::new_rgb8(1, 1);
        assert!(matches!(
            measure(&image, None, 0.2),
            Err(SkinToneError::EmptyRegion)
        ));
        assert_eq!(
            settle(measure(&image, None, 0.2)).message,
            messages::EMPTY_REGION
        );
    }

    #[test]
    fn detector_panic_becomes_error() {
        let image = make_test_image();
        let result = guarded(|| measure(&image, Some(&PanickingDetector), 0.2));
        match result {
            Err(SkinToneError::Panicked(msg)) => assert_eq!(msg, "model exploded"),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn panic_while_decoding_becomes_error() {
        let result: Result<DynamicImage, _> = guarded(|| panic!("decoder overflow"));
        assert!(matches!(result, Err(SkinToneError::Panicked(msg)) if msg == "decoder overflow"));
        assert_eq!(
            settle(guarded(|| panic!("decoder overflow"))).message,
            messages::ANALYSIS_FAILED
        );
    }

    /// JPEG of a 40×20 image whose left half is red and right half blue,
    /// tagged with EXIF orientation 6 (display rotated 90° clockwise).
    fn make_rotated_jpeg() -> Vec<u8> {
        let img = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                image::Rgb([220, 30, 30])
            } else {
                image::Rgb([30, 30, 220])
            }
        });
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 95)
            .write_image(img.as_raw(), 40, 20, image::ExtendedColorType::Rgb8)
            .unwrap();

        // APP1 "Exif": big-endian TIFF header, one IFD entry (0x0112 SHORT = 6)
        let mut exif = b"Exif\0\0MM\0\x2a\0\0\0\x08".to_vec();
        exif.extend_from_slice(&[0x00, 0x01]);
        exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        exif.extend_from_slice(&[0x00, 0x06, 0x00, 0x00]);
        exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
        segment.extend_from_slice(&exif);

        // right after SOI
        jpeg.splice(2..2, segment);
        jpeg
    }

    #[test]
    fn decode_applies_exif_orientation() {
        let image = decode_image(&make_rotated_jpeg()).unwrap();
        assert_eq!((image.width(), image.height()), (20, 40));

        // the stored left (red) half is now on top
        let rgb = image.to_rgb8();
        let top = rgb.get_pixel(10, 5);
        let bottom = rgb.get_pixel(10, 34);
        assert!(top[0] > 150 && top[2] < 100, "top {top:?}");
        assert!(bottom[2] > 150 && bottom[0] < 100, "bottom {bottom:?}");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(SkinToneError::DecodeError(_))
        ));
    }

    #[test]
    fn decode_accepts_png() {
        let image = decode_image(&make_test_png(8, 6)).unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
    }

    #[test]
    fn load_reports_missing_file() {
        let result = load_image(Path::new("/nonexistent/dir/photo.png"));
        assert!(matches!(result, Err(SkinToneError::NotFound(_))));
    }
}
