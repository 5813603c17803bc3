use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::SkinToneError;
use crate::region::Region;

/// Byte order of the three color channels in a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red (common for camera frames and OpenCV buffers).
    Bgr,
}

/// Average color of a sampled region.
///
/// Channel means are rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    /// Mean red channel.
    pub r: f64,
    /// Mean green channel.
    pub g: f64,
    /// Mean blue channel.
    pub b: f64,
}

impl ColorSample {
    /// Integer triple: each rounded mean truncated toward zero.
    pub fn rgb(&self) -> [u8; 3] {
        [self.r as u8, self.g as u8, self.b as u8]
    }
}

/// Exact halves go to the even neighbour: 100.25 → 100.2, 100.35 → 100.4.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Average the RGB channels of `image` over `region`.
///
/// Whatever the decoded pixel layout (gray, RGBA, 16-bit), pixels are
/// converted to 8-bit R-G-B before the means are taken.
pub fn sample(image: &DynamicImage, region: Region) -> Result<ColorSample, SkinToneError> {
    let region = region.clamp_to(image.width(), image.height());
    if region.is_empty() {
        return Err(SkinToneError::EmptyRegion);
    }

    let rgb = image
        .crop_imm(region.x, region.y, region.width, region.height)
        .to_rgb8();
    mean_color(&rgb)
}

/// Per-channel arithmetic mean over every pixel of `rgb`.
pub fn mean_color(rgb: &RgbImage) -> Result<ColorSample, SkinToneError> {
    let count = rgb.width() as u64 * rgb.height() as u64;
    if count == 0 {
        return Err(SkinToneError::EmptyRegion);
    }

    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += channel as u64;
        }
    }

    let n = count as f64;
    Ok(ColorSample {
        r: round_one_decimal(sums[0] as f64 / n),
        g: round_one_decimal(sums[1] as f64 / n),
        b: round_one_decimal(sums[2] as f64 / n),
    })
}

/// Build an RGB image from a packed three-channel buffer, swapping channels
/// when the source is B-G-R.
pub fn rgb_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    order: ChannelOrder,
) -> Result<RgbImage, SkinToneError> {
    let expected = width as usize * height as usize * 3;
    if data.len() != expected {
        return Err(SkinToneError::BufferSize {
            expected,
            actual: data.len(),
        });
    }

    let mut pixels = data.to_vec();
    if order == ChannelOrder::Bgr {
        for px in pixels.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }

    RgbImage::from_raw(width, height, pixels).ok_or(SkinToneError::BufferSize {
        expected,
        actual: data.len(),
    })
}
