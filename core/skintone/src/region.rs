use serde::{Deserialize, Serialize};

/// Default margin added around a detected face, as a fraction of the face's
/// own width and height.
pub const DEFAULT_MARGIN_RATIO: f64 = 0.2;

/// Rectangular region of interest within a source image.
///
/// Origin is the top-left corner. Regions produced by [`expand`] and
/// [`center_region`] always lie inside the image they were computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// X coordinate of the top-left corner (pixels).
    pub x: u32,
    /// Y coordinate of the top-left corner (pixels).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a region from its top-left corner and size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered by the region.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Clamp the region so it lies within a `image_width` × `image_height` image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Self {
        let x1 = self.x.min(image_width);
        let y1 = self.y.min(image_height);
        let x2 = self.x.saturating_add(self.width).min(image_width);
        let y2 = self.y.saturating_add(self.height).min(image_height);
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// Grow a face rectangle by `margin_ratio` of its own size on every side,
/// clamped to the image bounds.
///
/// The margin is truncated to whole pixels before it is applied, so a
/// 20 px face with a 0.2 ratio gains exactly 4 px per side.
pub fn expand(face: Region, image_width: u32, image_height: u32, margin_ratio: f64) -> Region {
    expand_rect(
        i64::from(face.x),
        i64::from(face.y),
        i64::from(face.width),
        i64::from(face.height),
        image_width,
        image_height,
        margin_ratio,
    )
}

/// [`expand`] over a rectangle that may start outside the image or overhang
/// it. Margins come from the rectangle's own size before any clamping.
pub fn expand_rect(
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    image_width: u32,
    image_height: u32,
    margin_ratio: f64,
) -> Region {
    let (width, height) = (width.max(0), height.max(0));
    let margin_w = (width as f64 * margin_ratio) as i64;
    let margin_h = (height as f64 * margin_ratio) as i64;
    let (max_x, max_y) = (i64::from(image_width), i64::from(image_height));

    let x1 = x.saturating_sub(margin_w).clamp(0, max_x);
    let y1 = y.saturating_sub(margin_h).clamp(0, max_y);
    let x2 = x
        .saturating_add(width)
        .saturating_add(margin_w)
        .clamp(0, max_x);
    let y2 = y
        .saturating_add(height)
        .saturating_add(margin_h)
        .clamp(0, max_y);

    // every bound lies in 0..=image size, so the casts are lossless
    Region::new(
        x1 as u32,
        y1 as u32,
        x2.saturating_sub(x1).max(0) as u32,
        y2.saturating_sub(y1).max(0) as u32,
    )
}

/// Middle half of the image in both axes, used when no face is found.
///
/// Spans `[W/4, 3W/4)` horizontally and `[H/4, 3H/4)` vertically with integer
/// division, so very small images can yield an empty region.
pub fn center_region(image_width: u32, image_height: u32) -> Region {
    let x1 = image_width / 4;
    let y1 = image_height / 4;
    let x2 = (3 * image_width as u64 / 4) as u32;
    let y2 = (3 * image_height as u64 / 4) as u32;
    Region::new(x1, y1, x2 - x1, y2 - y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_without_clamping() {
        let region = expand(Region::new(40, 40, 20, 20), 100, 100, 0.2);
        assert_eq!(region, Region::new(36, 36, 28, 28));
    }

    #[test]
    fn expand_clamps_top_left() {
        // margin 10 would push the corner to (-5, -5)
        let region = expand(Region::new(5, 5, 50, 50), 200, 200, 0.2);
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
        assert_eq!(region.width, 65); // 5 + 50 + 10
        assert_eq!(region.height, 65);
    }

    #[test]
    fn expand_clamps_bottom_right() {
        let region = expand(Region::new(80, 70, 20, 30), 100, 100, 0.2);
        // margins 4 and 6
        assert_eq!(region, Region::new(76, 64, 24, 36));
    }

    #[test]
    fn expand_uses_face_size_not_image_size() {
        let small = expand(Region::new(100, 100, 10, 10), 1000, 1000, 0.5);
        assert_eq!(small, Region::new(95, 95, 20, 20));
    }

    #[test]
    fn expand_truncates_fractional_margin() {
        // 0.2 * 23 = 4.6 → 4
        let region = expand(Region::new(50, 50, 23, 23), 200, 200, 0.2);
        assert_eq!(region, Region::new(46, 46, 31, 31));
    }

    #[test]
    fn expand_face_outside_image_is_empty() {
        let region = expand(Region::new(150, 150, 20, 20), 100, 100, 0.2);
        assert!(region.is_empty());
    }

    #[test]
    fn expand_rect_uses_unclamped_size() {
        // 100 px face starting at -50: margin 20 on each side, then clamped
        let region = expand_rect(-50, -50, 100, 100, 200, 200, 0.2);
        assert_eq!(region, Region::new(0, 0, 70, 70));
    }

    #[test]
    fn expand_rect_entirely_outside_is_empty() {
        assert!(expand_rect(200, 200, 40, 40, 100, 100, 0.2).is_empty());
        assert!(expand_rect(-90, 10, 40, 40, 100, 100, 0.2).is_empty());
    }

    #[test]
    fn center_region_square() {
        assert_eq!(center_region(100, 100), Region::new(25, 25, 50, 50));
    }

    #[test]
    fn center_region_odd_dimensions() {
        // 7/4 = 1, 21/4 = 5
        assert_eq!(center_region(7, 7), Region::new(1, 1, 4, 4));
    }

    #[test]
    fn center_region_tiny_image_is_empty() {
        // 1/4 = 0, 3/4 = 0
        assert!(center_region(1, 1).is_empty());
    }

    #[test]
    fn clamp_to_trims_overhang() {
        let region = Region::new(90, 95, 20, 20).clamp_to(100, 100);
        assert_eq!(region, Region::new(90, 95, 10, 5));
    }
}
