//! HSV conversion and range masks.
//!
//! Uses the 8-bit OpenCV convention: hue in `0..=179` (degrees / 2),
//! saturation and value in `0..=255`. Range bounds are inclusive.

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Inclusive per-channel HSV bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        let px = [hsv.h, hsv.s, hsv.v];
        (0..3).all(|c| px[c] >= self.lower[c] && px[c] <= self.upper[c])
    }
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(px: Rgb<u8>) -> Hsv {
    let [r, g, b] = px.0.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h = if diff <= 0.0 {
        0.0
    } else {
        let deg = if v == r {
            60.0 * (g - b) / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        let deg = if deg < 0.0 { deg + 360.0 } else { deg };
        deg / 2.0
    };

    Hsv {
        h: (h.round() as u32 % 180) as u8,
        s: s.round().clamp(0.0, 255.0) as u8,
        v: v as u8,
    }
}

/// Binary mask (0/255) of pixels whose HSV value falls in any of `ranges`.
pub fn hsv_mask(rgb: &RgbImage, ranges: &[HsvRange]) -> GrayImage {
    let mut mask = GrayImage::new(rgb.width(), rgb.height());
    for (dst, src) in mask.pixels_mut().zip(rgb.pixels()) {
        let hsv = rgb_to_hsv(*src);
        if ranges.iter().any(|r| r.contains(hsv)) {
            *dst = Luma([255]);
        }
    }
    mask
}

pub fn count_nonzero(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

/// Fraction of non-zero pixels; `0.0` for an empty mask.
pub fn mask_fraction(mask: &GrayImage) -> f32 {
    let total = mask.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    count_nonzero(mask) as f32 / total as f32
}
