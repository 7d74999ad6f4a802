//! Thin wrappers over `image`/`imageproc` with the conventions the detector
//! relies on: 8-bit grayscale, 0/255 binary masks, 3×3 square structuring
//! elements expressed as iteration counts.

use crate::BoundingRegion;
use image::{imageops, GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;

// BT.601 weights in 14-bit fixed point; they sum to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// BT.601 luma (`0.299 R + 0.587 G + 0.114 B`), rounded to nearest.
///
/// Contrast and edge thresholds downstream are calibrated on this weighting,
/// not on the Rec. 709 one `imageops::grayscale` uses.
pub fn grayscale(rgb: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(rgb.width(), rgb.height());
    for (dst, src) in out.pixels_mut().zip(rgb.pixels()) {
        let [r, g, b] = src.0;
        let y = (r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B + (1 << 13)) >> 14;
        dst.0[0] = y as u8;
    }
    out
}

/// Gaussian blur; a non-positive sigma returns a copy.
pub fn blur_gray(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || !sigma.is_finite() {
        return gray.clone();
    }
    gaussian_blur_f32(gray, sigma)
}

/// `iterations` dilations with a 3×3 square, i.e. an L∞ ball of that radius.
pub fn dilate_square(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return mask.clone();
    }
    morphology::dilate(mask, Norm::LInf, iterations)
}

/// `iterations` erosions with a 3×3 square.
pub fn erode_square(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return mask.clone();
    }
    morphology::erode(mask, Norm::LInf, iterations)
}

/// Morphological closing: `iterations` dilations followed by as many erosions.
pub fn close_square(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return mask.clone();
    }
    morphology::close(mask, Norm::LInf, iterations)
}

/// Population standard deviation of pixel intensities.
///
/// Returns `0.0` for an empty image.
pub fn intensity_stddev(gray: &GrayImage) -> f64 {
    let n = gray.as_raw().len();
    if n == 0 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &v in gray.as_raw() {
        let v = v as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n as f64;
    let var = (sum_sq / n as f64 - mean * mean).max(0.0);
    var.sqrt()
}

/// Copy the pixels of `region` out of `rgb`. The region must fit the image.
pub fn crop_rgb(rgb: &RgbImage, region: &BoundingRegion) -> RgbImage {
    debug_assert!(region.fits_within(rgb.width(), rgb.height()));
    imageops::crop_imm(rgb, region.x, region.y, region.width, region.height).to_image()
}

/// Copy the pixels of `region` out of `gray`. The region must fit the image.
pub fn crop_gray(gray: &GrayImage, region: &BoundingRegion) -> GrayImage {
    debug_assert!(region.fits_within(gray.width(), gray.height()));
    imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image()
}
