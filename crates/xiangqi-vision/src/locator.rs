//! Coarse board localisation in the full photograph.
//!
//! Edges are thickened with a dilate/erode pass so the board outline becomes
//! one connected component; the outermost contour enclosing the largest area
//! is taken as the board.

use crate::detector::DetectError;
use image::RgbImage;
use imageproc::edges::canny;
use log::debug;
use serde::{Deserialize, Serialize};
use xiangqi_vision_core::{
    blur_gray, dilate_square, erode_square, external_contours, grayscale, BoundingRegion,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Edge and morphology settings for [`locate_board`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardLocatorParams {
    /// Gaussian pre-blur before edge detection (σ of a 5×5 kernel ≈ 1.1).
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// 3×3 dilations applied to the edge map.
    pub dilate_iterations: u8,
    /// 3×3 erosions applied after dilation.
    pub erode_iterations: u8,
}

impl Default for BoardLocatorParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 30.0,
            canny_high: 150.0,
            dilate_iterations: 3,
            erode_iterations: 1,
        }
    }
}

/// Return the bounding box of the largest external edge contour.
///
/// Ties on area keep the first contour found (raster order of its start).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, params), fields(width = image.width(), height = image.height()))
)]
pub fn locate_board(
    image: &RgbImage,
    params: &BoardLocatorParams,
) -> Result<BoundingRegion, DetectError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectError::NoContourFound);
    }
    let gray = blur_gray(&grayscale(image), params.blur_sigma);
    let edges = canny(&gray, params.canny_low, params.canny_high);
    let closed = erode_square(
        &dilate_square(&edges, params.dilate_iterations),
        params.erode_iterations,
    );

    let contours = external_contours(&closed);
    debug!("locator: {} external contours", contours.len());

    let mut best: Option<(f64, BoundingRegion)> = None;
    for c in &contours {
        if best.is_none_or(|(area, _)| c.area > area) {
            best = Some((c.area, c.bbox));
        }
    }
    let (area, region) = best.ok_or(DetectError::NoContourFound)?;

    debug!(
        "locator: board {}x{} at ({}, {}), contour area {:.0}",
        region.width, region.height, region.x, region.y, area
    );
    Ok(region)
}
