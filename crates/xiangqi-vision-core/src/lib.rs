//! Raster and geometry building blocks for Xiangqi board recognition.
//!
//! This crate knows nothing about pieces or notation. It provides the
//! image-processing primitives the detector chains together: regions,
//! grayscale/blur helpers, HSV masks, external contours, probabilistic
//! Hough segments and 1-D k-means.

mod cluster1d;
mod color;
mod contour;
mod hough;
mod image;
mod logger;
mod region;

pub use cluster1d::kmeans_1d;
pub use color::{count_nonzero, hsv_mask, mask_fraction, rgb_to_hsv, Hsv, HsvRange};
pub use contour::{bounding_rect, external_contours, polygon_area, ExternalContour};
pub use hough::{detect_segments, HoughParams, RawSegment};
pub use image::{blur_gray, close_square, crop_gray, crop_rgb, dilate_square, erode_square, grayscale, intensity_stddev};
pub use region::BoundingRegion;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
