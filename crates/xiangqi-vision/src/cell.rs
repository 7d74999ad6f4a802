//! Per-cell occupancy, colour classification and piece isolation.

use crate::board::{PieceColor, PieceLabel};
use image::{GrayImage, RgbImage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use xiangqi_vision_core::{
    close_square, crop_gray, external_contours, grayscale, hsv_mask, intensity_stddev,
    mask_fraction, BoundingRegion, HsvRange,
};

/// Red occupies two hue bands around 0°/360°.
const RED_CLASSIFY: [HsvRange; 2] = [
    HsvRange::new([0, 120, 120], [10, 255, 255]),
    HsvRange::new([160, 120, 120], [179, 255, 255]),
];
const BLACK_CLASSIFY: [HsvRange; 1] = [HsvRange::new([0, 0, 0], [180, 255, 80])];
const RED_EXTRACT: [HsvRange; 2] = [
    HsvRange::new([0, 100, 100], [10, 255, 255]),
    HsvRange::new([160, 100, 100], [179, 255, 255]),
];
const BLACK_EXTRACT: [HsvRange; 1] = [HsvRange::new([0, 0, 0], [180, 255, 100])];

/// Thresholds for [`analyze_cell`].
///
/// Classification and extraction keep separate colour ranges: the ratio test
/// uses stricter bounds than the mask that is handed to template matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellParams {
    /// A cell is occupied when its intensity standard deviation is strictly
    /// greater than this.
    pub contrast_threshold: f64,
    /// Minimum mask fraction (exclusive) for a colour to be assigned.
    pub color_ratio_threshold: f32,
    pub classify_red: Vec<HsvRange>,
    pub classify_black: Vec<HsvRange>,
    pub extract_red: Vec<HsvRange>,
    pub extract_black: Vec<HsvRange>,
    /// Closing iterations (3×3) applied before contour search.
    pub closing_iterations: u8,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Minimum bounding-box area of a piece contour, as a fraction of the cell.
    pub min_area_fraction: f64,
}

impl Default for CellParams {
    fn default() -> Self {
        Self {
            contrast_threshold: 30.0,
            color_ratio_threshold: 0.05,
            classify_red: RED_CLASSIFY.to_vec(),
            classify_black: BLACK_CLASSIFY.to_vec(),
            extract_red: RED_EXTRACT.to_vec(),
            extract_black: BLACK_EXTRACT.to_vec(),
            closing_iterations: 2,
            min_aspect: 0.9,
            max_aspect: 1.1,
            min_area_fraction: 0.5,
        }
    }
}

/// Pixels handed to the identifier for one occupied cell.
#[derive(Clone, Debug)]
pub struct IsolatedPiece {
    /// Binary colour mask (0/255), or the grayscale cell when the colour is
    /// unresolved.
    pub image: GrayImage,
    /// Crop rectangle inside the cell; `None` when no contour qualified and
    /// the whole cell was kept.
    pub bounds: Option<BoundingRegion>,
}

#[derive(Clone, Debug)]
pub enum PieceState {
    Empty,
    Occupied {
        color: PieceColor,
        piece: IsolatedPiece,
        /// Filled in by the identifier; `None` until then or when no
        /// template matched well enough.
        identity: Option<PieceLabel>,
    },
}

impl PieceState {
    pub fn is_occupied(&self) -> bool {
        matches!(self, PieceState::Occupied { .. })
    }
}

/// Measurements taken while analysing a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMeasurements {
    pub contrast: f64,
    /// Colour fractions are only measured for occupied cells.
    pub red_ratio: Option<f32>,
    pub black_ratio: Option<f32>,
}

#[derive(Clone, Debug)]
pub struct CellAnalysis {
    pub measurements: CellMeasurements,
    pub state: PieceState,
}

/// Standard deviation of the cell's grayscale intensities.
pub fn measure_contrast(cell: &RgbImage) -> f64 {
    intensity_stddev(&grayscale(cell))
}

/// Decide the side from the fraction of red and dark pixels.
///
/// Red wins whenever it passes the ratio test. Returns the colour with the
/// red and black fractions.
pub fn classify_color(cell: &RgbImage, params: &CellParams) -> (PieceColor, f32, f32) {
    let red = mask_fraction(&hsv_mask(cell, &params.classify_red));
    let black = mask_fraction(&hsv_mask(cell, &params.classify_black));
    let color = if red > params.color_ratio_threshold {
        PieceColor::Red
    } else if black > params.color_ratio_threshold {
        PieceColor::Black
    } else {
        PieceColor::Unresolved
    };
    (color, red, black)
}

/// Cut the piece out of an occupied cell.
///
/// The colour mask is closed to find candidate contours; the returned pixels
/// come from the unclosed mask. Contours must have a nearly square bounding
/// box covering at least `min_area_fraction` of the cell; the largest such
/// box wins. When none qualifies the full mask is returned.
pub fn isolate_piece(cell: &RgbImage, color: PieceColor, params: &CellParams) -> IsolatedPiece {
    let ranges = match color {
        PieceColor::Red => &params.extract_red,
        PieceColor::Black => &params.extract_black,
        PieceColor::Unresolved => {
            return IsolatedPiece {
                image: grayscale(cell),
                bounds: None,
            }
        }
    };

    let mask = hsv_mask(cell, ranges);
    let closed = close_square(&mask, params.closing_iterations);
    let cell_area = (cell.width() as u64 * cell.height() as u64) as f64;

    let mut best: Option<BoundingRegion> = None;
    for contour in external_contours(&closed) {
        let bbox = contour.bbox;
        let aspect = bbox.aspect_ratio();
        if aspect < params.min_aspect || aspect > params.max_aspect {
            continue;
        }
        if (bbox.area() as f64) < params.min_area_fraction * cell_area {
            continue;
        }
        if best.is_none_or(|b| bbox.area() > b.area()) {
            best = Some(bbox);
        }
    }

    match best {
        Some(bounds) => {
            debug!(
                "isolate: {color} piece {}x{} at ({}, {})",
                bounds.width, bounds.height, bounds.x, bounds.y
            );
            IsolatedPiece {
                image: crop_gray(&mask, &bounds),
                bounds: Some(bounds),
            }
        }
        None => {
            warn!("isolate: no piece-shaped contour for {color} cell, keeping the full mask");
            IsolatedPiece {
                image: mask,
                bounds: None,
            }
        }
    }
}

/// Occupancy, colour and isolation for one cell.
pub fn analyze_cell(cell: &RgbImage, params: &CellParams) -> CellAnalysis {
    let contrast = measure_contrast(cell);
    if contrast <= params.contrast_threshold {
        return CellAnalysis {
            measurements: CellMeasurements {
                contrast,
                ..CellMeasurements::default()
            },
            state: PieceState::Empty,
        };
    }

    let (color, red, black) = classify_color(cell, params);
    if color == PieceColor::Unresolved {
        warn!("cell: occupied (contrast {contrast:.1}) but colour unresolved (red {red:.3}, black {black:.3})");
    }
    let piece = isolate_piece(cell, color, params);

    CellAnalysis {
        measurements: CellMeasurements {
            contrast,
            red_ratio: Some(red),
            black_ratio: Some(black),
        },
        state: PieceState::Occupied {
            color,
            piece,
            identity: None,
        },
    }
}
