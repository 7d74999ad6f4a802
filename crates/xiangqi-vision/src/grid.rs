//! Grid-line recovery and cell slicing inside a located board region.
//!
//! Line segments from a probabilistic Hough pass are split into horizontal
//! and vertical families by angle. The endpoint coordinates of each family
//! are clustered with 1-D k-means (10 rows, 9 columns); the outermost
//! centers bound the grid, which is padded and then cut into a fixed
//! 10×9 partition.

use crate::board::{BOARD_COLS, BOARD_ROWS};
use crate::detector::DetectError;
use image::RgbImage;
use imageproc::edges::canny;
use log::debug;
use serde::{Deserialize, Serialize};
use xiangqi_vision_core::{
    blur_gray, crop_rgb, detect_segments, grayscale, kmeans_1d, BoundingRegion, HoughParams,
    RawSegment,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub hough: HoughParams,
    /// Segments with `|θ|` below this (degrees) are horizontal.
    pub horizontal_max_deg: f32,
    /// Segments with `|θ|` above this (degrees) are vertical.
    pub vertical_min_deg: f32,
    pub kmeans_max_iters: usize,
    /// Left/right padding as a fraction of the raw grid width.
    pub horizontal_expand_ratio: f64,
    /// Top/bottom padding as a fraction of the raw grid height.
    pub vertical_expand_ratio: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            hough: HoughParams::default(),
            horizontal_max_deg: 10.0,
            vertical_min_deg: 80.0,
            kmeans_max_iters: 100,
            horizontal_expand_ratio: 0.055,
            vertical_expand_ratio: 0.06,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A Hough segment that passed the angle filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub orientation: Orientation,
}

impl LineSegment {
    /// Classify a raw segment by its direction, or `None` for near-diagonals.
    ///
    /// The angle is folded into `(-90°, 90°]` first so that the endpoint
    /// order does not matter.
    pub fn classify(raw: &RawSegment, horizontal_max_deg: f32, vertical_min_deg: f32) -> Option<Self> {
        let mut angle = raw.angle_deg();
        if angle <= -90.0 {
            angle += 180.0;
        } else if angle > 90.0 {
            angle -= 180.0;
        }
        let orientation = if angle.abs() < horizontal_max_deg {
            Orientation::Horizontal
        } else if angle.abs() > vertical_min_deg {
            Orientation::Vertical
        } else {
            return None;
        };
        Some(Self {
            x1: raw.x1,
            y1: raw.y1,
            x2: raw.x2,
            y2: raw.y2,
            orientation,
        })
    }
}

/// Recovered grid geometry.
///
/// `region` and `raw_region` are in the coordinates of the image passed to
/// [`segment_board`]; the bounds are relative to `region`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridModel {
    /// Area spanned by the outermost clustered lines.
    pub raw_region: BoundingRegion,
    /// `raw_region` after padding and clamping; this is what gets sliced.
    pub region: BoundingRegion,
    /// Cluster centers of horizontal lines, non-decreasing (10 values).
    pub row_lines: Vec<f32>,
    /// Cluster centers of vertical lines, non-decreasing (9 values).
    pub col_lines: Vec<f32>,
    /// `BOARD_ROWS + 1` strictly increasing y bounds, `0` to `region.height`.
    pub row_bounds: Vec<u32>,
    /// `BOARD_COLS + 1` strictly increasing x bounds, `0` to `region.width`.
    pub col_bounds: Vec<u32>,
}

impl GridModel {
    /// Cell rectangle relative to `region`.
    pub fn cell_region(&self, row: usize, col: usize) -> Option<BoundingRegion> {
        let (y0, y1) = (*self.row_bounds.get(row)?, *self.row_bounds.get(row + 1)?);
        let (x0, x1) = (*self.col_bounds.get(col)?, *self.col_bounds.get(col + 1)?);
        BoundingRegion::new(x0, y0, x1.checked_sub(x0)?, y1.checked_sub(y0)?)
    }

    /// Cell rectangle in the coordinates of the segmented image.
    pub fn cell_region_in_parent(&self, row: usize, col: usize) -> Option<BoundingRegion> {
        self.cell_region(row, col)
            .map(|local| self.region.offset_child(&local))
    }
}

/// One slice of the board.
#[derive(Clone, Debug)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    /// Position inside `GridModel::region`.
    pub region: BoundingRegion,
    pub image: RgbImage,
}

/// Grid geometry plus the 90 cells in row-major order.
#[derive(Clone, Debug)]
pub struct SegmentedBoard {
    pub grid: GridModel,
    pub cells: Vec<Cell>,
}

/// Split `len` pixels into `parts` equal slices; the last slice takes the
/// remainder. Returns `None` when a slice would be empty.
pub fn partition_bounds(len: u32, parts: usize) -> Option<Vec<u32>> {
    let parts_u32 = u32::try_from(parts).ok()?;
    if parts_u32 == 0 {
        return None;
    }
    let step = len / parts_u32;
    if step == 0 {
        return None;
    }
    let mut bounds: Vec<u32> = (0..parts_u32).map(|i| i * step).collect();
    bounds.push(len);
    Some(bounds)
}

/// Detect the grid inside `board` and cut it into cells.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(board, params), fields(width = board.width(), height = board.height()))
)]
pub fn segment_board(board: &RgbImage, params: &GridParams) -> Result<SegmentedBoard, DetectError> {
    let (width, height) = board.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidRegion {
            stage: "grid input",
            width,
            height,
        });
    }
    let gray = blur_gray(&grayscale(board), params.blur_sigma);
    let edges = canny(&gray, params.canny_low, params.canny_high);
    let raw = detect_segments(&edges, &params.hough);

    let mut horizontal_y = Vec::new();
    let mut vertical_x = Vec::new();
    let (mut horizontal, mut vertical) = (0usize, 0usize);
    for seg in raw
        .iter()
        .filter_map(|s| LineSegment::classify(s, params.horizontal_max_deg, params.vertical_min_deg))
    {
        match seg.orientation {
            Orientation::Horizontal => {
                horizontal += 1;
                horizontal_y.extend([seg.y1 as f32, seg.y2 as f32]);
            }
            Orientation::Vertical => {
                vertical += 1;
                vertical_x.extend([seg.x1 as f32, seg.x2 as f32]);
            }
        }
    }
    debug!(
        "grid: {} raw segments, {horizontal} horizontal, {vertical} vertical",
        raw.len()
    );

    let insufficient = DetectError::InsufficientLines {
        horizontal,
        vertical,
    };
    if horizontal < BOARD_ROWS || vertical < BOARD_COLS {
        return Err(insufficient);
    }

    let row_lines = kmeans_1d(&horizontal_y, BOARD_ROWS, params.kmeans_max_iters)
        .ok_or_else(|| insufficient.clone())?;
    let col_lines = kmeans_1d(&vertical_x, BOARD_COLS, params.kmeans_max_iters)
        .ok_or_else(|| insufficient.clone())?;

    // Outer centers, truncated to whole pixels.
    let (min_y, max_y) = (row_lines[0] as i64, row_lines[BOARD_ROWS - 1] as i64);
    let (min_x, max_x) = (col_lines[0] as i64, col_lines[BOARD_COLS - 1] as i64);
    let raw_region = BoundingRegion::from_bounds(min_x, min_y, max_x, max_y, (width, height))
        .ok_or(DetectError::InvalidRegion {
            stage: "grid crop",
            width: (max_x - min_x).max(0) as u32,
            height: (max_y - min_y).max(0) as u32,
        })?;

    let region = raw_region
        .expand(
            params.horizontal_expand_ratio,
            params.vertical_expand_ratio,
            (width, height),
        )
        .ok_or(DetectError::InvalidRegion {
            stage: "grid expansion",
            width: raw_region.width,
            height: raw_region.height,
        })?;

    let invalid_partition = DetectError::InvalidRegion {
        stage: "cell partition",
        width: region.width,
        height: region.height,
    };
    let row_bounds = partition_bounds(region.height, BOARD_ROWS).ok_or(invalid_partition.clone())?;
    let col_bounds = partition_bounds(region.width, BOARD_COLS).ok_or(invalid_partition)?;

    debug!(
        "grid: raw {}x{} at ({}, {}), expanded {}x{} at ({}, {})",
        raw_region.width,
        raw_region.height,
        raw_region.x,
        raw_region.y,
        region.width,
        region.height,
        region.x,
        region.y
    );

    let grid = GridModel {
        raw_region,
        region,
        row_lines,
        col_lines,
        row_bounds,
        col_bounds,
    };

    let expanded = crop_rgb(board, &region);
    let mut cells = Vec::with_capacity(BOARD_ROWS * BOARD_COLS);
    for row in 0..BOARD_ROWS {
        for col in 0..BOARD_COLS {
            let local = grid.cell_region(row, col).ok_or(DetectError::InvalidRegion {
                stage: "cell partition",
                width: region.width,
                height: region.height,
            })?;
            cells.push(Cell {
                row,
                col,
                region: local,
                image: crop_rgb(&expanded, &local),
            });
        }
    }

    Ok(SegmentedBoard { grid, cells })
}
