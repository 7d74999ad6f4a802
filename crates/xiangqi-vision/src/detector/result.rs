use crate::board::{BoardMatrix, CellLabel, PieceColor};
use crate::cell::{CellMeasurements, PieceState};
use crate::grid::GridModel;
use crate::identify::MatchOutcome;
use serde::{Deserialize, Serialize};
use xiangqi_vision_core::BoundingRegion;

/// Diagnostics for one cell. Regions are in photo coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    pub row: usize,
    pub col: usize,
    pub region: BoundingRegion,
    pub measurements: CellMeasurements,
    /// `None` for empty cells.
    #[serde(default)]
    pub color: Option<PieceColor>,
    /// Crop used for matching; `None` when the whole cell was used.
    #[serde(default)]
    pub piece_region: Option<BoundingRegion>,
    #[serde(default)]
    pub best_match: Option<MatchOutcome>,
    pub label: CellLabel,
    /// Identification error that forced the cell to unresolved.
    #[serde(default)]
    pub error: Option<String>,
}

/// Output of a detection run.
#[derive(Clone, Debug)]
pub struct BoardDetectionResult {
    /// Located board in the photo.
    pub board_region: BoundingRegion,
    /// Grid geometry, relative to `board_region`.
    pub grid: GridModel,
    /// `grid.region` in photo coordinates.
    pub grid_region: BoundingRegion,
    /// Per-cell states in row-major order.
    pub states: Vec<PieceState>,
    /// Per-cell diagnostics in row-major order.
    pub cells: Vec<CellReport>,
    pub matrix: BoardMatrix,
    pub notation: String,
}

impl BoardDetectionResult {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellReport> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Number of occupied cells whose label could not be resolved.
    pub fn unresolved_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.label == CellLabel::Unresolved)
            .count()
    }
}
