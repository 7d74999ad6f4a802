use super::{BoardDetectionResult, CellReport, DetectError, XiangqiDetectorParams};
use crate::board::{BoardMatrix, CellLabel};
use crate::cell::{analyze_cell, PieceState};
use crate::grid::{segment_board, Cell};
use crate::identify::identify_piece;
use crate::locator::locate_board;
use crate::notation::encode_with_suffix;
use crate::templates::TemplateLibrary;
use image::RgbImage;
use log::{debug, warn};
use xiangqi_vision_core::{crop_rgb, BoundingRegion};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Board photo to notation, using a fixed template library.
pub struct XiangqiDetector {
    params: XiangqiDetectorParams,
    templates: TemplateLibrary,
}

struct CellOutcome {
    state: PieceState,
    report: CellReport,
}

impl XiangqiDetector {
    pub fn new(params: XiangqiDetectorParams, templates: TemplateLibrary) -> Self {
        if templates.is_empty() {
            warn!("detector: template library is empty, occupied cells will be unresolved");
        }
        Self { params, templates }
    }

    #[inline]
    pub fn params(&self) -> &XiangqiDetectorParams {
        &self.params
    }

    #[inline]
    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Run the full pipeline on a decoded photo.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn detect(&self, image: &RgbImage) -> Result<BoardDetectionResult, DetectError> {
        let board_region = locate_board(image, &self.params.locator)?;
        let board = crop_rgb(image, &board_region);
        let segmented = segment_board(&board, &self.params.grid)?;
        let grid = segmented.grid;
        let grid_region = board_region.offset_child(&grid.region);

        #[cfg(feature = "rayon")]
        let outcomes: Vec<CellOutcome> = segmented
            .cells
            .par_iter()
            .map(|cell| self.process_cell(cell, grid_region))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let outcomes: Vec<CellOutcome> = segmented
            .cells
            .iter()
            .map(|cell| self.process_cell(cell, grid_region))
            .collect();

        let mut matrix = BoardMatrix::empty();
        let mut states = Vec::with_capacity(outcomes.len());
        let mut cells = Vec::with_capacity(outcomes.len());
        for CellOutcome { state, report } in outcomes {
            matrix.set(report.row, report.col, report.label);
            states.push(state);
            cells.push(report);
        }

        let notation = encode_with_suffix(&matrix, self.params.notation_suffix);
        debug!(
            "detector: {} occupied cells, notation {notation}",
            matrix.occupied().count()
        );

        Ok(BoardDetectionResult {
            board_region,
            grid,
            grid_region,
            states,
            cells,
            matrix,
            notation,
        })
    }

    /// Convenience wrapper returning only the notation string.
    pub fn detect_notation(&self, image: &RgbImage) -> Result<String, DetectError> {
        self.detect(image).map(|res| res.notation)
    }

    fn process_cell(&self, cell: &Cell, grid_region: BoundingRegion) -> CellOutcome {
        let analysis = analyze_cell(&cell.image, &self.params.cell);
        let region = grid_region.offset_child(&cell.region);
        let mut report = CellReport {
            row: cell.row,
            col: cell.col,
            region,
            measurements: analysis.measurements,
            color: None,
            piece_region: None,
            best_match: None,
            label: CellLabel::Empty,
            error: None,
        };

        let state = match analysis.state {
            PieceState::Empty => PieceState::Empty,
            PieceState::Occupied { color, piece, .. } => {
                let matched =
                    identify_piece(&piece.image, color, &self.templates, &self.params.matching);
                let identity = match matched {
                    Ok(outcome) => {
                        report.best_match = Some(outcome);
                        outcome.identity
                    }
                    Err(err) => {
                        warn!("cell ({}, {}): {err}", cell.row, cell.col);
                        report.error = Some(err.to_string());
                        None
                    }
                };
                report.color = Some(color);
                report.piece_region = piece.bounds.map(|b| region.offset_child(&b));
                report.label = identity.map_or(CellLabel::Unresolved, CellLabel::Piece);
                PieceState::Occupied {
                    color,
                    piece,
                    identity,
                }
            }
        };

        CellOutcome { state, report }
    }
}
