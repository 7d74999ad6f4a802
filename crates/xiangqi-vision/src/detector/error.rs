use crate::board::PieceColor;

/// Structural failures that abort detection for the whole image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("no contour found while locating the board")]
    NoContourFound,
    #[error("insufficient grid lines (horizontal={horizontal}, vertical={vertical})")]
    InsufficientLines { horizontal: usize, vertical: usize },
    #[error("{stage} produced an empty region ({width}x{height})")]
    InvalidRegion {
        stage: &'static str,
        width: u32,
        height: u32,
    },
}

/// Per-cell identification failure. The cell degrades to unresolved.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("no templates available for {color} pieces")]
    NoTemplatesForSide { color: PieceColor },
}
