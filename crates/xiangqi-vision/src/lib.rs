//! Xiangqi board recognition: photo in, FEN-style board field out.
//!
//! Stages, each usable on its own:
//! - [`locate_board`] finds the board outline in the photo,
//! - [`segment_board`] recovers the 10×9 grid and slices cells,
//! - [`analyze_cell`] decides occupancy and colour and isolates the glyph,
//! - [`identify_piece`] matches the glyph against a [`TemplateLibrary`],
//! - [`notation::encode`] serialises the resulting [`BoardMatrix`].
//!
//! [`XiangqiDetector`] chains them.
//!
//! ```no_run
//! use xiangqi_vision::{TemplateLibrary, XiangqiDetector, XiangqiDetectorParams};
//!
//! # fn run(photo: image::RgbImage, templates: Vec<(String, image::GrayImage)>) -> Result<(), Box<dyn std::error::Error>> {
//! let library = TemplateLibrary::from_named(templates)?.with_canonical_size(60, 60);
//! let detector = XiangqiDetector::new(XiangqiDetectorParams::default(), library);
//! let result = detector.detect(&photo)?;
//! println!("{}", result.notation);
//! # Ok(())
//! # }
//! ```

mod board;
mod cell;
mod detector;
mod grid;
mod identify;
mod io;
mod locator;
pub mod notation;
mod templates;

pub use board::{
    BoardMatrix, CellLabel, ParseLabelError, PieceColor, PieceKind, PieceLabel, Side, BOARD_COLS,
    BOARD_ROWS,
};
pub use cell::{
    analyze_cell, classify_color, isolate_piece, measure_contrast, CellAnalysis, CellMeasurements,
    CellParams, IsolatedPiece, PieceState,
};
pub use detector::{
    BoardDetectionResult, CellReport, DetectError, IdentifyError, XiangqiDetector,
    XiangqiDetectorParams,
};
pub use grid::{
    partition_bounds, segment_board, Cell, GridModel, GridParams, LineSegment, Orientation,
    SegmentedBoard,
};
pub use identify::{identify_piece, normalized_correlation, MatchOutcome, MatchParams};
pub use io::{DetectConfig, DetectReport, IoError};
pub use locator::{locate_board, BoardLocatorParams};
pub use notation::NotationError;
pub use templates::{TemplateLibrary, CANONICAL_TEMPLATE_SIZE};

pub use xiangqi_vision_core::{BoundingRegion, HoughParams, HsvRange};
