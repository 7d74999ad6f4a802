//! Photo-to-notation pipeline.
//!
//! Locates the board, recovers the 10×9 grid, analyses every cell and
//! matches occupied cells against a template library. Structural failures
//! abort with [`DetectError`]; per-cell problems only degrade that cell.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::{DetectError, IdentifyError};
pub use params::XiangqiDetectorParams;
pub use pipeline::XiangqiDetector;
pub use result::{BoardDetectionResult, CellReport};
