use crate::cell::CellParams;
use crate::grid::GridParams;
use crate::identify::MatchParams;
use crate::locator::BoardLocatorParams;
use serde::{Deserialize, Serialize};

/// Configuration for [`XiangqiDetector`](super::XiangqiDetector).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XiangqiDetectorParams {
    pub locator: BoardLocatorParams,
    pub grid: GridParams,
    pub cell: CellParams,
    pub matching: MatchParams,
    /// Append ` w - - 0 1` to the notation.
    pub notation_suffix: bool,
}
