//! JSON configuration and report helpers.

use crate::board::BoardMatrix;
use crate::cell::CellParams;
use crate::detector::{BoardDetectionResult, CellReport, DetectError, XiangqiDetectorParams};
use crate::grid::{GridModel, GridParams};
use crate::identify::MatchParams;
use crate::locator::BoardLocatorParams;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use xiangqi_vision_core::BoundingRegion;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Detection options as read from JSON.
///
/// The scalar options override single fields of the defaults; the stage
/// objects replace a whole stage configuration and are applied first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectConfig {
    #[serde(default, alias = "horizontalExpandRatio")]
    pub horizontal_expand_ratio: Option<f64>,
    #[serde(default, alias = "verticalExpandRatio")]
    pub vertical_expand_ratio: Option<f64>,
    #[serde(default, alias = "contrastThreshold")]
    pub contrast_threshold: Option<f64>,
    #[serde(default, alias = "colorRatioThreshold")]
    pub color_ratio_threshold: Option<f32>,
    #[serde(default, alias = "matchThreshold")]
    pub match_threshold: Option<f32>,
    #[serde(default, alias = "includeSuffix")]
    pub notation_suffix: Option<bool>,
    #[serde(default)]
    pub locator: Option<BoardLocatorParams>,
    #[serde(default)]
    pub grid: Option<GridParams>,
    #[serde(default)]
    pub cell: Option<CellParams>,
    #[serde(default)]
    pub matching: Option<MatchParams>,
}

impl DetectConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build detector parameters, applying overrides from the config.
    pub fn build_params(&self) -> XiangqiDetectorParams {
        let mut params = XiangqiDetectorParams::default();
        if let Some(locator) = self.locator.clone() {
            params.locator = locator;
        }
        if let Some(grid) = self.grid.clone() {
            params.grid = grid;
        }
        if let Some(cell) = self.cell.clone() {
            params.cell = cell;
        }
        if let Some(matching) = self.matching.clone() {
            params.matching = matching;
        }
        if let Some(v) = self.horizontal_expand_ratio {
            params.grid.horizontal_expand_ratio = v;
        }
        if let Some(v) = self.vertical_expand_ratio {
            params.grid.vertical_expand_ratio = v;
        }
        if let Some(v) = self.contrast_threshold {
            params.cell.contrast_threshold = v;
        }
        if let Some(v) = self.color_ratio_threshold {
            params.cell.color_ratio_threshold = v;
        }
        if let Some(v) = self.match_threshold {
            params.matching.match_threshold = v;
        }
        if let Some(v) = self.notation_suffix {
            params.notation_suffix = v;
        }
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_width: u32,
    pub image_height: u32,
    pub params: XiangqiDetectorParams,
    #[serde(default)]
    pub board_region: Option<BoundingRegion>,
    #[serde(default)]
    pub grid_region: Option<BoundingRegion>,
    #[serde(default)]
    pub grid: Option<GridModel>,
    #[serde(default)]
    pub cells: Option<Vec<CellReport>>,
    #[serde(default)]
    pub matrix: Option<BoardMatrix>,
    #[serde(default)]
    pub notation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectReport {
    /// Empty report for an image of the given size.
    pub fn new(image_width: u32, image_height: u32, params: &XiangqiDetectorParams) -> Self {
        Self {
            image_width,
            image_height,
            params: params.clone(),
            board_region: None,
            grid_region: None,
            grid: None,
            cells: None,
            matrix: None,
            notation: None,
            error: None,
        }
    }

    /// Populate report fields from a successful detection.
    pub fn set_detection(&mut self, res: BoardDetectionResult) {
        self.board_region = Some(res.board_region);
        self.grid_region = Some(res.grid_region);
        self.grid = Some(res.grid);
        self.cells = Some(res.cells);
        self.matrix = Some(res.matrix);
        self.notation = Some(res.notation);
        self.error = None;
    }

    /// Record a detection error.
    pub fn set_error(&mut self, err: &DetectError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_overrides_apply_on_top_of_defaults() {
        let cfg: DetectConfig = serde_json::from_str(
            r#"{
                "horizontalExpandRatio": 0.05,
                "vertical_expand_ratio": 0.05,
                "contrastThreshold": 25,
                "matchThreshold": 0.4,
                "includeSuffix": true
            }"#,
        )
        .unwrap();
        let params = cfg.build_params();
        assert_eq!(params.grid.horizontal_expand_ratio, 0.05);
        assert_eq!(params.grid.vertical_expand_ratio, 0.05);
        assert_eq!(params.cell.contrast_threshold, 25.0);
        assert_eq!(params.cell.color_ratio_threshold, 0.05);
        assert_eq!(params.matching.match_threshold, 0.4);
        assert!(params.notation_suffix);
        assert_eq!(params.locator, BoardLocatorParams::default());
    }

    #[test]
    fn scalar_override_wins_over_stage_object() {
        let cfg = DetectConfig {
            grid: Some(GridParams {
                horizontal_expand_ratio: 0.2,
                canny_low: 40.0,
                ..GridParams::default()
            }),
            horizontal_expand_ratio: Some(0.1),
            ..DetectConfig::default()
        };
        let params = cfg.build_params();
        assert_eq!(params.grid.horizontal_expand_ratio, 0.1);
        assert_eq!(params.grid.canny_low, 40.0);
    }

    #[test]
    fn partial_stage_objects_fill_defaults() {
        let cfg: DetectConfig =
            serde_json::from_str(r#"{ "cell": { "contrast_threshold": 12.5 } }"#).unwrap();
        let cell = cfg.build_params().cell;
        assert_eq!(cell.contrast_threshold, 12.5);
        assert_eq!(cell.closing_iterations, 2);
        assert_eq!(cell.extract_red, CellParams::default().extract_red);
    }

    #[test]
    fn config_and_report_survive_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DetectConfig {
            match_threshold: Some(0.35),
            ..DetectConfig::default()
        };
        let cfg_path = dir.path().join("config.json");
        cfg.write_json(&cfg_path).unwrap();
        assert_eq!(DetectConfig::load_json(&cfg_path).unwrap(), cfg);

        let params = cfg.build_params();
        let mut report = DetectReport::new(640, 480, &params);
        report.set_error(&DetectError::NoContourFound);
        let report_path = dir.path().join("report.json");
        report.write_json(&report_path).unwrap();
        let loaded = DetectReport::load_json(&report_path).unwrap();
        assert_eq!(loaded.image_width, 640);
        assert_eq!(loaded.params, params);
        assert_eq!(
            loaded.error.as_deref(),
            Some("no contour found while locating the board")
        );
        assert!(loaded.notation.is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DetectConfig::load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }
}
