//! Calibration constants for recognition.
//!
//! Loads settings from puzzle_config.json at startup. Provides the board
//! anchor, block extents, detection thresholds, the thumbnail grid layout and
//! gesture timings. Defaults are calibrated for a 1280x720 work frame.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::vision::Rect;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<RecognitionConfig> = OnceLock::new();

/// A rectangle in relative coordinates (0.0 to 1.0) of the work frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f64,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f64,
    /// Width as fraction of frame width
    pub width: f64,
    /// Height as fraction of frame height
    pub height: f64,
}

impl RelativeRect {
    /// Converts to absolute pixels for a frame of the given size.
    pub fn to_rect(&self, frame_w: f64, frame_h: f64) -> Rect {
        Rect::new(
            (self.x * frame_w) as i32,
            (self.y * frame_h) as i32,
            (self.width * frame_w) as i32,
            (self.height * frame_h) as i32,
        )
    }
}

/// Complete recognition configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub frame: FrameConfig,
    pub board: BoardConfig,
    pub projection: ProjectionConfig,
    pub thumbnail: ThumbnailConfig,
    pub piece: PieceConfig,
    pub hue: HueConfig,
    pub tab: TabConfig,
    pub timing: GestureTiming,
}

/// Work frame size every pixel constant refers to.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// LT corner of the block at the visual center of the board
    pub center_block_lt_x: f64,
    pub center_block_lt_y: f64,
    /// Pixel extent of one board block
    pub block_w: f64,
    pub block_h: f64,
    /// Largest number of blocks on either side of the center block
    pub max_extent_one_side: i32,
    /// Shift of the expected marker position, in blocks
    pub geometry_bias_factor: f64,
    /// Tolerance window for a marker vote, in blocks
    pub geometry_crop_factor: f64,
    pub geometry_max_matches: usize,
    /// Lowest template match score kept by the bundled matcher
    pub template_threshold: f64,
    /// Search region for the column-count (top) markers
    pub top_marker_region: RelativeRect,
    /// Search region for the row-count (left) markers
    pub left_marker_region: RelativeRect,
    /// Search region for banned-block markers
    pub banned_region: RelativeRect,
    pub banned_max_matches: usize,
    pub locked_sat_min: f64,
    pub locked_val_min: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Height of a top projection figure
    pub x_figure_h: f64,
    /// Width of a left projection figure
    pub y_figure_w: f64,
    /// Pixels before the first mark of a figure
    pub init_gap: f64,
    /// Pixel pitch of one mark
    pub each_gap: f64,
    /// Fractions across the perpendicular axis sampled at each scan step
    pub sampling_points: Vec<f64>,
    pub sat_min: f64,
    pub val_min: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub start_x: f64,
    pub start_y: f64,
    pub w: f64,
    pub h: f64,
    pub max_rows: usize,
    pub max_cols: usize,
    /// Above this variance a cell holds a thumbnail
    pub var_min: f64,
    /// Above this variance a cell is treated as ambiguous
    pub var_max: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceConfig {
    /// Drag target; the core block of a previewed piece is centered here
    pub preview_x: f64,
    pub preview_y: f64,
    pub block_w: f64,
    pub block_h: f64,
    pub max_extent_one_side: i32,
    pub var_min: f64,
    pub sat_min: f64,
    pub val_min: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HueConfig {
    /// Hues closer than this (in degrees) belong to the same family
    pub cluster_tolerance: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    pub tab1_x: f64,
    pub tab2_x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Key code sent to switch back to the first tab
    pub switch_key: i32,
    pub switch_wait_ms: u64,
}

/// Delays of the preview drag, in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTiming {
    pub release_before_ms: u64,
    pub press_ms: u64,
    pub drag_ms: u64,
    pub release_after_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            center_block_lt_x: 618.0,
            center_block_lt_y: 338.0,
            block_w: 52.0,
            block_h: 52.0,
            max_extent_one_side: 4,
            geometry_bias_factor: 0.075,
            geometry_crop_factor: 0.8,
            geometry_max_matches: 16,
            template_threshold: 0.8,
            top_marker_region: RelativeRect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 0.5,
            },
            left_marker_region: RelativeRect {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 1.0,
            },
            banned_region: RelativeRect {
                x: 0.2,
                y: 0.2,
                width: 0.6,
                height: 0.6,
            },
            banned_max_matches: 64,
            locked_sat_min: 0.4,
            locked_val_min: 0.45,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            x_figure_h: 60.0,
            y_figure_w: 60.0,
            init_gap: 4.0,
            each_gap: 6.0,
            sampling_points: vec![0.333, 0.5, 0.667],
            sat_min: 0.35,
            val_min: 0.5,
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            start_x: 960.0,
            start_y: 150.0,
            w: 100.0,
            h: 100.0,
            max_rows: 4,
            max_cols: 3,
            var_min: 100.0,
            var_max: 9000.0,
        }
    }
}

impl Default for PieceConfig {
    fn default() -> Self {
        Self {
            preview_x: 170.0,
            preview_y: 380.0,
            block_w: 40.0,
            block_h: 40.0,
            max_extent_one_side: 2,
            var_min: 20.0,
            sat_min: 0.3,
            val_min: 0.35,
        }
    }
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            cluster_tolerance: 10,
        }
    }
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            tab1_x: 980.0,
            tab2_x: 1120.0,
            y: 80.0,
            w: 120.0,
            h: 40.0,
            switch_key: 9, // Tab
            switch_wait_ms: 500,
        }
    }
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            release_before_ms: 100,
            press_ms: 100,
            drag_ms: 500,
            release_after_ms: 250,
        }
    }
}

/// Loads configuration from a JSON file or returns defaults.
///
/// A missing or unparsable file is logged and replaced by defaults, so a
/// broken config never prevents a recognition pass.
pub fn load_config(config_path: &Path) -> RecognitionConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from file");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Warning: Failed to parse config: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Warning: Failed to read config: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("Config not found. Using default config.");
    }

    RecognitionConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(config_path: &Path) {
    let _ = CONFIG.set(load_config(config_path));
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static RecognitionConfig {
    CONFIG.get_or_init(RecognitionConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json"));

        assert_eq!(config.hue.cluster_tolerance, 10);
        assert_eq!(config.frame.width, 1280.0);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("puzzle_config.json");
        std::fs::write(&path, r#"{"hue": {"cluster_tolerance": 6}, "board": {"block_w": 40.0}}"#)
            .unwrap();

        let config = load_config(&path);

        assert_eq!(config.hue.cluster_tolerance, 6);
        assert_eq!(config.board.block_w, 40.0);
        assert_eq!(config.board.block_h, 52.0);
        assert_eq!(config.thumbnail.max_rows, 4);
    }

    #[test]
    fn test_broken_config_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("puzzle_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = load_config(&path);
        assert_eq!(config.projection.sampling_points, vec![0.333, 0.5, 0.667]);
    }

    #[test]
    fn test_relative_rect_to_rect() {
        let region = RelativeRect {
            x: 0.25,
            y: 0.5,
            width: 0.5,
            height: 0.25,
        };
        assert_eq!(region.to_rect(1280.0, 720.0), Rect::new(320, 360, 640, 180));
    }
}
