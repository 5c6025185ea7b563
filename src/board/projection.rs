//! Projection number decoding.
//!
//! A projection figure is not a digit but a stack of fixed-pitch marks that
//! grows away from the board edge. The number is recovered from how far the
//! marks of the target hue extend: `round((extent - init_gap) / each_gap)`.

use image::RgbaImage;

use crate::board::coords::{x_figure_rect, y_figure_rect};
use crate::board::types::ProjectionDescription;
use crate::config::RecognitionConfig;
use crate::vision::{sample_hsv_near, Rect};

/// Which edge of the board a figure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Above a column; inner edge is the bottom, scanning goes up
    X,
    /// Left of a row; inner edge is the right, scanning goes left
    Y,
}

/// Returns the highest marked step reached, counting from 1.
///
/// Unmarked steps do not stop the scan: a marked step past a gap still
/// extends the result.
pub fn scan_extent(steps: usize, mut is_marked: impl FnMut(usize) -> bool) -> usize {
    let mut extent = 0;
    for i in 0..steps {
        if is_marked(i) {
            extent = i + 1;
        }
    }
    extent
}

/// Converts a marked extent in pixels to the projection number.
pub fn decode_extent(extent: usize, init_gap: f64, each_gap: f64) -> u32 {
    let value = ((extent as f64 - init_gap) / each_gap).round();
    if value < 0.0 { 0 } else { value as u32 }
}

/// Reads the number of one projection figure for `hue`.
pub fn figure_number(
    img: &RgbaImage,
    config: &RecognitionConfig,
    rect: Rect,
    axis: Axis,
    hue: i32,
) -> u32 {
    let projection = &config.projection;
    let tolerance = config.hue.cluster_tolerance;
    let is_mark = |x: i32, y: i32| {
        let hsv = sample_hsv_near(img, x, y, hue, tolerance);
        hsv.s > projection.sat_min && hsv.v > projection.val_min
    };

    let extent = match axis {
        Axis::X => {
            let bottom = rect.y + rect.h;
            scan_extent(rect.h.max(0) as usize, |i| {
                let y = bottom - 1 - i as i32;
                projection
                    .sampling_points
                    .iter()
                    .any(|p| is_mark(rect.x + (rect.w as f64 * p) as i32, y))
            })
        }
        Axis::Y => {
            let right = rect.x + rect.w;
            scan_extent(rect.w.max(0) as usize, |i| {
                let x = right - 1 - i as i32;
                projection
                    .sampling_points
                    .iter()
                    .any(|p| is_mark(x, rect.y + (rect.h as f64 * p) as i32))
            })
        }
    };

    decode_extent(extent, projection.init_gap, projection.each_gap)
}

/// Decodes all projection numbers of `hue` on a `width` x `height` board.
pub fn decode_projection(
    img: &RgbaImage,
    config: &RecognitionConfig,
    width: i32,
    height: i32,
    hue: i32,
) -> ProjectionDescription {
    let x_proj = (0..width)
        .map(|gx| {
            let rect = x_figure_rect(&config.board, &config.projection, gx, width, height);
            figure_number(img, config, rect, Axis::X, hue)
        })
        .collect();
    let y_proj = (0..height)
        .map(|gy| {
            let rect = y_figure_rect(&config.board, &config.projection, gy, width, height);
            figure_number(img, config, rect, Axis::Y, hue)
        })
        .collect();

    ProjectionDescription { x_proj, y_proj }
}
