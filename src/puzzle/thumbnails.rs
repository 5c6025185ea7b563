//! Discovery of piece thumbnails in the side strip.
//!
//! Thumbnails fill the grid from the first cell on, row by row. A cell
//! holds a thumbnail when its color variance is above the background level.
//! Anything that contradicts that layout is treated as a misread screen and
//! yields no thumbnails at all.

use image::RgbaImage;
use std::fmt;

use crate::config::{RecognitionConfig, ThumbnailConfig};
use crate::vision::{area_variance, Rect};

/// Why a thumbnail scan was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A cell's variance is too high to be a thumbnail or background
    Uncertain { row: usize, col: usize },
    /// A thumbnail follows an empty cell
    Gap { row: usize, col: usize },
    /// Every cell holds a thumbnail
    Full,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Uncertain { row, col } => {
                write!(f, "uncertain thumbnail area at row {}, col {}", row, col)
            }
            Rejection::Gap { row, col } => {
                write!(f, "non-contiguous thumbnails (gap before row {}, col {})", row, col)
            }
            Rejection::Full => write!(f, "too many thumbnails"),
        }
    }
}

/// Pixel rectangle of the thumbnail cell at `(row, col)`.
pub fn thumbnail_rect(thumbs: &ThumbnailConfig, row: usize, col: usize) -> Rect {
    let x = (thumbs.start_x + col as f64 * thumbs.w) as i32;
    let y = (thumbs.start_y + row as f64 * thumbs.h) as i32;
    Rect::new(x, y, thumbs.w as i32, thumbs.h as i32)
}

/// Region watched for stability while thumbnails are dragged out.
pub fn thumbnail_strip(thumbs: &ThumbnailConfig) -> Rect {
    Rect::new(
        thumbs.start_x as i32,
        thumbs.start_y as i32,
        (thumbs.max_cols as f64 * thumbs.w) as i32,
        ((thumbs.max_rows + 1) as f64 * thumbs.h) as i32,
    )
}

/// Applies the layout rules to per-cell variances given in row-major order.
///
/// Returns the LT corners of the thumbnail cells.
pub fn select_thumbnails(
    thumbs: &ThumbnailConfig,
    variances: &[f64],
) -> Result<Vec<[i32; 2]>, Rejection> {
    let mut found = Vec::new();
    let mut seen_gap = false;

    for (idx, &variance) in variances.iter().enumerate() {
        let (row, col) = (idx / thumbs.max_cols, idx % thumbs.max_cols);
        if variance > thumbs.var_min {
            if variance > thumbs.var_max {
                return Err(Rejection::Uncertain { row, col });
            }
            if seen_gap {
                return Err(Rejection::Gap { row, col });
            }
            let rect = thumbnail_rect(thumbs, row, col);
            found.push([rect.x, rect.y]);
        } else {
            seen_gap = true;
        }
    }

    if found.len() >= thumbs.max_rows * thumbs.max_cols {
        return Err(Rejection::Full);
    }
    Ok(found)
}

/// Finds the LT corners of all piece thumbnails, or none if the strip looks wrong.
pub fn find_thumbnails(img: &RgbaImage, config: &RecognitionConfig) -> Vec<[i32; 2]> {
    let thumbs = &config.thumbnail;
    let variances: Vec<f64> = (0..thumbs.max_rows)
        .flat_map(|row| (0..thumbs.max_cols).map(move |col| (row, col)))
        .map(|(row, col)| area_variance(img, thumbnail_rect(thumbs, row, col)))
        .collect();

    match select_thumbnails(thumbs, &variances) {
        Ok(found) => found,
        Err(rejection) => {
            crate::log(&format!("Warning: Detected {}, skipping", rejection));
            Vec::new()
        }
    }
}
