//! Shape decoding of a piece held over the preview anchor.

use image::RgbaImage;

use crate::board::coords::piece_block_rect;
use crate::board::PuzzleDescription;
use crate::config::PieceConfig;
use crate::vision::{area_mean_hsv, area_median_hsv, area_variance};

/// Reads the filled blocks of the previewed piece.
///
/// Block offsets are relative to the core block under the preview anchor,
/// listed row by row. The piece hue is the mean of the block hues, each read
/// from the block's median color. Returns `None` when no block is filled.
pub fn decode_piece(img: &RgbaImage, piece: &PieceConfig) -> Option<PuzzleDescription> {
    let ext = piece.max_extent_one_side;
    let mut blocks = Vec::new();
    let mut total_hue = 0.0f64;

    for offset_y in -ext..=ext {
        for offset_x in -ext..=ext {
            let rect = piece_block_rect(piece, offset_x, offset_y);
            let variance = area_variance(img, rect);
            let mean = area_mean_hsv(img, rect);
            if variance > piece.var_min && mean.s > piece.sat_min && mean.v > piece.val_min {
                blocks.push([offset_x, offset_y]);
                total_hue += area_median_hsv(img, rect).h;
            }
        }
    }

    if blocks.is_empty() {
        return None;
    }
    let hue = (total_hue / blocks.len() as f64) as i32;
    Some(PuzzleDescription { blocks, hue })
}
