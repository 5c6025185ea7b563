//! Coordinate conversion between the three frames recognition works in:
//! raw pixel LT coordinates, board grid indices, and piece-relative block
//! offsets around the preview anchor.
//!
//! Board positions are anchored at the visual center block, so the pixel
//! position of a cell depends on the board size: a board with an even width
//! straddles the anchor by half a block.

use crate::config::{BoardConfig, PieceConfig, ProjectionConfig};
use crate::vision::Rect;

/// Offset of a grid index from the visual center, in blocks.
fn rel_index(index: i32, count: i32) -> f64 {
    index as f64 - (count - 1) as f64 / 2.0
}

/// Converts a grid index to the LT pixel coordinate of that cell.
pub fn board_to_lt(board: &BoardConfig, grid_x: i32, grid_y: i32, width: i32, height: i32) -> (i32, i32) {
    let x = board.center_block_lt_x + rel_index(grid_x, width) * board.block_w;
    let y = board.center_block_lt_y + rel_index(grid_y, height) * board.block_h;
    (x as i32, y as i32)
}

/// Converts a pixel coordinate to the grid index of the cell containing it,
/// treating the coordinate as the LT corner of something block-sized.
///
/// The result may lie outside `[0, width) x [0, height)`; callers check bounds.
pub fn lt_to_board(board: &BoardConfig, x: i32, y: i32, width: i32, height: i32) -> (i32, i32) {
    let gx = (x as f64 - board.center_block_lt_x) / board.block_w + (width - 1) as f64 / 2.0;
    let gy = (y as f64 - board.center_block_lt_y) / board.block_h + (height - 1) as f64 / 2.0;
    (gx.round() as i32, gy.round() as i32)
}

/// Pixel rectangle of a board cell.
pub fn block_rect(board: &BoardConfig, grid_x: i32, grid_y: i32, width: i32, height: i32) -> Rect {
    let (x, y) = board_to_lt(board, grid_x, grid_y, width, height);
    Rect::new(x, y, board.block_w as i32, board.block_h as i32)
}

/// Whether a grid index lies on a `width` x `height` board.
pub fn in_bounds(grid_x: i32, grid_y: i32, width: i32, height: i32) -> bool {
    (0..width).contains(&grid_x) && (0..height).contains(&grid_y)
}

/// Pixel rectangle of the projection figure above column `grid_x`.
pub fn x_figure_rect(
    board: &BoardConfig,
    projection: &ProjectionConfig,
    grid_x: i32,
    width: i32,
    height: i32,
) -> Rect {
    let x = board.center_block_lt_x + rel_index(grid_x, width) * board.block_w;
    let y = board.center_block_lt_y - (height - 1) as f64 / 2.0 * board.block_h - projection.x_figure_h;
    Rect::new(x as i32, y as i32, board.block_w as i32, projection.x_figure_h as i32)
}

/// Pixel rectangle of the projection figure left of row `grid_y`.
pub fn y_figure_rect(
    board: &BoardConfig,
    projection: &ProjectionConfig,
    grid_y: i32,
    width: i32,
    height: i32,
) -> Rect {
    let x = board.center_block_lt_x - (width - 1) as f64 / 2.0 * board.block_w - projection.y_figure_w;
    let y = board.center_block_lt_y + rel_index(grid_y, height) * board.block_h;
    Rect::new(x as i32, y as i32, projection.y_figure_w as i32, board.block_h as i32)
}

/// Pixel rectangle of the block at a piece-relative offset from the preview anchor.
pub fn piece_block_rect(piece: &PieceConfig, offset_x: i32, offset_y: i32) -> Rect {
    let center_x = piece.preview_x + offset_x as f64 * piece.block_w;
    let center_y = piece.preview_y + offset_y as f64 * piece.block_h;
    let x = (center_x - piece.block_w / 2.0) as i32;
    let y = (center_y - piece.block_h / 2.0) as i32;
    Rect::new(x, y, piece.block_w as i32, piece.block_h as i32)
}
