//! Piece-side recognition.
//!
//! This module provides:
//! - Thumbnail discovery with layout sanity checks (`thumbnails`)
//! - The preview drag and capture (`preview`)
//! - Shape and hue decoding of a previewed piece (`shape`)

pub mod preview;
pub mod shape;
pub mod thumbnails;

pub use preview::{capture_preview, preview_gesture, preview_piece};
pub use shape::decode_piece;
pub use thumbnails::{find_thumbnails, select_thumbnails, thumbnail_rect, thumbnail_strip, Rejection};

use image::RgbaImage;

use crate::automation::{Controller, Stabilizer};
use crate::board::PuzzleDescription;
use crate::config::RecognitionConfig;

/// Finds every piece waiting to be placed and decodes its shape.
///
/// Each thumbnail is previewed once the strip has stopped moving. A piece
/// whose preview fails is dropped; a failed stabilization ends extraction
/// with no pieces.
pub fn extract_puzzles(
    img: &RgbaImage,
    ctrl: &mut dyn Controller,
    stabilizer: &mut dyn Stabilizer,
    config: &RecognitionConfig,
) -> Vec<PuzzleDescription> {
    let thumbs = find_thumbnails(img, config);
    crate::log(&format!("Puzzle thumbnail positions: {:?}", thumbs));

    let strip = thumbnail_strip(&config.thumbnail);
    let mut puzzles = Vec::with_capacity(thumbs.len());
    for thumb in thumbs {
        if let Err(e) = stabilizer.wait_stable(strip) {
            crate::log(&format!("Error: Failed to wait for thumbnails to settle: {}", e));
            return Vec::new();
        }
        if let Some(piece) = preview_piece(ctrl, config, thumb) {
            crate::log(&format!(
                "Puzzle structure: blocks {:?}, hue {}",
                piece.blocks, piece.hue
            ));
            puzzles.push(piece);
        }
    }
    puzzles
}
