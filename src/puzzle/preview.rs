//! Dragging a thumbnail onto the preview anchor and reading the piece.

use image::RgbaImage;

use crate::automation::{Controller, Gesture, TouchGuard};
use crate::board::PuzzleDescription;
use crate::config::RecognitionConfig;

use super::shape::decode_piece;

/// Touch sequence that picks up the thumbnail at `thumb` (LT corner) and
/// holds it over the preview anchor.
pub fn preview_gesture(config: &RecognitionConfig, thumb: [i32; 2]) -> Gesture {
    let timing = &config.timing;
    let start_x = thumb[0] + config.thumbnail.w as i32 / 2;
    let start_y = thumb[1] + config.thumbnail.h as i32 / 2;

    Gesture::new()
        .up(timing.release_before_ms)
        .down(start_x, start_y, timing.press_ms)
        .move_to(
            config.piece.preview_x as i32,
            config.piece.preview_y as i32,
            timing.drag_ms,
        )
}

/// Captures the screen while the thumbnail at `thumb` is held over the
/// preview anchor. The touch is released on every path out.
pub fn capture_preview(
    ctrl: &mut dyn Controller,
    config: &RecognitionConfig,
    thumb: [i32; 2],
) -> Option<RgbaImage> {
    crate::log(&format!("Previewing puzzle thumbnail at ({}, {})", thumb[0], thumb[1]));

    let mut guard = TouchGuard::new(ctrl);
    if let Err(e) = preview_gesture(config, thumb).play(guard.controller()) {
        crate::log(&format!("Error: Preview drag failed: {}", e));
        return None;
    }

    let img = match guard.controller().screencap() {
        Ok(img) => img,
        Err(e) => {
            crate::log(&format!("Error: Failed to capture preview image: {}", e));
            return None;
        }
    };

    if let Err(e) = guard.release(config.timing.release_after_ms) {
        crate::log(&format!("Warning: Failed to release touch: {}", e));
    }
    Some(img)
}

/// Previews one thumbnail and decodes its piece.
pub fn preview_piece(
    ctrl: &mut dyn Controller,
    config: &RecognitionConfig,
    thumb: [i32; 2],
) -> Option<PuzzleDescription> {
    let img = capture_preview(ctrl, config, thumb)?;
    let piece = decode_piece(&img, &config.piece);
    if piece.is_none() {
        crate::log("Warning: No piece blocks found in preview");
    }
    piece
}
