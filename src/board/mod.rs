//! Board-side recognition.
//!
//! This module provides:
//! - The description records handed to the solver (`types`)
//! - Pixel / grid / piece-offset coordinate conversion (`coords`)
//! - Board size estimation from projection markers (`geometry`)
//! - Per-hue projection number decoding (`projection`)
//! - Banned and locked block classification (`blocks`)

pub mod blocks;
pub mod coords;
pub mod geometry;
pub mod projection;
pub mod types;

pub use blocks::{banned_blocks_on_board, find_banned_markers, find_locked_blocks, LockedPool};
pub use geometry::estimate_board_size;
pub use projection::decode_projection;
pub use types::{
    BannedBlockDescription, BoardDescription, LockedBlockDescription, ProjectionDescription,
    PuzzleDescription,
};
