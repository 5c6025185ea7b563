//! Banned and locked block classification.

use anyhow::Result;
use image::RgbaImage;

use crate::board::coords::{block_rect, in_bounds, lt_to_board};
use crate::board::types::{BannedBlockDescription, LockedBlockDescription};
use crate::config::RecognitionConfig;
use crate::vision::{area_mean_hsv, area_median_hsv, hue_distance, Template, TemplateMatcher};

/// Finds the LT pixel corners of all banned-block markers.
pub fn find_banned_markers(
    img: &RgbaImage,
    matcher: &dyn TemplateMatcher,
    config: &RecognitionConfig,
) -> Result<Vec<[i32; 2]>> {
    let roi = config
        .board
        .banned_region
        .to_rect(config.frame.width, config.frame.height);
    let matches = matcher.match_all(img, Template::BlockBanned, roi, config.board.banned_max_matches)?;
    Ok(matches.iter().map(|m| [m.x, m.y]).collect())
}

/// Maps banned markers onto the board, dropping those outside it.
pub fn banned_blocks_on_board(
    config: &RecognitionConfig,
    width: i32,
    height: i32,
    markers: &[[i32; 2]],
) -> Vec<BannedBlockDescription> {
    markers
        .iter()
        .filter_map(|&raw| {
            let (gx, gy) = lt_to_board(&config.board, raw[0], raw[1], width, height);
            in_bounds(gx, gy, width, height).then_some(BannedBlockDescription {
                loc: [gx, gy],
                raw_loc: raw,
            })
        })
        .collect()
}

/// Scans every cell and returns those pre-filled by the game, with their hue.
pub fn find_locked_blocks(
    img: &RgbaImage,
    config: &RecognitionConfig,
    width: i32,
    height: i32,
) -> Vec<LockedBlockDescription> {
    let board = &config.board;
    let mut locked = Vec::new();

    for gy in 0..height {
        for gx in 0..width {
            let rect = block_rect(board, gx, gy, width, height);
            let mean = area_mean_hsv(img, rect);
            if mean.s > board.locked_sat_min && mean.v > board.locked_val_min {
                let hue = area_median_hsv(img, rect).h as i32;
                locked.push(LockedBlockDescription {
                    loc: [gx, gy],
                    raw_loc: [rect.x, rect.y],
                    hue,
                });
            }
        }
    }
    locked
}

/// Locked blocks not yet assigned to a hue family.
///
/// Claiming consumes the pool and hands back the remainder, so a block can
/// only ever end up in one family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockedPool {
    blocks: Vec<LockedBlockDescription>,
}

impl LockedPool {
    pub fn new(blocks: Vec<LockedBlockDescription>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Splits off the blocks within `tolerance` of `hue`.
    ///
    /// Returns `(claimed, remaining pool)`.
    pub fn claim(self, hue: i32, tolerance: i32) -> (Vec<LockedBlockDescription>, LockedPool) {
        let (claimed, rest): (Vec<_>, Vec<_>) = self
            .blocks
            .into_iter()
            .partition(|b| hue_distance(b.hue, hue) <= tolerance);
        (claimed, LockedPool { blocks: rest })
    }
}
