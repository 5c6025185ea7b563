//! Board size estimation from projection marker matches.
//!
//! Every projection figure carries a small marker glyph. The markers above the
//! board sit higher the taller the board is, and the markers left of the board
//! sit further left the wider it is. Each matched marker votes, with its
//! squared confidence, for every board size that would place it where it was
//! found; the size with the highest total wins.

use anyhow::Result;
use image::RgbaImage;
use std::collections::BTreeMap;

use crate::config::RecognitionConfig;
use crate::vision::{Template, TemplateMatch, TemplateMatcher};

/// Board sizes considered, from 2 up to a full board.
fn candidate_sizes(config: &RecognitionConfig) -> std::ops::RangeInclusive<i32> {
    2..=2 * config.board.max_extent_one_side + 1
}

/// Expected center Y of the top markers on a board with `height` rows.
pub fn expected_top_marker_y(config: &RecognitionConfig, height: i32) -> f64 {
    let board = &config.board;
    let dist = (height - 1) as f64 / 2.0;
    board.center_block_lt_y - dist * board.block_h - board.geometry_bias_factor * board.block_h
}

/// Expected center X of the left markers on a board with `width` columns.
pub fn expected_left_marker_x(config: &RecognitionConfig, width: i32) -> f64 {
    let board = &config.board;
    let dist = (width - 1) as f64 / 2.0;
    board.center_block_lt_x - dist * board.block_w - board.geometry_bias_factor * board.block_w
}

/// Accumulates the votes of observed marker positions for every candidate size.
///
/// `observed` holds `(position, confidence)` pairs. A marker votes for size
/// `d` when it lies strictly between `expected(d) - window` and `expected(d)`.
pub fn score_sizes(
    observed: &[(f64, f64)],
    sizes: impl Iterator<Item = i32>,
    expected: impl Fn(i32) -> f64,
    window: f64,
) -> BTreeMap<i32, f64> {
    sizes
        .map(|d| {
            let target = expected(d);
            let score = observed
                .iter()
                .filter(|(pos, _)| {
                    let delta = target - pos;
                    0.0 < delta && delta < window
                })
                .fold(0.0, |acc, (_, confidence)| acc + confidence * confidence);
            (d, score)
        })
        .collect()
}

/// Picks the size with the highest score, preferring the larger size on ties.
///
/// Returns 0 for an empty score map.
pub fn pick_size(scores: &BTreeMap<i32, f64>) -> i32 {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (&d, &score) in scores {
        if score >= best_score {
            best = d;
            best_score = score;
        }
    }
    best
}

/// Estimates the number of rows from the top markers. Returns 0 without markers.
pub fn estimate_height(config: &RecognitionConfig, top_markers: &[TemplateMatch]) -> i32 {
    if top_markers.is_empty() {
        crate::log("Warning: No X projection figures detected");
        return 0;
    }
    let observed: Vec<(f64, f64)> = top_markers
        .iter()
        .map(|m| (m.center_y as f64, m.score))
        .collect();
    let window = config.board.block_h * config.board.geometry_crop_factor;
    let scores = score_sizes(
        &observed,
        candidate_sizes(config),
        |h| expected_top_marker_y(config, h),
        window,
    );
    let best = pick_size(&scores);
    crate::log(&format!("Estimated board height: {} (scores: {:?})", best, scores));
    best
}

/// Estimates the number of columns from the left markers. Returns 0 without markers.
pub fn estimate_width(config: &RecognitionConfig, left_markers: &[TemplateMatch]) -> i32 {
    if left_markers.is_empty() {
        crate::log("Warning: No Y projection figures detected");
        return 0;
    }
    let observed: Vec<(f64, f64)> = left_markers
        .iter()
        .map(|m| (m.center_x as f64, m.score))
        .collect();
    let window = config.board.block_w * config.board.geometry_crop_factor;
    let scores = score_sizes(
        &observed,
        candidate_sizes(config),
        |w| expected_left_marker_x(config, w),
        window,
    );
    let best = pick_size(&scores);
    crate::log(&format!("Estimated board width: {} (scores: {:?})", best, scores));
    best
}

/// Estimates `(width, height)` of the board in `img`.
///
/// A dimension without any marker match comes back as 0; callers treat that
/// as a failed estimate.
pub fn estimate_board_size(
    img: &RgbaImage,
    matcher: &dyn TemplateMatcher,
    config: &RecognitionConfig,
) -> Result<(i32, i32)> {
    let frame = &config.frame;
    let board = &config.board;

    let top_markers = matcher.match_all(
        img,
        Template::ProjX,
        board.top_marker_region.to_rect(frame.width, frame.height),
        board.geometry_max_matches,
    )?;
    let height = estimate_height(config, &top_markers);

    let left_markers = matcher.match_all(
        img,
        Template::ProjY,
        board.left_marker_region.to_rect(frame.width, frame.height),
        board.geometry_max_matches,
    )?;
    let width = estimate_width(config, &left_markers);

    Ok((width, height))
}
