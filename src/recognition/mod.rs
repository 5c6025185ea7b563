//! Full recognition pass over one board.
//!
//! This module provides:
//! - `recognize`: runs the state machine and returns the board, or
//!   `NoPuzzles` when there is nothing to place
//! - `run_recognition`: the same pass folded into the serialized record and
//!   a success flag, as handed to the solver

pub mod state;

pub use state::{RecognitionContext, RecognitionState};

use anyhow::{anyhow, Result};
use image::RgbaImage;

use crate::automation::{Controller, Stabilizer};
use crate::board::BoardDescription;
use crate::config::RecognitionConfig;
use crate::vision::TemplateMatcher;

/// Result of a recognition pass that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum Recognition {
    Board(BoardDescription),
    /// No pieces were found; the board is not worth describing
    NoPuzzles,
}

impl Recognition {
    pub fn board(&self) -> Option<&BoardDescription> {
        match self {
            Recognition::Board(board) => Some(board),
            Recognition::NoPuzzles => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Recognition::Board(_))
    }

    /// Serialized record. `NoPuzzles` serializes as the empty board.
    pub fn detail(&self) -> serde_json::Result<String> {
        match self {
            Recognition::Board(board) => board.to_json(),
            Recognition::NoPuzzles => BoardDescription::default().to_json(),
        }
    }
}

/// Recognizes the board shown in `img`.
///
/// `img` is the capture the pass starts from; the controller is used for
/// piece previews and the refreshed capture after the tab check.
pub fn recognize(
    img: RgbaImage,
    ctrl: &mut dyn Controller,
    stabilizer: &mut dyn Stabilizer,
    matcher: &dyn TemplateMatcher,
    config: &RecognitionConfig,
) -> Result<Recognition> {
    crate::log("Starting puzzle board recognition");

    let mut ctx = RecognitionContext::new(img, ctrl, stabilizer, matcher, config);
    ctx.run();

    match ctx.state.clone() {
        RecognitionState::Complete => Ok(Recognition::Board(ctx.take_board())),
        RecognitionState::NoPuzzles => Ok(Recognition::NoPuzzles),
        RecognitionState::Error(msg) => Err(anyhow!(msg)),
        other => Err(anyhow!("Recognition stopped in state {}", other)),
    }
}

/// Runs `recognize` and returns `(detail, success)`.
///
/// A failed pass gives no detail. A pass without pieces gives the empty
/// record with `success == false`.
pub fn run_recognition(
    img: RgbaImage,
    ctrl: &mut dyn Controller,
    stabilizer: &mut dyn Stabilizer,
    matcher: &dyn TemplateMatcher,
    config: &RecognitionConfig,
) -> (Option<String>, bool) {
    let recognition = match recognize(img, ctrl, stabilizer, matcher, config) {
        Ok(recognition) => recognition,
        Err(e) => {
            crate::log(&format!("Error: Recognition failed: {}", e));
            return (None, false);
        }
    };

    match recognition.detail() {
        Ok(detail) => (Some(detail), recognition.is_success()),
        Err(e) => {
            crate::log(&format!("Error: Failed to serialize board description: {}", e));
            (None, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::{Event, MockController, MockStabilizer};
    use crate::board::coords::{board_to_lt, in_bounds, x_figure_rect, y_figure_rect};
    use crate::board::geometry::{expected_left_marker_x, expected_top_marker_y};
    use crate::puzzle::tests::{draw_thumbnails, fill, preview_frame, BACKGROUND};
    use crate::vision::{circular_mean, Rect, Template, TemplateMatch};
    use image::Rgba;

    const GREEN: [u8; 3] = [180, 230, 46];
    const LIME: [u8; 3] = [160, 230, 46];
    const BLUE: [u8; 3] = [40, 110, 230];

    const X_PROJ: [u32; 5] = [1, 2, 0, 3, 1];
    const Y_PROJ: [u32; 5] = [2, 0, 1, 1, 3];

    struct SceneMatcher {
        top: Vec<TemplateMatch>,
        left: Vec<TemplateMatch>,
        banned: Vec<TemplateMatch>,
    }

    impl TemplateMatcher for SceneMatcher {
        fn match_all(
            &self,
            _img: &RgbaImage,
            template: Template,
            _roi: Rect,
            max_matches: usize,
        ) -> Result<Vec<TemplateMatch>> {
            let all = match template {
                Template::ProjX => &self.top,
                Template::ProjY => &self.left,
                Template::BlockBanned => &self.banned,
            };
            Ok(all.iter().take(max_matches).copied().collect())
        }
    }

    fn found(x: i32, y: i32, size: i32) -> TemplateMatch {
        TemplateMatch {
            x,
            y,
            center_x: x + size / 2,
            center_y: y + size / 2,
            score: 0.9,
        }
    }

    /// Marker matches of a `w` x `h` board with a banned cell at (4, 4) and
    /// one banned marker outside the board.
    fn scene_matcher(config: &RecognitionConfig, w: i32, h: i32) -> SceneMatcher {
        let block_w = config.board.block_w as i32;
        let block_h = config.board.block_h as i32;
        let top_y = (expected_top_marker_y(config, h) - 0.4 * config.board.block_h) as i32;
        let left_x = (expected_left_marker_x(config, w) - 0.4 * config.board.block_w) as i32;
        let (bx, by) = board_to_lt(&config.board, 4, 4, w, h);

        SceneMatcher {
            top: (0..w)
                .map(|gx| {
                    let (x, _) = board_to_lt(&config.board, gx, 0, w, h);
                    found(x + block_w / 2 - 8, top_y - 8, 16)
                })
                .collect(),
            left: (0..h)
                .map(|gy| {
                    let (_, y) = board_to_lt(&config.board, 0, gy, w, h);
                    found(left_x - 8, y + block_h / 2 - 8, 16)
                })
                .collect(),
            banned: vec![found(bx, by, 40), found(300, 200, 40)],
        }
    }

    fn light_first_tab(img: &mut RgbaImage, config: &RecognitionConfig) {
        let tab = &config.tab;
        fill(
            img,
            Rect::new(tab.tab1_x as i32, tab.y as i32, tab.w as i32, tab.h as i32),
            Rgba([220, 220, 220, 255]),
        );
    }

    /// The starting capture: first tab active, `count` thumbnails in the strip.
    fn screen_with_thumbnails(config: &RecognitionConfig, count: usize) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(1280, 720, BACKGROUND);
        light_first_tab(&mut img, config);
        draw_thumbnails(&mut img, config, count);
        img
    }

    /// The 5x5 board after the tab check: green projections, a green and a
    /// blue locked cell, first tab active.
    fn board_frame(config: &RecognitionConfig) -> RgbaImage {
        let (w, h) = (5, 5);
        let p = &config.projection;
        let green = Rgba([GREEN[0], GREEN[1], GREEN[2], 255]);
        let mut img = RgbaImage::from_pixel(1280, 720, Rgba([25, 25, 30, 255]));
        light_first_tab(&mut img, config);

        for (gx, &n) in X_PROJ.iter().enumerate() {
            let rect = x_figure_rect(&config.board, p, gx as i32, w, h);
            let extent = (p.init_gap + n as f64 * p.each_gap) as i32;
            let bottom = rect.y + rect.h;
            fill(&mut img, Rect::new(rect.x + 10, bottom - extent, rect.w - 20, extent), green);
        }
        for (gy, &n) in Y_PROJ.iter().enumerate() {
            let rect = y_figure_rect(&config.board, p, gy as i32, w, h);
            let extent = (p.init_gap + n as f64 * p.each_gap) as i32;
            let right = rect.x + rect.w;
            fill(&mut img, Rect::new(right - extent, rect.y + 10, extent, rect.h - 20), green);
        }

        let block = |gx: i32, gy: i32| {
            let (x, y) = board_to_lt(&config.board, gx, gy, w, h);
            Rect::new(x, y, config.board.block_w as i32, config.board.block_h as i32)
        };
        fill(&mut img, block(1, 1), green);
        fill(&mut img, block(3, 2), Rgba([BLUE[0], BLUE[1], BLUE[2], 255]));
        img
    }

    fn two_piece_session(config: &RecognitionConfig) -> MockController {
        MockController::new(vec![
            preview_frame(&config.piece, &[[0, 0], [1, 0]], GREEN),
            preview_frame(&config.piece, &[[0, 0]], LIME),
            board_frame(config),
        ])
    }

    #[test]
    fn test_no_thumbnails_gives_empty_record() {
        let config = RecognitionConfig::default();
        let screen = RgbaImage::from_pixel(1280, 720, BACKGROUND);
        let mut ctrl = MockController::new(vec![]);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let (detail, success) = run_recognition(screen, &mut ctrl, &mut stabilizer, &matcher, &config);

        assert!(!success);
        assert_eq!(detail, Some(BoardDescription::default().to_json().unwrap()));
        assert!(ctrl.events.is_empty());
    }

    #[test]
    fn test_full_board_recognition() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = two_piece_session(&config);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let recognition = recognize(screen, &mut ctrl, &mut stabilizer, &matcher, &config).unwrap();
        let board = recognition.board().unwrap();

        assert_eq!((board.width, board.height), (5, 5));
        assert_eq!(board.puzzles.len(), 2);
        assert_eq!(board.puzzles[0].blocks, vec![[0, 0], [1, 0]]);

        assert_eq!(board.hues.len(), 1);
        assert_eq!(board.projections.len(), board.hues.len());
        assert_eq!(board.locked_blocks.len(), board.hues.len());

        assert_eq!(board.projections[0].x_proj, X_PROJ.to_vec());
        assert_eq!(board.projections[0].y_proj, Y_PROJ.to_vec());

        let locked: Vec<[i32; 2]> = board.locked_blocks[0].iter().map(|b| b.loc).collect();
        assert_eq!(locked, vec![[1, 1]]);
        let banned: Vec<[i32; 2]> = board.banned_blocks.iter().map(|b| b.loc).collect();
        assert_eq!(banned, vec![[4, 4]]);

        assert!(!ctrl.events.contains(&Event::Key(9)));
        assert!(ctrl.frames.is_empty());
    }

    #[test]
    fn test_close_piece_hues_share_one_family() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = two_piece_session(&config);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let recognition = recognize(screen, &mut ctrl, &mut stabilizer, &matcher, &config).unwrap();
        let board = recognition.board().unwrap();

        let piece_hues: Vec<i32> = board.puzzles.iter().map(|p| p.hue).collect();
        assert_ne!(piece_hues[0], piece_hues[1]);
        assert_eq!(board.hues, vec![circular_mean(&piece_hues).unwrap()]);
    }

    #[test]
    fn test_each_hue_family_gets_its_own_partition() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = MockController::new(vec![
            preview_frame(&config.piece, &[[0, 0], [1, 0]], GREEN),
            preview_frame(&config.piece, &[[0, 0]], BLUE),
            board_frame(&config),
        ]);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let recognition = recognize(screen, &mut ctrl, &mut stabilizer, &matcher, &config).unwrap();
        let board = recognition.board().unwrap();

        let piece_hues: Vec<i32> = board.puzzles.iter().map(|p| p.hue).collect();
        assert_eq!(board.hues, piece_hues);
        assert_eq!(board.hues.len(), 2);
        assert_eq!(board.projections.len(), 2);
        assert_eq!(board.locked_blocks.len(), 2);

        for p in &board.projections {
            assert!(p.fits(5, 5));
        }
        assert_eq!(board.projections[0].x_proj, X_PROJ.to_vec());
        assert_eq!(board.projections[0].y_proj, Y_PROJ.to_vec());
        // Figures are drawn in green only
        assert!(board.projections[1].x_proj.iter().all(|&n| n == 0));
        assert!(board.projections[1].y_proj.iter().all(|&n| n == 0));

        let locked: Vec<Vec<[i32; 2]>> = board
            .locked_blocks
            .iter()
            .map(|family| family.iter().map(|b| b.loc).collect())
            .collect();
        assert_eq!(locked, vec![vec![[1, 1]], vec![[3, 2]]]);
    }

    #[test]
    fn test_locations_lie_on_board() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = two_piece_session(&config);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let recognition = recognize(screen, &mut ctrl, &mut stabilizer, &matcher, &config).unwrap();
        let board = recognition.board().unwrap();

        for b in &board.banned_blocks {
            assert!(in_bounds(b.loc[0], b.loc[1], board.width, board.height));
        }
        for b in board.locked_blocks.iter().flatten() {
            assert!(in_bounds(b.loc[0], b.loc[1], board.width, board.height));
        }
        for p in &board.projections {
            assert!(p.fits(board.width, board.height));
        }
    }

    #[test]
    fn test_success_detail_round_trips() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = two_piece_session(&config);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let (detail, success) = run_recognition(screen, &mut ctrl, &mut stabilizer, &matcher, &config);

        assert!(success);
        let board: BoardDescription = serde_json::from_str(&detail.unwrap()).unwrap();
        assert_eq!((board.width, board.height), (5, 5));
    }

    #[test]
    fn test_missing_geometry_is_fatal() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 2);
        let mut ctrl = two_piece_session(&config);
        let mut stabilizer = MockStabilizer::default();
        let mut matcher = scene_matcher(&config, 5, 5);
        matcher.left.clear();

        let (detail, success) = run_recognition(screen, &mut ctrl, &mut stabilizer, &matcher, &config);

        assert_eq!((detail, success), (None, false));
    }

    #[test]
    fn test_refresh_capture_failure_is_fatal() {
        let config = RecognitionConfig::default();
        let screen = screen_with_thumbnails(&config, 1);
        let mut ctrl = MockController::new(vec![preview_frame(&config.piece, &[[0, 0]], GREEN)]);
        let mut stabilizer = MockStabilizer::default();
        let matcher = scene_matcher(&config, 5, 5);

        let result = recognize(screen, &mut ctrl, &mut stabilizer, &matcher, &config);

        assert!(result.is_err());
    }
}
