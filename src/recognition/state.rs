//! Recognition state machine.
//!
//! The state machine sequences through: Puzzles → Tab → Geometry → Blocks →
//! Hues → Projections → Assemble. Stages never go back. Fatal conditions end
//! in `Error`, a board without pieces ends in `NoPuzzles`.

use image::RgbaImage;
use std::fmt;

use crate::automation::{Controller, Stabilizer};
use crate::board::{
    banned_blocks_on_board, decode_projection, estimate_board_size, find_banned_markers,
    find_locked_blocks, BannedBlockDescription, BoardDescription, LockedBlockDescription,
    LockedPool, ProjectionDescription, PuzzleDescription,
};
use crate::config::RecognitionConfig;
use crate::puzzle::extract_puzzles;
use crate::vision::{area_mean_hsv, distinguish_hues, hue_family_name, Rect, TemplateMatcher};

/// Recognition state machine states.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionState {
    /// Finding and previewing the pieces to place
    ExtractingPuzzles,
    /// Making sure the first tab is shown and refreshing the capture
    NormalizingTab,
    /// Estimating the board size
    EstimatingGeometry,
    /// Finding banned and locked blocks
    ClassifyingBlocks,
    /// Grouping piece hues into families
    DistinguishingHues,
    /// Decoding projections and locked blocks of each hue family
    DecodingHues,
    /// Building the board description
    Assembling,
    /// Board description ready
    Complete,
    /// No pieces to place; not an error
    NoPuzzles,
    /// Recognition failed
    Error(String),
}

impl fmt::Display for RecognitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionState::ExtractingPuzzles => write!(f, "Extracting puzzles"),
            RecognitionState::NormalizingTab => write!(f, "Normalizing tab"),
            RecognitionState::EstimatingGeometry => write!(f, "Estimating geometry"),
            RecognitionState::ClassifyingBlocks => write!(f, "Classifying blocks"),
            RecognitionState::DistinguishingHues => write!(f, "Distinguishing hues"),
            RecognitionState::DecodingHues => write!(f, "Decoding hues"),
            RecognitionState::Assembling => write!(f, "Assembling"),
            RecognitionState::Complete => write!(f, "Complete"),
            RecognitionState::NoPuzzles => write!(f, "No puzzles"),
            RecognitionState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl RecognitionState {
    /// Whether the state machine has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecognitionState::Complete | RecognitionState::NoPuzzles | RecognitionState::Error(_)
        )
    }
}

/// Recognition context holding the collaborators and intermediate results of
/// one pass.
pub struct RecognitionContext<'a> {
    /// Current state
    pub state: RecognitionState,
    ctrl: &'a mut dyn Controller,
    stabilizer: &'a mut dyn Stabilizer,
    matcher: &'a dyn TemplateMatcher,
    config: &'a RecognitionConfig,
    /// The capture every stage reads; replaced once by the tab check
    img: RgbaImage,
    puzzles: Vec<PuzzleDescription>,
    width: i32,
    height: i32,
    banned: Vec<BannedBlockDescription>,
    locked: LockedPool,
    hues: Vec<i32>,
    projections: Vec<ProjectionDescription>,
    locked_lists: Vec<Vec<LockedBlockDescription>>,
    board: BoardDescription,
}

impl<'a> RecognitionContext<'a> {
    pub fn new(
        img: RgbaImage,
        ctrl: &'a mut dyn Controller,
        stabilizer: &'a mut dyn Stabilizer,
        matcher: &'a dyn TemplateMatcher,
        config: &'a RecognitionConfig,
    ) -> Self {
        Self {
            state: RecognitionState::ExtractingPuzzles,
            ctrl,
            stabilizer,
            matcher,
            config,
            img,
            puzzles: Vec::new(),
            width: 0,
            height: 0,
            banned: Vec::new(),
            locked: LockedPool::default(),
            hues: Vec::new(),
            projections: Vec::new(),
            locked_lists: Vec::new(),
            board: BoardDescription::default(),
        }
    }

    /// Advances the state machine by one stage.
    ///
    /// Returns `true` while there are stages left to run.
    pub fn step(&mut self) -> bool {
        crate::log(&format!("Recognition: {}", self.state));

        match &self.state {
            RecognitionState::ExtractingPuzzles => {
                self.puzzles = extract_puzzles(&self.img, &mut *self.ctrl, &mut *self.stabilizer, self.config);
                if self.puzzles.is_empty() {
                    crate::log("No puzzles detected or invalid puzzles");
                    self.state = RecognitionState::NoPuzzles;
                    return false;
                }
                crate::log(&format!("Found {} puzzles", self.puzzles.len()));
                self.state = RecognitionState::NormalizingTab;
                true
            }

            RecognitionState::NormalizingTab => {
                self.ensure_first_tab();
                match self.ctrl.screencap() {
                    Ok(img) => {
                        self.img = img;
                        self.state = RecognitionState::EstimatingGeometry;
                        true
                    }
                    Err(e) => self.fail(format!("Failed to capture image: {}", e)),
                }
            }

            RecognitionState::EstimatingGeometry => {
                let (width, height) = match estimate_board_size(&self.img, self.matcher, self.config) {
                    Ok(size) => size,
                    Err(e) => return self.fail(format!("Board size estimation failed: {}", e)),
                };
                if width == 0 || height == 0 {
                    return self.fail(format!(
                        "Failed to determine board size (got {}x{})",
                        width, height
                    ));
                }
                crate::log(&format!("Determined board size: {}x{}", width, height));
                self.width = width;
                self.height = height;
                self.state = RecognitionState::ClassifyingBlocks;
                true
            }

            RecognitionState::ClassifyingBlocks => {
                let markers = match find_banned_markers(&self.img, self.matcher, self.config) {
                    Ok(markers) => markers,
                    Err(e) => return self.fail(format!("Banned block search failed: {}", e)),
                };
                self.banned = banned_blocks_on_board(self.config, self.width, self.height, &markers);
                crate::log(&format!(
                    "Banned blocks: {} markers, {} on board",
                    markers.len(),
                    self.banned.len()
                ));

                let locked = find_locked_blocks(&self.img, self.config, self.width, self.height);
                crate::log(&format!("Locked blocks: {}", locked.len()));
                self.locked = LockedPool::new(locked);

                self.state = RecognitionState::DistinguishingHues;
                true
            }

            RecognitionState::DistinguishingHues => {
                let tolerance = self.config.hue.cluster_tolerance;
                let piece_hues: Vec<i32> = self.puzzles.iter().map(|p| p.hue).collect();
                self.hues = distinguish_hues(&piece_hues, tolerance);
                for &hue in &self.hues {
                    crate::log(&format!(
                        "Hue family {} ({})",
                        hue,
                        hue_family_name(hue, tolerance).unwrap_or("unknown")
                    ));
                }
                self.state = RecognitionState::DecodingHues;
                true
            }

            RecognitionState::DecodingHues => {
                let tolerance = self.config.hue.cluster_tolerance;
                for hue in self.hues.clone() {
                    let projection = decode_projection(&self.img, self.config, self.width, self.height, hue);
                    if !projection.fits(self.width, self.height) {
                        return self.fail(format!(
                            "Projection of hue {} is {}x{}, board is {}x{}",
                            hue,
                            projection.x_proj.len(),
                            projection.y_proj.len(),
                            self.width,
                            self.height
                        ));
                    }
                    crate::log(&format!(
                        "Hue {}: X projections {:?}, Y projections {:?}",
                        hue, projection.x_proj, projection.y_proj
                    ));

                    let (claimed, rest) = std::mem::take(&mut self.locked).claim(hue, tolerance);
                    self.locked = rest;
                    crate::log(&format!("Hue {}: {} locked blocks", hue, claimed.len()));

                    self.projections.push(projection);
                    self.locked_lists.push(claimed);
                }
                if !self.locked.is_empty() {
                    crate::log(&format!(
                        "Warning: {} locked blocks match no piece hue",
                        self.locked.len()
                    ));
                }
                self.state = RecognitionState::Assembling;
                true
            }

            RecognitionState::Assembling => {
                self.board = BoardDescription {
                    width: self.width,
                    height: self.height,
                    projections: std::mem::take(&mut self.projections),
                    banned_blocks: std::mem::take(&mut self.banned),
                    locked_blocks: std::mem::take(&mut self.locked_lists),
                    puzzles: std::mem::take(&mut self.puzzles),
                    hues: std::mem::take(&mut self.hues),
                };
                crate::log(&format!(
                    "Board description: {}x{}, {} hues, {} puzzles",
                    self.board.width,
                    self.board.height,
                    self.board.hues.len(),
                    self.board.puzzles.len()
                ));
                self.state = RecognitionState::Complete;
                false
            }

            RecognitionState::Complete | RecognitionState::NoPuzzles | RecognitionState::Error(_) => {
                false
            }
        }
    }

    /// Runs stages until the state machine stops.
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// Takes the assembled board. Empty unless the state is `Complete`.
    pub fn take_board(&mut self) -> BoardDescription {
        std::mem::take(&mut self.board)
    }

    fn fail(&mut self, msg: String) -> bool {
        crate::log(&format!("Error: {}", msg));
        self.state = RecognitionState::Error(msg);
        false
    }

    /// Switches to the first tab when the second one looks active.
    ///
    /// The active tab is the brighter one.
    fn ensure_first_tab(&mut self) {
        let tab = &self.config.tab;
        let tab1 = Rect::new(tab.tab1_x as i32, tab.y as i32, tab.w as i32, tab.h as i32);
        let tab2 = Rect::new(tab.tab2_x as i32, tab.y as i32, tab.w as i32, tab.h as i32);
        let val1 = area_mean_hsv(&self.img, tab1).v;
        let val2 = area_mean_hsv(&self.img, tab2).v;
        crate::log(&format!("Tab brightness: tab1 {:.3}, tab2 {:.3}", val1, val2));

        if val1 <= val2 {
            crate::log("Tab 2 detected as active, switching back to tab 1");
            if let Err(e) = self.ctrl.click_key(tab.switch_key) {
                crate::log(&format!("Warning: Failed to send tab key: {}", e));
            }
            self.ctrl.wait(tab.switch_wait_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::{Event, MockController, MockStabilizer};
    use crate::vision::{Template, TemplateMatch};
    use anyhow::Result;
    use image::Rgba;

    struct NoMatches;

    impl TemplateMatcher for NoMatches {
        fn match_all(
            &self,
            _img: &RgbaImage,
            _template: Template,
            _roi: Rect,
            _max_matches: usize,
        ) -> Result<Vec<TemplateMatch>> {
            Ok(Vec::new())
        }
    }

    fn tab_frame(tab1: u8, tab2: u8) -> RgbaImage {
        let config = RecognitionConfig::default();
        let tab = &config.tab;
        let mut img = RgbaImage::from_pixel(1280, 720, Rgba([20, 20, 20, 255]));
        for (x0, level) in [(tab.tab1_x as u32, tab1), (tab.tab2_x as u32, tab2)] {
            for y in tab.y as u32..(tab.y + tab.h) as u32 {
                for x in x0..x0 + tab.w as u32 {
                    img.put_pixel(x, y, Rgba([level, level, level, 255]));
                }
            }
        }
        img
    }

    fn context_at<'a>(
        state: RecognitionState,
        img: RgbaImage,
        ctrl: &'a mut MockController,
        stabilizer: &'a mut MockStabilizer,
        config: &'a RecognitionConfig,
    ) -> RecognitionContext<'a> {
        let mut ctx = RecognitionContext::new(img, ctrl, stabilizer, &NoMatches, config);
        ctx.state = state;
        ctx
    }

    #[test]
    fn test_active_first_tab_needs_no_switch() {
        let config = RecognitionConfig::default();
        let mut ctrl = MockController::new(vec![tab_frame(200, 80)]);
        let mut stabilizer = MockStabilizer::default();
        let mut ctx = context_at(
            RecognitionState::NormalizingTab,
            tab_frame(200, 80),
            &mut ctrl,
            &mut stabilizer,
            &config,
        );

        assert!(ctx.step());
        assert_eq!(ctx.state, RecognitionState::EstimatingGeometry);
        drop(ctx);
        assert_eq!(ctrl.events, vec![Event::Screencap]);
    }

    #[test]
    fn test_second_tab_is_switched_back() {
        let config = RecognitionConfig::default();
        let mut ctrl = MockController::new(vec![tab_frame(200, 80)]);
        let mut stabilizer = MockStabilizer::default();
        let mut ctx = context_at(
            RecognitionState::NormalizingTab,
            tab_frame(80, 200),
            &mut ctrl,
            &mut stabilizer,
            &config,
        );

        assert!(ctx.step());
        drop(ctx);
        assert_eq!(
            ctrl.events,
            vec![Event::Key(9), Event::Wait(500), Event::Screencap]
        );
    }

    #[test]
    fn test_refresh_capture_failure_is_fatal() {
        let config = RecognitionConfig::default();
        let mut ctrl = MockController::new(vec![]);
        let mut stabilizer = MockStabilizer::default();
        let mut ctx = context_at(
            RecognitionState::NormalizingTab,
            tab_frame(200, 80),
            &mut ctrl,
            &mut stabilizer,
            &config,
        );

        assert!(!ctx.step());
        assert!(matches!(ctx.state, RecognitionState::Error(_)));
    }

    #[test]
    fn test_missing_markers_fail_geometry() {
        let config = RecognitionConfig::default();
        let mut ctrl = MockController::new(vec![]);
        let mut stabilizer = MockStabilizer::default();
        let mut ctx = context_at(
            RecognitionState::EstimatingGeometry,
            RgbaImage::new(1280, 720),
            &mut ctrl,
            &mut stabilizer,
            &config,
        );

        ctx.run();
        assert!(matches!(ctx.state, RecognitionState::Error(_)));
    }

    #[test]
    fn test_terminal_states_do_not_advance() {
        let config = RecognitionConfig::default();
        let mut ctrl = MockController::new(vec![]);
        let mut stabilizer = MockStabilizer::default();
        for state in [
            RecognitionState::Complete,
            RecognitionState::NoPuzzles,
            RecognitionState::Error("x".to_string()),
        ] {
            assert!(state.is_terminal());
            let mut ctx = context_at(
                state.clone(),
                RgbaImage::new(4, 4),
                &mut ctrl,
                &mut stabilizer,
                &config,
            );
            assert!(!ctx.step());
            assert_eq!(ctx.state, state);
        }
        assert!(ctrl.events.is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RecognitionState::DecodingHues.to_string(), "Decoding hues");
        assert_eq!(
            RecognitionState::Error("no board".to_string()).to_string(),
            "Error: no board"
        );
    }
}
