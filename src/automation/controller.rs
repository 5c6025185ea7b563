//! Game-side collaborators: screen capture, touch/key input and the
//! "wait until stable" task.
//!
//! Touch gestures are explicit step lists with per-step delays, played
//! through a `Controller`.

use anyhow::Result;
use image::RgbaImage;
use std::time::Duration;

use crate::vision::Rect;

/// Screen capture and input injection on the game.
pub trait Controller {
    /// Captures the current screen.
    fn screencap(&mut self) -> Result<RgbaImage>;

    fn touch_down(&mut self, x: i32, y: i32) -> Result<()>;

    fn touch_move(&mut self, x: i32, y: i32) -> Result<()>;

    /// Releases the touch. Must be harmless when no touch is held.
    fn touch_up(&mut self) -> Result<()>;

    fn click_key(&mut self, key_code: i32) -> Result<()>;

    /// Blocks for `ms` milliseconds.
    fn wait(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Runs the game's "wait until the region stops changing" task.
pub trait Stabilizer {
    fn wait_stable(&mut self, roi: Rect) -> Result<()>;
}

/// A stabilizer that returns immediately, for recorded sessions.
pub struct NoopStabilizer;

impl Stabilizer for NoopStabilizer {
    fn wait_stable(&mut self, _roi: Rect) -> Result<()> {
        Ok(())
    }
}

/// A single touch action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchStep {
    Down { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Up,
}

/// An ordered list of touch actions, each followed by a delay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gesture {
    steps: Vec<(TouchStep, u64)>,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn down(mut self, x: i32, y: i32, delay_ms: u64) -> Self {
        self.steps.push((TouchStep::Down { x, y }, delay_ms));
        self
    }

    pub fn move_to(mut self, x: i32, y: i32, delay_ms: u64) -> Self {
        self.steps.push((TouchStep::Move { x, y }, delay_ms));
        self
    }

    pub fn up(mut self, delay_ms: u64) -> Self {
        self.steps.push((TouchStep::Up, delay_ms));
        self
    }

    pub fn steps(&self) -> &[(TouchStep, u64)] {
        &self.steps
    }

    /// Plays every step in order, waiting after each one.
    pub fn play(&self, ctrl: &mut dyn Controller) -> Result<()> {
        for &(step, delay_ms) in &self.steps {
            match step {
                TouchStep::Down { x, y } => ctrl.touch_down(x, y)?,
                TouchStep::Move { x, y } => ctrl.touch_move(x, y)?,
                TouchStep::Up => ctrl.touch_up()?,
            }
            if delay_ms > 0 {
                ctrl.wait(delay_ms);
            }
        }
        Ok(())
    }
}

/// Holds a touch on the controller and releases it when dropped.
///
/// Every way out of a touch sequence, including early `?` returns, ends with
/// an `up`. Use `release` for the normal path to get the release delay.
pub struct TouchGuard<'a> {
    ctrl: &'a mut dyn Controller,
    held: bool,
}

impl<'a> TouchGuard<'a> {
    pub fn new(ctrl: &'a mut dyn Controller) -> Self {
        Self { ctrl, held: true }
    }

    /// The controller, for actions while the touch is held.
    pub fn controller(&mut self) -> &mut dyn Controller {
        &mut *self.ctrl
    }

    /// Releases the touch and waits `delay_ms`.
    pub fn release(mut self, delay_ms: u64) -> Result<()> {
        self.held = false;
        self.ctrl.touch_up()?;
        if delay_ms > 0 {
            self.ctrl.wait(delay_ms);
        }
        Ok(())
    }
}

impl Drop for TouchGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.ctrl.touch_up() {
                crate::log(&format!("Warning: Failed to release touch: {}", e));
            }
        }
    }
}
