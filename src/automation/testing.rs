//! Recording collaborators for tests.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::collections::VecDeque;

use super::controller::{Controller, Stabilizer};
use crate::vision::Rect;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Screencap,
    Down(i32, i32),
    Move(i32, i32),
    Up,
    Key(i32),
    Wait(u64),
}

/// Serves queued frames and records every call. Capturing with an empty
/// queue fails.
pub struct MockController {
    pub frames: VecDeque<RgbaImage>,
    pub events: Vec<Event>,
}

impl MockController {
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames: frames.into(),
            events: Vec::new(),
        }
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl Controller for MockController {
    fn screencap(&mut self) -> Result<RgbaImage> {
        self.events.push(Event::Screencap);
        self.frames
            .pop_front()
            .ok_or_else(|| anyhow!("No frame available"))
    }

    fn touch_down(&mut self, x: i32, y: i32) -> Result<()> {
        self.events.push(Event::Down(x, y));
        Ok(())
    }

    fn touch_move(&mut self, x: i32, y: i32) -> Result<()> {
        self.events.push(Event::Move(x, y));
        Ok(())
    }

    fn touch_up(&mut self) -> Result<()> {
        self.events.push(Event::Up);
        Ok(())
    }

    fn click_key(&mut self, key_code: i32) -> Result<()> {
        self.events.push(Event::Key(key_code));
        Ok(())
    }

    fn wait(&mut self, ms: u64) {
        self.events.push(Event::Wait(ms));
    }
}

#[derive(Default)]
pub struct MockStabilizer {
    pub calls: Vec<Rect>,
    pub fail: bool,
}

impl Stabilizer for MockStabilizer {
    fn wait_stable(&mut self, roi: Rect) -> Result<()> {
        self.calls.push(roi);
        if self.fail {
            return Err(anyhow!("Stabilization task failed"));
        }
        Ok(())
    }
}
