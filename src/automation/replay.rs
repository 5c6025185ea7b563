//! Offline controller serving recorded frames.
//!
//! Frames are PNG files in one directory, served in file name order. Input
//! calls are only logged and waits return at once, so a whole recognition
//! pass can be replayed from a capture session without the game running.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use super::controller::Controller;

pub struct ReplayController {
    frames: VecDeque<PathBuf>,
    /// Total time the game would have waited, in milliseconds
    pub simulated_ms: u64,
}

impl ReplayController {
    /// Collects the PNG frames of `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut frames: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        frames.sort();

        crate::log(&format!(
            "Replay: {} frames in {}",
            frames.len(),
            dir.display()
        ));
        Ok(Self {
            frames: frames.into(),
            simulated_ms: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Controller for ReplayController {
    fn screencap(&mut self) -> Result<RgbaImage> {
        let path = self
            .frames
            .pop_front()
            .ok_or_else(|| anyhow!("No more recorded frames"))?;
        crate::log(&format!("Replay: serving {}", path.display()));
        let img = image::open(&path)
            .with_context(|| format!("Failed to open frame {}", path.display()))?
            .into_rgba8();
        Ok(img)
    }

    fn touch_down(&mut self, x: i32, y: i32) -> Result<()> {
        crate::log(&format!("Replay: touch down at ({}, {})", x, y));
        Ok(())
    }

    fn touch_move(&mut self, x: i32, y: i32) -> Result<()> {
        crate::log(&format!("Replay: touch move to ({}, {})", x, y));
        Ok(())
    }

    fn touch_up(&mut self) -> Result<()> {
        crate::log("Replay: touch up");
        Ok(())
    }

    fn click_key(&mut self, key_code: i32) -> Result<()> {
        crate::log(&format!("Replay: key {}", key_code));
        Ok(())
    }

    fn wait(&mut self, ms: u64) {
        self.simulated_ms += ms;
    }
}
