//! Recognition output files.
//!
//! The detail file holds the last board description as pretty JSON. The
//! history file gets one JSON line per pass, opened in append mode for each
//! write so that earlier passes survive a crash.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::board::BoardDescription;

/// Summary of one recognition pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub success: bool,
    pub width: i32,
    pub height: i32,
    pub hues: Vec<i32>,
    pub puzzle_count: usize,
}

impl HistoryEntry {
    /// Builds an entry for a pass that ended at `at`. `board` is `None` when
    /// the pass failed or found no pieces.
    pub fn new(at: DateTime<Local>, success: bool, board: Option<&BoardDescription>) -> Self {
        Self {
            timestamp: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            success,
            width: board.map_or(0, |b| b.width),
            height: board.map_or(0, |b| b.height),
            hues: board.map(|b| b.hues.clone()).unwrap_or_default(),
            puzzle_count: board.map_or(0, |b| b.puzzles.len()),
        }
    }
}

/// Writes the board description as pretty JSON, replacing the file.
pub fn write_detail(path: &Path, board: &BoardDescription) -> Result<()> {
    let json = serde_json::to_string_pretty(board).context("Failed to serialize board description")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Appends one entry to the history file.
pub fn append_history(path: &Path, entry: &HistoryEntry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open history for append")?;

    let line = serde_json::to_string(entry).context("Failed to serialize history entry")?;
    writeln!(file, "{}", line).context("Failed to write history entry")?;
    Ok(())
}
