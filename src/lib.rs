//! Puzzle board recognition
//!
//! Infers the full state of a grid puzzle board (size, banned and locked
//! cells, projection numbers, candidate pieces and their color families)
//! from screen captures of the game, driving the game's UI through a
//! pluggable controller where a preview is needed.

pub mod automation;
pub mod board;
pub mod config;
pub mod output;
pub mod paths;
pub mod puzzle;
pub mod recognition;
pub mod vision;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Active log file, if any. Set by the binary at startup.
static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Logs a message to the console and the active log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);

    let Ok(guard) = LOG_FILE.lock() else {
        return;
    };
    if let Some(path) = guard.as_ref() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

/// Activates (or with `None`, deactivates) the log file sink.
pub fn set_log_file(path: Option<PathBuf>) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = path;
    }
}
