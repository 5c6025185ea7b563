//! Puzzle Vision
//!
//! Runs one board recognition pass against recorded frames. The first frame
//! is the starting capture; later frames are served to the preview and tab
//! refresh captures in order.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use puzzle_vision::automation::{Controller, NoopStabilizer, ReplayController};
use puzzle_vision::config::{get_config, init_config};
use puzzle_vision::output::{append_history, write_detail, HistoryEntry};
use puzzle_vision::paths::AppDirs;
use puzzle_vision::recognition::{recognize, Recognition};
use puzzle_vision::vision::NccMatcher;
use puzzle_vision::{log, set_log_file};

/// Runs one puzzle board recognition pass against recorded frames.
#[derive(Parser, Debug, PartialEq)]
#[command(name = "puzzle-vision", version)]
struct Args {
    /// Directory of PNG frames, served in name order
    frames_dir: PathBuf,

    /// Directory holding the reference patches
    #[arg(long, value_name = "DIR", default_value_os_t = AppDirs::installed().templates())]
    templates: PathBuf,

    /// Recognition config file
    #[arg(long, value_name = "FILE", default_value_os_t = AppDirs::installed().config_file())]
    config: PathBuf,

    /// Where the board description is written
    #[arg(long, value_name = "FILE", default_value_os_t = AppDirs::installed().detail_file())]
    out: PathBuf,
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let dirs = AppDirs::installed();
    dirs.create().context("Failed to create output directories")?;
    set_log_file(Some(dirs.log_file()));

    init_config(&args.config);
    let config = get_config();

    let matcher = NccMatcher::load_dir(&args.templates, config.board.template_threshold)?;
    let mut ctrl = ReplayController::from_dir(&args.frames_dir)?;
    let img = ctrl.screencap().context("No starting frame")?;

    let result = recognize(img, &mut ctrl, &mut NoopStabilizer, &matcher, config);
    log(&format!(
        "Replay finished: {} frames unused, {} ms of waits skipped",
        ctrl.remaining(),
        ctrl.simulated_ms
    ));

    let history_path = dirs.history_file();
    let (entry, code) = match &result {
        Ok(recognition) => {
            let detail = recognition.detail().context("Failed to serialize board description")?;
            if let Recognition::Board(board) = recognition {
                write_detail(&args.out, board)?;
                log(&format!("Board description written to {}", args.out.display()));
            }
            println!("{}", detail);
            let entry = HistoryEntry::new(Local::now(), recognition.is_success(), recognition.board());
            (entry, ExitCode::SUCCESS)
        }
        Err(e) => {
            log(&format!("Error: Recognition failed: {:#}", e));
            (HistoryEntry::new(Local::now(), false, None), ExitCode::FAILURE)
        }
    };

    if let Err(e) = append_history(&history_path, &entry) {
        log(&format!("Warning: Failed to record history: {:#}", e));
    }
    Ok(code)
}
