//! On-disk layout of the tool, rooted next to the executable.
//!
//! ```text
//! <root>/puzzle_config.json
//! <root>/resources/template/puzzle/   reference patches
//! <root>/logs/puzzle_vision.log
//! <root>/output/board_detail.json
//! <root>/output/history.jsonl
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static INSTALL: OnceLock<AppDirs> = OnceLock::new();

/// Directory layout under one root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout next to the running executable, or under `.` when its location is unknown.
    pub fn installed() -> &'static AppDirs {
        INSTALL.get_or_init(|| {
            let root = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));
            AppDirs::new(root)
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn output(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join("resources").join("template").join("puzzle")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("puzzle_config.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs().join("puzzle_vision.log")
    }

    /// Last board description.
    pub fn detail_file(&self) -> PathBuf {
        self.output().join("board_detail.json")
    }

    /// One JSON line per pass.
    pub fn history_file(&self) -> PathBuf {
        self.output().join("history.jsonl")
    }

    /// Creates the directories the tool writes into.
    pub fn create(&self) -> io::Result<()> {
        for dir in [self.logs(), self.output()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_is_rooted() {
        let dirs = AppDirs::new("/opt/pv");
        assert_eq!(dirs.templates(), PathBuf::from("/opt/pv/resources/template/puzzle"));
        assert_eq!(dirs.config_file(), PathBuf::from("/opt/pv/puzzle_config.json"));
        assert_eq!(dirs.log_file(), PathBuf::from("/opt/pv/logs/puzzle_vision.log"));
        assert_eq!(dirs.detail_file(), PathBuf::from("/opt/pv/output/board_detail.json"));
        assert_eq!(dirs.history_file(), PathBuf::from("/opt/pv/output/history.jsonl"));
    }

    #[test]
    fn test_create_makes_writable_dirs() {
        let tmp = tempdir().unwrap();
        let dirs = AppDirs::new(tmp.path().join("install"));

        dirs.create().unwrap();
        dirs.create().unwrap();

        assert!(dirs.logs().is_dir());
        assert!(dirs.output().is_dir());
        assert!(!dirs.templates().exists());
    }

    #[test]
    fn test_installed_is_stable() {
        let a = AppDirs::installed();
        let b = AppDirs::installed();
        assert!(std::ptr::eq(a, b));
        assert!(a.root().is_absolute() || a.root() == Path::new("."));
    }
}
