//! Local capture artifacts and their file naming.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const LOCAL_PREFIX: &str = "screenshot_";
pub const LOCAL_EXTENSION: &str = "png";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^screenshot_(\d{2,})_(\d{8}_\d{6})_(\d{3})(?:_(\d+))?\.png$")
            .expect("local artifact pattern is valid")
    })
}

/// A capture stored on local disk.
///
/// Named `screenshot_{index:02}_{YYYYmmdd_HHMMSS_mmm}.png`; when two captures land
/// in the same millisecond the later one gets a `_{n}` suffix before the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub rotation_index: usize,
    pub captured_at: NaiveDateTime,
    pub duplicate: u32,
}

impl LocalArtifact {
    pub fn file_name_for(rotation_index: usize, captured_at: NaiveDateTime, duplicate: u32) -> String {
        let stamp = captured_at.format("%Y%m%d_%H%M%S");
        let millis = captured_at.nanosecond() / 1_000_000 % 1000;
        if duplicate == 0 {
            format!(
                "{}{:02}_{}_{:03}.{}",
                LOCAL_PREFIX, rotation_index, stamp, millis, LOCAL_EXTENSION
            )
        } else {
            format!(
                "{}{:02}_{}_{:03}_{}.{}",
                LOCAL_PREFIX, rotation_index, stamp, millis, duplicate, LOCAL_EXTENSION
            )
        }
    }

    /// Returns `None` for names not produced by `file_name_for`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let caps = name_pattern().captures(file_name)?;

        let rotation_index = caps.get(1)?.as_str().parse().ok()?;
        let seconds = NaiveDateTime::parse_from_str(caps.get(2)?.as_str(), "%Y%m%d_%H%M%S").ok()?;
        let millis: i64 = caps.get(3)?.as_str().parse().ok()?;
        let captured_at = seconds.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
        let duplicate = match caps.get(4) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };

        Some(Self {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            rotation_index,
            captured_at,
            duplicate,
        })
    }

    /// Creation order: capture time, then duplicate suffix, then name.
    pub fn creation_key(&self) -> (NaiveDateTime, u32, &str) {
        (self.captured_at, self.duplicate, self.file_name.as_str())
    }
}
