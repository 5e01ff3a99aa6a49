use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;

// Stream addresses are user data; they never land in the log file.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("url regex"));

/// Append-only file logger. Cheap to clone; every component that logs gets
/// its own handle instead of reaching for a process-wide path.
#[derive(Debug, Clone)]
pub struct Logger {
    path: PathBuf,
}

impl Logger {
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn log_line(&self, line: &str) {
        let censored = URL_PATTERN.replace_all(line, "xxx");
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "[{}] {}", timestamp(), censored);
        }
    }

    pub fn log_error(&self, prefix: &str, e: &dyn std::error::Error) {
        self.log_line(&format!("ERROR: {}: {}", prefix, e));
    }
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
