use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::models::Settings;

pub const STATIONS_URL: &str = "https://aswatalweb.com/radio/radio.json";
pub const FEEDS_URL: &str = "https://aswatalweb.com/radio/feeds.ini";
pub const UPDATE_URL: &str =
    "https://raw.githubusercontent.com/errachedy-crypto/playe-radio-aswatalweb/main/version.json";
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-user file locations, built once at startup and handed to each
/// component that touches disk.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Paths {
    pub fn from_project_dirs() -> Self {
        match ProjectDirs::from("com", "aswatalweb", "Amwaj") {
            Some(dirs) => Self::new(dirs.config_dir().to_path_buf(), dirs.cache_dir().to_path_buf()),
            None => Self::new(PathBuf::from("."), PathBuf::from(".")),
        }
    }

    pub fn new(config_dir: PathBuf, cache_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&config_dir);
        let _ = fs::create_dir_all(&cache_dir);
        Self { config_dir, cache_dir }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub fn feeds_file(&self) -> PathBuf {
        self.config_dir.join("rss_feeds.json")
    }

    pub fn cache_file(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    pub fn log_file(&self) -> PathBuf {
        self.config_dir.join("amwaj.log")
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.config_dir.join("recordings")
    }
}

/// Missing file, unreadable file, or unparsable JSON all mean defaults.
/// Missing keys in an otherwise valid file are filled from the defaults.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(path, json)
}
