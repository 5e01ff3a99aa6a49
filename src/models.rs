use serde::{Deserialize, Serialize};

/// Which store contributed a category: the remote authoritative list or the
/// user's local edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub url: String,
}

/// A named group of stations or feeds. Feed-directory entries are normalized
/// into the same shape: the feed URL becomes `Station::url`, the section
/// title (or the URL itself) becomes `Station::name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub source: Source,
}

/// One load cycle's outcome. `degraded` means the live fetch failed and the
/// cache was substituted; an empty `categories` alongside `degraded` is fatal
/// for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub categories: Vec<Category>,
    pub degraded: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub check_for_updates: bool,
    #[serde(default)]
    pub play_on_startup: bool,
    #[serde(default = "default_theme")]
    pub theme: String, // "dark" | "light"
    #[serde(default)]
    pub large_font: bool,
    #[serde(default = "default_volume")]
    pub volume: i32, // 0..=100, clamped by the UI slider
    #[serde(default)]
    pub last_station_name: Option<String>,
    #[serde(default = "default_true")]
    pub sound_effects: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_for_updates: true,
            play_on_startup: false,
            theme: default_theme(),
            large_font: false,
            volume: default_volume(),
            last_station_name: None,
            sound_effects: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_volume() -> i32 {
    40
}
