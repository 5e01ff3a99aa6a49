use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{Category, Source, Station};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FeedGroup {
    name: String,
    #[serde(default)]
    feeds: Vec<String>,
}

/// The user's own feed categories, kept in one JSON file. Every successful
/// mutation persists before returning; this is the only file the user edits
/// through the UI. Share as `Arc<Mutex<FeedStore>>` so loader callbacks and
/// direct UI actions cannot interleave writes.
#[derive(Debug)]
pub struct FeedStore {
    path: PathBuf,
    groups: Vec<FeedGroup>,
}

impl FeedStore {
    /// Reads the store, seeding the default category set when the file is
    /// missing or structurally invalid.
    pub fn open(path: PathBuf) -> Self {
        let groups = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<FeedGroup>>(&content) {
                Ok(groups) => groups,
                Err(_) => default_groups(),
            },
            Err(_) => default_groups(),
        };
        let store = Self { path, groups };
        if !store.path.exists() {
            store.persist();
        }
        store
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        if self.groups.iter().any(|g| g.name == name) {
            return false;
        }
        self.groups.push(FeedGroup {
            name: name.to_string(),
            feeds: Vec::new(),
        });
        self.persist();
        true
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name != name);
        if self.groups.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Adds a feed URL, creating the category when absent. Returns false on
    /// a duplicate URL within the category.
    pub fn add_feed(&mut self, category: &str, url: &str) -> bool {
        match self.groups.iter_mut().find(|g| g.name == category) {
            Some(group) => {
                if group.feeds.iter().any(|f| f == url) {
                    return false;
                }
                group.feeds.push(url.to_string());
            }
            None => self.groups.push(FeedGroup {
                name: category.to_string(),
                feeds: vec![url.to_string()],
            }),
        }
        self.persist();
        true
    }

    pub fn remove_feed(&mut self, category: &str, url: &str) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.name == category) else {
            return false;
        };
        let before = group.feeds.len();
        group.feeds.retain(|f| f != url);
        if group.feeds.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Snapshot in the shared category shape, tagged `Source::Local`.
    pub fn categories(&self) -> Vec<Category> {
        self.groups
            .iter()
            .map(|g| Category {
                name: g.name.clone(),
                stations: g
                    .feeds
                    .iter()
                    .map(|url| Station {
                        name: url.clone(),
                        url: url.clone(),
                    })
                    .collect(),
                source: Source::Local,
            })
            .collect()
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&self.groups) {
            let _ = fs::write(&self.path, json);
        }
    }
}

fn default_groups() -> Vec<FeedGroup> {
    vec![
        FeedGroup {
            name: "أخبار".to_string(),
            feeds: vec![
                "https://www.aljazeera.net/aljazeerarss/rss.xml".to_string(),
                "https://feeds.bbci.co.uk/arabic/rss.xml".to_string(),
                "https://www.skynewsarabia.com/rss/all.xml".to_string(),
                "https://www.alarabiya.net/.mrss/ar.xml".to_string(),
            ],
        },
        FeedGroup {
            name: "تقنية".to_string(),
            feeds: vec![
                "https://www.tech-wd.com/feed/".to_string(),
                "https://www.unlimit-tech.com/feed/".to_string(),
            ],
        },
        FeedGroup {
            name: "رياضة".to_string(),
            feeds: vec!["https://www.kooora.com/rss/".to_string()],
        },
    ]
}
