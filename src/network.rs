use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Category, Source, Station};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire format of the remote directory: the station list is JSON
/// (`{"categories": [...]}`), the feed directory is an INI document whose
/// sections carry `Group` and `Url` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Ini,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Parse(String),
    #[error("no categories in payload")]
    Empty,
}

#[derive(Deserialize)]
struct StationListPayload {
    #[serde(default)]
    categories: Vec<Category>,
}

/// One bounded network GET, normalized into the shared category shape.
/// Every failure comes back as a `FetchError`; nothing panics past here.
pub async fn fetch_categories(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    format: PayloadFormat,
) -> Result<Vec<Category>, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }
    let body = response.text().await?;
    let body = body.trim_start_matches('\u{feff}');
    let categories = match format {
        PayloadFormat::Json => parse_station_json(body)?,
        PayloadFormat::Ini => parse_feed_directory(body),
    };
    if categories.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(categories)
}

fn parse_station_json(body: &str) -> Result<Vec<Category>, FetchError> {
    let payload: StationListPayload =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(payload
        .categories
        .into_iter()
        .map(|mut c| {
            c.source = Source::Remote;
            c
        })
        .collect())
}

/// Sections look like `[title]` with `Group = <category>` and
/// `Url = <feed>` keys. Sections lacking `Url` are skipped; the section
/// title names the entry. Category order follows first appearance.
fn parse_feed_directory(body: &str) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    let mut section = Section::default();

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            flush_section(&mut categories, std::mem::take(&mut section));
            section.title = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "Group" => section.group = Some(value.trim().to_string()),
                "Url" => section.url = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    flush_section(&mut categories, section);
    categories
}

#[derive(Default)]
struct Section {
    title: String,
    group: Option<String>,
    url: Option<String>,
}

fn flush_section(categories: &mut Vec<Category>, section: Section) {
    let Some(url) = section.url else { return };
    let group = section.group.unwrap_or_default();
    if group.is_empty() {
        return;
    }
    let name = if section.title.is_empty() {
        url.clone()
    } else {
        section.title
    };
    let idx = match categories.iter().position(|c| c.name == group) {
        Some(idx) => idx,
        None => {
            categories.push(Category {
                name: group,
                stations: Vec::new(),
                source: Source::Remote,
            });
            categories.len() - 1
        }
    };
    let category = &mut categories[idx];
    if !category.stations.iter().any(|s| s.url == url) {
        category.stations.push(Station { name, url });
    }
}
