use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionPayload {
    latest_version: String,
    download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub latest_version: String,
    pub download_url: String,
}

/// Compare two dotted version strings (e.g. "0.1.6" vs "v0.1.7").
pub fn compare_versions(current: &str, latest: &str) -> Ordering {
    let clean_current = current.trim_start_matches('v');
    let clean_latest = latest.trim_start_matches('v');

    let current_parts: Vec<u32> = clean_current.split('.').filter_map(|s| s.parse().ok()).collect();
    let latest_parts: Vec<u32> = clean_latest.split('.').filter_map(|s| s.parse().ok()).collect();

    for (c, l) in current_parts.iter().zip(latest_parts.iter()) {
        match c.cmp(l) {
            Ordering::Less => return Ordering::Less,
            Ordering::Greater => return Ordering::Greater,
            Ordering::Equal => continue,
        }
    }

    current_parts.len().cmp(&latest_parts.len())
}

/// Fetches the version endpoint and reports an update only for a strictly
/// greater remote version. The caller shows a notification with the link;
/// nothing is ever downloaded automatically.
pub async fn check_for_updates(
    client: &reqwest::Client,
    update_url: &str,
    current_version: &str,
) -> Result<Option<UpdateInfo>, String> {
    let response = client
        .get(update_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| format!("update check failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("update endpoint returned HTTP {}", response.status()));
    }

    let payload: VersionPayload = response
        .json()
        .await
        .map_err(|e| format!("malformed version payload: {}", e))?;

    if compare_versions(current_version, &payload.latest_version) == Ordering::Less {
        Ok(Some(UpdateInfo {
            latest_version: payload.latest_version,
            download_url: payload.download_url,
        }))
    } else {
        Ok(None)
    }
}

/// Hands the download page to the default browser.
pub fn open_download_page(download_url: &str) -> Result<(), String> {
    webbrowser::open(download_url).map_err(|e| format!("failed to open download URL: {}", e))
}
