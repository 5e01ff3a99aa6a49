use std::fs;
use std::path::Path;

use crate::models::Category;

/// Returns `None` when the file is absent, unreadable, or not a list of
/// category-shaped records (a legacy bare list of strings fails typed
/// deserialization and is treated the same as a missing file).
pub fn load_cache(path: &Path) -> Option<Vec<Category>> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<Vec<Category>>(&content).ok()
}

/// Last-successful-fetch semantics: the snapshot is written to a sibling
/// temp file and renamed into place, so an interrupted write never clobbers
/// the previous good copy. Failures are swallowed; the cache is best-effort.
pub fn save_cache(path: &Path, categories: &[Category]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = match serde_json::to_string_pretty(categories) {
        Ok(s) => s,
        Err(_) => return,
    };
    let tmp = path.with_extension("json.tmp");
    if fs::write(&tmp, json).is_ok() {
        let _ = fs::rename(&tmp, path);
    }
}
