use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

type SettingsDocument = HashMap<String, serde_json::Value>;

/// On-disk cache entry. Entries fetched from another gateway are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSettings {
    url: String,
    fetched_at: i64,
    document: SettingsDocument,
}

fn get_cache_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".cache").join("quotacalc").join("settings.json"))
}

fn read_entry(url: &str) -> Option<CachedSettings> {
    let content = fs::read_to_string(get_cache_path()?).ok()?;
    let entry: CachedSettings = serde_json::from_str(&content).ok()?;
    (entry.url == url).then_some(entry)
}

/// Cached document for `url`, regardless of age
pub(super) fn load_cached_document(url: &str) -> Option<SettingsDocument> {
    read_entry(url).map(|entry| entry.document)
}

/// Cached document for `url` together with its age, if younger than `ttl`
pub(super) fn load_cached_document_if_fresh(
    url: &str,
    ttl: Duration,
) -> Option<(SettingsDocument, Duration)> {
    let entry = read_entry(url)?;
    let age_secs = Utc::now().timestamp().checked_sub(entry.fetched_at)?;
    let age = Duration::from_secs(u64::try_from(age_secs).ok()?);
    (age <= ttl).then_some((entry.document, age))
}

/// Best effort; a failed write only costs a refetch next time
pub(super) fn save_cached_document(url: &str, document: &SettingsDocument) {
    let Some(path) = get_cache_path() else {
        return;
    };
    let entry = CachedSettings {
        url: url.to_string(),
        fetched_at: Utc::now().timestamp(),
        document: document.clone(),
    };
    let Ok(content) = serde_json::to_string(&entry) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    if fs::write(&tmp, content).is_ok() {
        let _ = fs::rename(&tmp, &path);
    }
}
