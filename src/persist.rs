use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Saved working state for one screen: the full element JSON plus the save
/// time in unix milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedScreen {
    pub json: String,
    pub timestamp: u64,
}

/// Per-screen save files under one directory, keyed by screen number.
///
/// Loads are forgiving: a missing or unreadable record means "no saved state"
/// and the caller falls back to the archive payload. Saves are strict and
/// surface their error, since losing an edit silently is worse than a toast.
#[derive(Debug, Clone)]
pub struct ScreenStateStore {
    root: PathBuf,
}

impl ScreenStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, screen_number: u32) -> PathBuf {
        self.root.join(format!("screen_{screen_number}.json"))
    }

    pub fn load(&self, screen_number: u32) -> Option<SavedScreen> {
        let path = self.record_path(screen_number);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                eprintln!("[persist] Failed to read {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                eprintln!("[persist] Corrupt record {}: {err}", path.display());
                None
            }
        }
    }

    pub fn save(&self, screen_number: u32, json: &str) -> Result<SavedScreen> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create state dir {}", self.root.display()))?;
        let record = SavedScreen { json: json.to_string(), timestamp: unix_millis() };
        let path = self.record_path(screen_number);
        let encoded = serde_json::to_vec(&record).context("Failed to encode screen record")?;
        fs::write(&path, encoded)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(record)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = ScreenStateStore::new(dir.path().join("state"));
        let saved = store.save(3, r#"[{"text":"a"}]"#).expect("save");
        assert!(saved.timestamp > 0);

        let loaded = store.load(3).expect("record");
        assert_eq!(loaded, saved);
    }

    #[test]
    fn missing_record_loads_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = ScreenStateStore::new(dir.path());
        assert!(store.load(7).is_none());
    }

    #[test]
    fn corrupt_record_loads_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = ScreenStateStore::new(dir.path());
        fs::create_dir_all(dir.path()).expect("mkdir");
        fs::write(dir.path().join("screen_1.json"), b"{broken").expect("write");
        assert!(store.load(1).is_none());
    }

    #[test]
    fn records_are_isolated_per_screen() {
        let dir = tempdir().expect("tempdir");
        let store = ScreenStateStore::new(dir.path());
        store.save(1, "[]").expect("save 1");
        store.save(2, r#"[{"text":"b"}]"#).expect("save 2");
        assert_eq!(store.load(1).expect("load").json, "[]");
        assert_eq!(store.load(2).expect("load").json, r#"[{"text":"b"}]"#);
    }
}
