use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub const KEY_TOKEN: &str = "user_token";
pub const KEY_EMAIL: &str = "user_email";

/// File-backed string key-value store for session data, one JSON object
/// per file. Reads go back to disk every time so a handle stays cheap to
/// clone into background tasks.
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(Self::new(config_dir.join("twinkletalk").join("session.json")))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    /// Remove a key and persist. Removing an absent key succeeds.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.remove(key);
        self.write_all(&entries)
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("session.json"));

        assert_eq!(storage.get(KEY_TOKEN), None);

        storage.set(KEY_TOKEN, "token-123").unwrap();
        storage.set(KEY_EMAIL, "user@example.com").unwrap();
        assert_eq!(storage.get(KEY_TOKEN), Some("token-123".to_string()));
        assert_eq!(storage.get(KEY_EMAIL), Some("user@example.com".to_string()));

        storage.remove(KEY_TOKEN).unwrap();
        assert_eq!(storage.get(KEY_TOKEN), None);
        assert_eq!(storage.get(KEY_EMAIL), Some("user@example.com".to_string()));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        Storage::new(path.clone()).set(KEY_TOKEN, "token-123").unwrap();

        let reopened = Storage::new(path);
        assert_eq!(reopened.get(KEY_TOKEN), Some("token-123".to_string()));
    }

    #[test]
    fn removing_absent_key_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("session.json"));

        storage.remove("never-set").unwrap();
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let storage = Storage::new(path);
        assert_eq!(storage.get(KEY_TOKEN), None);
    }
}
