//! Whole-collection key/value storage
//!
//! Settings are persisted as five independent JSON values. There is no
//! per-record update: every write replaces the whole collection, and
//! concurrent writers race with last-write-wins.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::{StorageError, StorageResult};

/// The persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Providers,
    Models,
    Rules,
    GeneralSettings,
    DefaultRulesModified,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::Providers,
        StorageKey::Models,
        StorageKey::Rules,
        StorageKey::GeneralSettings,
        StorageKey::DefaultRulesModified,
    ];

    /// Name of the key in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Providers => "providers",
            StorageKey::Models => "models",
            StorageKey::Rules => "rules",
            StorageKey::GeneralSettings => "generalSettings",
            StorageKey::DefaultRulesModified => "defaultRulesModified",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get/set contract of the settings backend
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Read a whole collection, `None` if it was never written
    async fn get(&self, key: StorageKey) -> StorageResult<Option<Value>>;

    /// Replace a whole collection
    async fn set(&self, key: StorageKey, value: Value) -> StorageResult<()>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<StorageKey, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStorage for MemoryStorage {
    async fn get(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: Value) -> StorageResult<()> {
        trace!(%key, "memory storage write");
        self.values.write().await.insert(key, value);
        Ok(())
    }
}

/// One `<key>.json` file per collection under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.llmconf/settings`
    pub fn with_default_path() -> StorageResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            StorageError::PathResolution("could not determine home directory".to_string())
        })?;
        Ok(Self::new(home.join(".llmconf").join("settings")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl SettingsStorage for JsonFileStorage {
    async fn get(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let value = serde_json::from_str(&content)
            .map_err(|e| StorageError::parse(key.as_str(), e.to_string()))?;
        debug!(%key, path = ?path, "loaded collection");
        Ok(Some(value))
    }

    async fn set(&self, key: StorageKey, value: Value) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(self.dir.clone(), e))?;

        let content = serde_json::to_string_pretty(&value)
            .map_err(|e| StorageError::parse(key.as_str(), e.to_string()))?;

        // Write then rename so readers never see a half-written file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StorageError::io(tmp.clone(), e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::io(path.clone(), e))?;

        debug!(%key, path = ?path, "stored collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_key_names() {
        let names: Vec<_> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "providers",
                "models",
                "rules",
                "generalSettings",
                "defaultRulesModified"
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_storage_get_set() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(StorageKey::Rules).await.unwrap(), None);

        storage.set(StorageKey::Rules, json!([1, 2])).await.unwrap();
        storage.set(StorageKey::Rules, json!([3])).await.unwrap();
        assert_eq!(
            storage.get(StorageKey::Rules).await.unwrap(),
            Some(json!([3]))
        );
    }

    #[tokio::test]
    async fn test_json_file_storage_creates_directory() {
        let temp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp.path().join("nested/settings"));

        assert_eq!(storage.get(StorageKey::Models).await.unwrap(), None);
        storage
            .set(StorageKey::DefaultRulesModified, json!(true))
            .await
            .unwrap();

        assert!(storage.path_for(StorageKey::DefaultRulesModified).exists());
        assert_eq!(
            storage.get(StorageKey::DefaultRulesModified).await.unwrap(),
            Some(json!(true))
        );
    }

    #[tokio::test]
    async fn test_json_file_storage_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp.path());
        std::fs::write(storage.path_for(StorageKey::Providers), "{not json").unwrap();

        let err = storage.get(StorageKey::Providers).await.unwrap_err();
        assert!(matches!(err, StorageError::Parse { ref key, .. } if key == "providers"));
    }
}
