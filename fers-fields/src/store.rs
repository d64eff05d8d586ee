//! Persistence of saved field values.
//!
//! Values are keyed by `(scope, key)` where the scope names an options page
//! (or any other owner) and the key is a top-level field id. Every write
//! replaces the whole value; concurrent writers race and the last one wins.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::FieldValue;

/// Storage for whole field values.
#[async_trait]
pub trait ValueStore: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<FieldValue>>;

    async fn set(&self, scope: &str, key: &str, value: &FieldValue) -> Result<()>;

    /// Remove a value. Returns whether anything was stored.
    async fn delete(&self, scope: &str, key: &str) -> Result<bool>;
}

/// In-process store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<String, HashMap<String, FieldValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValueStore for MemoryStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<FieldValue>> {
        let scopes = self.scopes.read().await;
        Ok(scopes.get(scope).and_then(|s| s.get(key)).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: &FieldValue) -> Result<()> {
        let mut scopes = self.scopes.write().await;
        scopes
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, scope: &str, key: &str) -> Result<bool> {
        let mut scopes = self.scopes.write().await;
        Ok(scopes
            .get_mut(scope)
            .and_then(|s| s.remove(key))
            .is_some())
    }
}

/// One YAML file per value: `<root>/<scope>/<key>.yaml`.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    root: PathBuf,
}

impl YamlFileStore {
    /// Store under `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, scope: &str, key: &str) -> Result<PathBuf> {
        check_component(scope)?;
        check_component(key)?;
        Ok(self.root.join(scope).join(format!("{key}.yaml")))
    }
}

#[async_trait]
impl ValueStore for YamlFileStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<FieldValue>> {
        let path = self.value_path(scope, key)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_yaml_ng::from_str(&content)?;
        debug!(?path, "value loaded");
        Ok(Some(value))
    }

    async fn set(&self, scope: &str, key: &str, value: &FieldValue) -> Result<()> {
        let path = self.value_path(scope, key)?;
        let yaml = serde_yaml_ng::to_string(value)?;
        fs::create_dir_all(self.root.join(scope)).await?;
        atomic_write(&path, yaml.as_bytes()).await?;
        debug!(?path, "value written");
        Ok(())
    }

    async fn delete(&self, scope: &str, key: &str) -> Result<bool> {
        let path = self.value_path(scope, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(?path, "value deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Scopes and keys become path components; keep them to one plain name.
fn check_component(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("empty")
    } else if name.starts_with('.') {
        Some("starts with '.'")
    } else if name.contains(['/', '\\']) {
        Some("contains a path separator")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(FieldsError::InvalidIdentifier {
            id: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Row, SorterState};
    use tempfile::TempDir;

    fn links() -> FieldValue {
        let row: Row = [
            ("url".to_string(), FieldValue::from("a.com")),
            ("label".to_string(), FieldValue::from("A")),
        ]
        .into_iter()
        .collect();
        FieldValue::Rows(vec![row])
    }

    #[tokio::test]
    async fn memory_store_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("page", "links").await.unwrap(), None);

        store.set("page", "links", &links()).await.unwrap();
        assert_eq!(store.get("page", "links").await.unwrap(), Some(links()));
        assert_eq!(store.get("other", "links").await.unwrap(), None);

        assert!(store.delete("page", "links").await.unwrap());
        assert!(!store.delete("page", "links").await.unwrap());
    }

    #[tokio::test]
    async fn yaml_store_round_trips_values() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path().join("values"));

        store.set("page", "links", &links()).await.unwrap();
        let sorter = FieldValue::Sorter(SorterState {
            enabled: [("y".to_string(), "Y".to_string())].into_iter().collect(),
            disabled: [("x".to_string(), "X".to_string())].into_iter().collect(),
        });
        store.set("page", "modules", &sorter).await.unwrap();

        assert!(tmp.path().join("values/page/links.yaml").is_file());
        assert_eq!(store.get("page", "links").await.unwrap(), Some(links()));
        assert_eq!(store.get("page", "modules").await.unwrap(), Some(sorter));
    }

    #[tokio::test]
    async fn yaml_store_overwrites_whole_value() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());

        store.set("page", "links", &links()).await.unwrap();
        store
            .set("page", "links", &FieldValue::Rows(vec![]))
            .await
            .unwrap();
        assert_eq!(
            store.get("page", "links").await.unwrap(),
            Some(FieldValue::Rows(vec![]))
        );

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("page"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn yaml_store_missing_and_delete() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        assert_eq!(store.get("page", "nothing").await.unwrap(), None);
        assert!(!store.delete("page", "nothing").await.unwrap());

        store.set("page", "title", &FieldValue::from("Hi")).await.unwrap();
        assert!(store.delete("page", "title").await.unwrap());
        assert_eq!(store.get("page", "title").await.unwrap(), None);
    }

    #[tokio::test]
    async fn yaml_store_rejects_path_like_names() {
        let tmp = TempDir::new().unwrap();
        let store = YamlFileStore::new(tmp.path());
        for (scope, key) in [("..", "x"), ("page", "a/b"), ("", "x"), ("page", ".hidden")] {
            let err = store.set(scope, key, &FieldValue::from("v")).await.unwrap_err();
            assert!(matches!(err, FieldsError::InvalidIdentifier { .. }));
        }
    }

    #[tokio::test]
    async fn yaml_store_reports_corrupt_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("page")).unwrap();
        std::fs::write(tmp.path().join("page/links.yaml"), "enabled: [unclosed").unwrap();
        let store = YamlFileStore::new(tmp.path());
        let err = store.get("page", "links").await.unwrap_err();
        assert!(matches!(err, FieldsError::Yaml(_)));
    }
}
