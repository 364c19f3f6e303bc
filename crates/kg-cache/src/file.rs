//! One JSON file per key under a cache directory.

use kg_types::{CacheStore, CacheStoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXT: &str = "json";

/// File-system store: `<dir>/<key>.json`. Writes go to a temp file in the same
/// directory and are renamed into place, so readers never see partial entries.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, EXT)))
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>, CacheStoreError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXT) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait::async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<bool, CacheStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<usize, CacheStoreError> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, CacheStoreError> {
        Ok(self.entry_files().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cache"));
        assert_eq!(store.get("abc123").await.unwrap(), None);

        store.put("abc123", b"one".to_vec()).await.unwrap();
        store.put("abc123", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("abc123").await.unwrap(), Some(b"two".to_vec()));
        assert!(dir.path().join("cache/abc123.json").exists());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());
        for key in ["", "../escape", "a/b", "a.json"] {
            assert!(matches!(
                store.put(key, b"x".to_vec()).await,
                Err(CacheStoreError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn clear_only_touches_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());
        store.put("k1", b"1".to_vec()).await.unwrap();
        store.put("k2", b"2".to_vec()).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "keep").await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(dir.path().join("notes.txt").exists());
        assert!(!store.evict("k1").await.unwrap());
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("never-created"));
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(store.clear().await.unwrap(), 0);
    }
}
