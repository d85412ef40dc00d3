//! Local filesystem storage implementation.
//!
//! Every write goes to a `.tmp` sibling first. A commit renames its temp
//! files into place only after all of them were written and flushed, so a
//! failure part-way leaves the previous state intact. The baseline is
//! renamed last: an interrupted commit leaves it behind, and the next run
//! fetches the same identifiers again.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{BookDescriptor, Identifier, PathsConfig};
use crate::storage::{StateCommit, StateStore};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    paths: PathsConfig,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            paths,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn tmp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        path.with_file_name(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes to the temp sibling of `key` and return both paths.
    async fn stage_bytes(&self, key: &str, bytes: &[u8]) -> Result<(PathBuf, PathBuf)> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = Self::tmp_path(&path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        Ok((tmp, path))
    }

    async fn stage_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(PathBuf, PathBuf)> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.stage_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON, treating absent or malformed content as the default value.
    async fn read_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(bytes) = self.read_bytes(key).await? else {
            log::info!("{} not found, starting empty", key);
            return Ok(T::default());
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("{} is corrupt ({}), treating as empty", key, e);
                Ok(T::default())
            }
        }
    }

    async fn stage_all(&self, commit: &StateCommit<'_>) -> Result<Vec<(PathBuf, PathBuf)>> {
        let mut staged = Vec::with_capacity(commit.file_count());
        if let Some(history) = commit.history {
            staged.push(self.stage_json(&self.paths.history_file, history).await?);
        }
        if let Some(delta) = commit.delta {
            staged.push(self.stage_json(&self.paths.delta_file, delta).await?);
        }
        if let Some(feed) = commit.feed {
            staged.push(self.stage_bytes(&self.paths.feed_file, feed).await?);
        }
        if let Some(baseline) = commit.baseline {
            staged.push(self.stage_json(&self.paths.baseline_file, baseline).await?);
        }
        Ok(staged)
    }

    async fn discard_staged(&self, commit: &StateCommit<'_>) {
        let keys = [
            commit.baseline.map(|_| &self.paths.baseline_file),
            commit.history.map(|_| &self.paths.history_file),
            commit.delta.map(|_| &self.paths.delta_file),
            commit.feed.map(|_| &self.paths.feed_file),
        ];
        for key in keys.into_iter().flatten() {
            let _ = tokio::fs::remove_file(Self::tmp_path(&self.path(key))).await;
        }
    }
}

#[async_trait]
impl StateStore for LocalStorage {
    async fn load_baseline(&self) -> Result<BTreeSet<Identifier>> {
        let ids: BTreeSet<Identifier> = self
            .read_json_or_default(&self.paths.baseline_file)
            .await?;
        log::info!("Loaded {} baseline identifiers", ids.len());
        Ok(ids)
    }

    async fn load_history(&self) -> Result<Vec<BookDescriptor>> {
        let history: Vec<BookDescriptor> =
            self.read_json_or_default(&self.paths.history_file).await?;
        log::info!("Loaded {} feed history entries", history.len());
        Ok(history)
    }

    async fn commit(&self, commit: &StateCommit<'_>) -> Result<()> {
        let staged = match self.stage_all(commit).await {
            Ok(staged) => staged,
            Err(e) => {
                log::error!("Staging state failed, previous state kept: {}", e);
                self.discard_staged(commit).await;
                return Err(e);
            }
        };

        // Baseline is staged last, so it only advances once everything else is in place.
        for (index, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = tokio::fs::rename(tmp, path).await {
                log::error!("Replacing {} failed: {}", path.display(), e);
                for (leftover, _) in &staged[index..] {
                    let _ = tokio::fs::remove_file(leftover).await;
                }
                return Err(AppError::Io(e));
            }
        }
        log::debug!("Committed {} state files", staged.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeltaDocument;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalStorage {
        LocalStorage::new(tmp.path(), PathsConfig::default())
    }

    fn ids(values: &[&str]) -> BTreeSet<Identifier> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        assert!(storage.load_baseline().await.unwrap().is_empty());
        assert!(storage.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        std::fs::write(tmp.path().join("isbns_previous.json"), b"{not json").unwrap();
        std::fs::write(tmp.path().join("feed_history.json"), br#"{"isbn": "1"}"#).unwrap();

        assert!(storage.load_baseline().await.unwrap().is_empty());
        assert!(storage.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let baseline = ids(&["B", "A"]);
        let history = vec![BookDescriptor::new("A", "Title")];
        let delta = DeltaDocument::new(history.clone());

        storage
            .commit(&StateCommit {
                baseline: Some(&baseline),
                history: Some(history.as_slice()),
                delta: Some(&delta),
                feed: Some(&b"<rss/>"[..]),
            })
            .await
            .unwrap();

        assert_eq!(storage.load_baseline().await.unwrap(), baseline);
        assert_eq!(storage.load_history().await.unwrap()[0].isbn, "A");
        assert_eq!(std::fs::read(tmp.path().join("index.xml")).unwrap(), b"<rss/>");

        let raw = std::fs::read_to_string(tmp.path().join("new_records.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["count"], 1);
        assert_eq!(doc["records"][0]["isbn"], "A");

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_partial_commit_leaves_other_files() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let baseline = ids(&["A"]);
        let history = vec![BookDescriptor::new("A", "Title")];

        storage
            .commit(&StateCommit {
                baseline: Some(&baseline),
                history: Some(history.as_slice()),
                ..StateCommit::default()
            })
            .await
            .unwrap();

        let grown = ids(&["A", "B"]);
        storage
            .commit(&StateCommit {
                baseline: Some(&grown),
                ..StateCommit::default()
            })
            .await
            .unwrap();

        assert_eq!(storage.load_baseline().await.unwrap(), grown);
        assert_eq!(storage.load_history().await.unwrap().len(), 1);
        assert!(!tmp.path().join("index.xml").exists());
    }

    #[tokio::test]
    async fn test_failed_staging_keeps_previous_state() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            feed_file: "blocked/index.xml".into(),
            ..PathsConfig::default()
        };
        let storage = LocalStorage::new(tmp.path(), paths);
        std::fs::write(tmp.path().join("blocked"), b"a file, not a directory").unwrap();

        let before = ids(&["A"]);
        storage
            .commit(&StateCommit {
                baseline: Some(&before),
                ..StateCommit::default()
            })
            .await
            .unwrap();

        let after = ids(&["A", "B"]);
        let result = storage
            .commit(&StateCommit {
                baseline: Some(&after),
                feed: Some(&b"<rss/>"[..]),
                ..StateCommit::default()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(storage.load_baseline().await.unwrap(), before);
        assert!(!tmp.path().join("isbns_previous.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_history_rename_keeps_baseline() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        let before = ids(&["A"]);
        storage
            .commit(&StateCommit {
                baseline: Some(&before),
                ..StateCommit::default()
            })
            .await
            .unwrap();

        let blocked = tmp.path().join("feed_history.json");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"x").unwrap();

        let after = ids(&["A", "B"]);
        let history = vec![BookDescriptor::new("B", "Title")];
        let result = storage
            .commit(&StateCommit {
                baseline: Some(&after),
                history: Some(history.as_slice()),
                ..StateCommit::default()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(storage.load_baseline().await.unwrap(), before);
        assert!(!tmp.path().join("isbns_previous.json.tmp").exists());
        assert!(!tmp.path().join("feed_history.json.tmp").exists());
    }

    #[test]
    fn test_tmp_path_keeps_extension() {
        let tmp = LocalStorage::tmp_path(Path::new("/data/index.xml"));
        assert_eq!(tmp, PathBuf::from("/data/index.xml.tmp"));
    }
}
