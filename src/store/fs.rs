//! # File-backed store: one pending record per task, durable across restarts.
//!
//! Layout under the configured root directory:
//! ```text
//! <root>/<task id>.json            pending record (envelope payload)
//! <root>/completed/<task id>.json  archived on success   (Retention::Archive)
//! <root>/faulted/<task id>.json    archived on failure
//! <root>/orphaned/<task id>.json   archived at recovery
//! ```
//!
//! With [`Retention::Purge`] the pending record is deleted on completion
//! instead of relocated.
//!
//! ## Rules
//! - `save` opens the pending file with `create_new`: a colliding id fails
//!   loudly as [`StoreError::DuplicateId`], never overwrites.
//! - `mark_outcome` is idempotent: a missing pending record is a no-op.
//! - Saves for distinct ids are independent files and never serialize each
//!   other's I/O.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::codec::Codec;
use crate::error::StoreError;
use crate::store::{CompletionTag, TaskStore, Token};
use crate::tasks::{BoxedTask, Task};

/// What happens to a record once it is terminally tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Relocate the record into an outcome-labelled archive directory.
    #[default]
    Archive,
    /// Delete the record outright.
    Purge,
}

/// File-backed [`TaskStore`] strategy.
pub struct FsStore {
    root: PathBuf,
    retention: Retention,
    codec: Arc<Codec>,
}

impl FsStore {
    /// Opens (and creates if needed) the store root directory.
    pub async fn open(
        root: impl Into<PathBuf>,
        retention: Retention,
        codec: Arc<Codec>,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            retention,
            codec,
        })
    }

    fn pending_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn archive_path(&self, id: &str, tag: CompletionTag) -> PathBuf {
        self.root.join(tag.as_label()).join(format!("{id}.json"))
    }
}

#[async_trait]
impl TaskStore for FsStore {
    async fn save(&self, task: &dyn Task) -> Result<Token, StoreError> {
        let payload = self.codec.encode(task)?;
        let path = self.pending_path(task.id());

        let open = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        let mut file = match open {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::DuplicateId {
                    id: task.id().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;
        Ok(Token::new(task.id()))
    }

    async fn load(&self, token: &Token) -> Result<BoxedTask, StoreError> {
        let path = self.pending_path(token.as_str());
        let payload = match fs::read_to_string(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    id: token.as_str().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.codec.decode(&payload)?)
    }

    async fn mark_outcome(&self, id: &str, tag: CompletionTag) -> Result<(), StoreError> {
        let pending = self.pending_path(id);

        match self.retention {
            Retention::Archive => {
                let target = self.archive_path(id, tag);
                // The parent always exists after this, so rename failures
                // below are about the source record.
                if let Some(dir) = target.parent() {
                    fs::create_dir_all(dir).await?;
                }
                match fs::rename(&pending, &target).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Retention::Purge => match fs::remove_file(&pending).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn list_pending(&self) -> Result<Vec<String>, StoreError> {
        let mut pending = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = stem_of(&path) {
                pending.push(stem);
            }
        }
        Ok(pending)
    }
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testtask::{probe_codec, Probe};

    async fn store(dir: &tempfile::TempDir, retention: Retention) -> FsStore {
        FsStore::open(dir.path(), retention, probe_codec())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Archive).await;

        let token = store.save(&Probe::new("p-1", 21)).await.unwrap();
        assert_eq!(token.as_str(), "p-1");

        let task = store.load(&token).await.unwrap();
        assert_eq!(task.id(), "p-1");
        assert_eq!(task.state().unwrap()["input"], 21);
    }

    #[tokio::test]
    async fn duplicate_id_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Archive).await;

        store.save(&Probe::new("p-1", 1)).await.unwrap();
        let err = store.save(&Probe::new("p-1", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { id } if id == "p-1"));

        // The original record is untouched.
        let task = store.load(&Token::new("p-1")).await.unwrap();
        assert_eq!(task.state().unwrap()["input"], 1);
    }

    #[tokio::test]
    async fn archive_relocates_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Archive).await;

        store.save(&Probe::new("p-1", 7)).await.unwrap();
        store
            .mark_outcome("p-1", CompletionTag::Completed)
            .await
            .unwrap();

        let archived = dir.path().join("completed").join("p-1.json");
        assert!(archived.exists());
        assert!(!dir.path().join("p-1.json").exists());

        // Second call: same observable state, no error.
        store
            .mark_outcome("p-1", CompletionTag::Completed)
            .await
            .unwrap();
        assert!(archived.exists());
    }

    #[tokio::test]
    async fn purge_deletes_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Purge).await;

        store.save(&Probe::new("p-1", 7)).await.unwrap();
        store
            .mark_outcome("p-1", CompletionTag::Completed)
            .await
            .unwrap();
        assert!(!dir.path().join("p-1.json").exists());

        store
            .mark_outcome("p-1", CompletionTag::Completed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_pending_skips_archived_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Archive).await;

        store.save(&Probe::new("p-1", 1)).await.unwrap();
        store.save(&Probe::new("p-2", 2)).await.unwrap();
        store
            .mark_outcome("p-2", CompletionTag::Faulted)
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending, vec!["p-1".to_string()]);
    }

    #[tokio::test]
    async fn load_missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Retention::Archive).await;

        let err = store.load(&Token::new("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id } if id == "ghost"));
    }
}
