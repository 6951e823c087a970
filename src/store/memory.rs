//! # In-memory store: process-lifetime persistence, no crash recovery.
//!
//! Records live in a map of encoded envelopes keyed by task id. Surviving a
//! process restart is explicitly out of this strategy's guarantees, but a
//! same-process `shutdown`/`start` cycle still sees in-flight records as
//! pending and orphans them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::codec::Codec;
use crate::error::StoreError;
use crate::store::{CompletionTag, TaskStore, Token};
use crate::tasks::{BoxedTask, Task};

/// In-memory [`TaskStore`] strategy.
///
/// Records are encoded through the same codec as the durable strategies so
/// the round-trip invariant stays exercised.
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
    codec: Arc<Codec>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new(codec: Arc<Codec>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            codec,
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn save(&self, task: &dyn Task) -> Result<Token, StoreError> {
        let payload = self.codec.encode(task)?;
        let mut records = self.records.write().await;
        if records.contains_key(task.id()) {
            return Err(StoreError::DuplicateId {
                id: task.id().to_string(),
            });
        }
        records.insert(task.id().to_string(), payload);
        Ok(Token::new(task.id()))
    }

    async fn load(&self, token: &Token) -> Result<BoxedTask, StoreError> {
        let payload = {
            let records = self.records.read().await;
            records
                .get(token.as_str())
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    id: token.as_str().to_string(),
                })?
        };
        Ok(self.codec.decode(&payload)?)
    }

    async fn mark_outcome(&self, id: &str, _tag: CompletionTag) -> Result<(), StoreError> {
        // Terminal records are simply dropped; repeat calls find nothing.
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testtask::{probe_codec, Probe};

    #[tokio::test]
    async fn save_load_round_trip() {
        let store = MemoryStore::new(probe_codec());
        let token = store.save(&Probe::new("m-1", 5)).await.unwrap();

        let task = store.load(&token).await.unwrap();
        assert_eq!(task.id(), "m-1");
        assert_eq!(task.state().unwrap()["input"], 5);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = MemoryStore::new(probe_codec());
        store.save(&Probe::new("m-1", 1)).await.unwrap();

        let err = store.save(&Probe::new("m-1", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { id } if id == "m-1"));
    }

    #[tokio::test]
    async fn mark_outcome_is_idempotent() {
        let store = MemoryStore::new(probe_codec());
        store.save(&Probe::new("m-1", 1)).await.unwrap();

        store
            .mark_outcome("m-1", CompletionTag::Completed)
            .await
            .unwrap();
        store
            .mark_outcome("m-1", CompletionTag::Completed)
            .await
            .unwrap();

        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_lists_untagged_records_only() {
        let store = MemoryStore::new(probe_codec());
        store.save(&Probe::new("m-1", 1)).await.unwrap();
        store.save(&Probe::new("m-2", 2)).await.unwrap();
        store
            .mark_outcome("m-1", CompletionTag::Faulted)
            .await
            .unwrap();

        assert_eq!(store.list_pending().await.unwrap(), vec!["m-2".to_string()]);
    }
}
