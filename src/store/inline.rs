//! # Inline store: task state travels inside the dispatch message.
//!
//! The "stateless" strategy — nothing is stored on the side. `save` returns
//! the full encoded payload as the token, `load` decodes it straight back,
//! and outcomes are pure no-ops: there is no crash-recovery guarantee in
//! this mode, and nothing is ever pending at startup.

use std::sync::Arc;

use async_trait::async_trait;

use crate::codec::Codec;
use crate::error::StoreError;
use crate::store::{CompletionTag, TaskStore, Token};
use crate::tasks::{BoxedTask, Task};

/// Stateless [`TaskStore`] strategy.
pub struct InlineStore {
    codec: Arc<Codec>,
}

impl InlineStore {
    /// Creates the inline store over the given codec.
    pub fn new(codec: Arc<Codec>) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl TaskStore for InlineStore {
    async fn save(&self, task: &dyn Task) -> Result<Token, StoreError> {
        Ok(Token::new(self.codec.encode(task)?))
    }

    async fn load(&self, token: &Token) -> Result<BoxedTask, StoreError> {
        Ok(self.codec.decode(token.as_str())?)
    }

    async fn mark_outcome(&self, _id: &str, _tag: CompletionTag) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testtask::{probe_codec, Probe};

    #[tokio::test]
    async fn token_carries_the_whole_task() {
        let store = InlineStore::new(probe_codec());
        let token = store.save(&Probe::new("i-1", 9)).await.unwrap();

        // The token is the payload itself, not an id.
        assert!(token.as_str().contains("test.probe"));

        let task = store.load(&token).await.unwrap();
        assert_eq!(task.id(), "i-1");
        assert_eq!(task.state().unwrap()["input"], 9);
    }

    #[tokio::test]
    async fn outcomes_and_pending_are_no_ops() {
        let store = InlineStore::new(probe_codec());
        store.save(&Probe::new("i-1", 9)).await.unwrap();

        store
            .mark_outcome("i-1", CompletionTag::Completed)
            .await
            .unwrap();
        assert!(store.list_pending().await.unwrap().is_empty());
    }
}
