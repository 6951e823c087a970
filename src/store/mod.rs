//! # Durable store: task persistence across the dispatch-execute-complete cycle.
//!
//! The [`TaskStore`] contract is implemented by three interchangeable
//! strategies:
//!
//! - [`FsStore`] — file-backed, durable across process restarts;
//! - [`MemoryStore`] — process-lifetime only;
//! - [`InlineStore`] — stateless: the task state travels inside the dispatch
//!   message itself, nothing is stored on the side.
//!
//! The store owns all persisted records and is the sole source of truth for
//! "what is pending" across restarts.
//!
//! ## Record lifecycle
//! ```text
//! save() ──► pending (no tag) ──► mark_outcome() ──► completed | faulted
//!                     │
//!                     └─ still pending at next start ──► orphaned
//! ```
//!
//! ## Rules
//! - A record is terminally tagged **exactly once**; repeated
//!   `mark_outcome` calls for the same id are idempotent no-ops.
//! - `orphaned` is assigned only during startup recovery, never during
//!   normal execution.
//! - Concurrent `save` calls for distinct ids never serialize each other's
//!   I/O; a colliding id fails loudly instead of overwriting.

mod fs;
mod inline;
mod memory;

pub use fs::{FsStore, Retention};
pub use inline::InlineStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::fmt;

use crate::error::StoreError;
use crate::tasks::{BoxedTask, Task};

/// Terminal outcome recorded for a dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTag {
    /// The task executed successfully.
    Completed,
    /// The task's execution (or decoding) failed.
    Faulted,
    /// The task was left pending by an unclean shutdown and recovered at
    /// the next startup.
    Orphaned,
}

impl CompletionTag {
    /// Returns a short stable label (snake_case), also used as the archive
    /// directory name by the file-backed strategy.
    pub fn as_label(&self) -> &'static str {
        match self {
            CompletionTag::Completed => "completed",
            CompletionTag::Faulted => "faulted",
            CompletionTag::Orphaned => "orphaned",
        }
    }
}

impl fmt::Display for CompletionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Opaque dispatch token produced by [`TaskStore::save`].
///
/// For id-keyed strategies this is the task id; for the inline strategy it
/// is the full encoded payload. Workers hand it back to
/// [`TaskStore::load`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wraps a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrows the raw token text (what goes on the wire).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the raw text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Persistence contract implemented by every store strategy.
///
/// See the [module docs](self) for the record lifecycle and idempotence
/// rules.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Persists a task, keyed by its id, and returns the dispatch token.
    ///
    /// Fails with [`StoreError::DuplicateId`] if a pending record with the
    /// same id already exists.
    async fn save(&self, task: &dyn Task) -> Result<Token, StoreError>;

    /// Resolves a token back into an executable task.
    async fn load(&self, token: &Token) -> Result<BoxedTask, StoreError>;

    /// Idempotently records the terminal outcome for a task id.
    ///
    /// Calling this twice for the same id leaves the store in the same
    /// observable state as calling it once.
    async fn mark_outcome(&self, id: &str, tag: CompletionTag) -> Result<(), StoreError>;

    /// Returns the ids of records with no terminal tag.
    ///
    /// Used only at startup, to discover work orphaned by a prior run.
    async fn list_pending(&self) -> Result<Vec<String>, StoreError>;
}
