//! # Task abstraction: the executable-unit-of-work contract.
//!
//! This module defines the [`Task`] trait (stable identity, type tag,
//! structural state snapshot, fallible async execution) and the
//! [`TaskKind`] companion trait that associates a concrete task type with
//! its registration tag. The common handle types are [`BoxedTask`] (a
//! worker's exclusively-owned task) and [`TaskRef`] (an `Arc<dyn Task>`
//! used for sharing an executed task with event observers).
//!
//! A task owns its input/output state exclusively until it completes; the
//! worker loop is the only caller of [`Task::execute`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CodecError, ExecutionError};

/// Shared handle to an executed task (`Arc<dyn Task>`), carried by
/// completion events so observers can read typed outputs.
pub type TaskRef = Arc<dyn Task>;

/// Owned handle to a pending task (`Box<dyn Task>`), held exclusively by
/// the worker that dequeued it.
pub type BoxedTask = Box<dyn Task>;

/// # Self-contained, dispatchable unit of work.
///
/// A `Task` has a stable unique [`id`](Task::id) (generated at construction,
/// immutable afterwards), a concrete type tag [`kind`](Task::kind) used to
/// pick the right decoder, and an async [`execute`](Task::execute) that may
/// mutate the task's own output state.
///
/// `execute` must not block indefinitely: a hung task occupies its worker
/// slot until process shutdown.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde::{Deserialize, Serialize};
/// use taskfan::{next_task_id, snapshot, CodecError, ExecutionError, Task, TaskKind};
///
/// #[derive(Serialize, Deserialize)]
/// struct Greet {
///     id: String,
///     name: String,
///     greeting: Option<String>,
/// }
///
/// impl Greet {
///     fn new(name: impl Into<String>) -> Self {
///         Self { id: next_task_id(), name: name.into(), greeting: None }
///     }
/// }
///
/// #[async_trait]
/// impl Task for Greet {
///     fn id(&self) -> &str { &self.id }
///     fn kind(&self) -> &'static str { Self::KIND }
///     fn state(&self) -> Result<serde_json::Value, CodecError> { snapshot(self) }
///
///     async fn execute(&mut self) -> Result<(), ExecutionError> {
///         self.greeting = Some(format!("hello, {}", self.name));
///         Ok(())
///     }
/// }
///
/// impl TaskKind for Greet {
///     const KIND: &'static str = "demo.greet";
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns the stable unique task id.
    ///
    /// Two tasks never share an id for the lifetime of the system.
    fn id(&self) -> &str;

    /// Returns the concrete type tag used for decoder lookup.
    ///
    /// Implementations backed by [`TaskKind`] return `Self::KIND`.
    fn kind(&self) -> &'static str;

    /// Captures a structural serialization of the task's current state.
    ///
    /// The snapshot must be reversible: decoding it through the registered
    /// decoder reconstructs a behaviorally equivalent task (same id, same
    /// input fields).
    fn state(&self) -> Result<serde_json::Value, CodecError>;

    /// Executes the task, mutating its own output state.
    ///
    /// Any internal fault is reported as [`ExecutionError`]; the worker
    /// loop contains the failure and keeps processing subsequent messages.
    async fn execute(&mut self) -> Result<(), ExecutionError>;
}

impl std::fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}

/// # Registration companion for concrete task types.
///
/// Associates a task type with its stable tag and the serde bounds the
/// codec registry needs. The queue itself never hardcodes concrete task
/// types; the embedding application registers each `TaskKind` at startup.
pub trait TaskKind: Task + Serialize + DeserializeOwned {
    /// Stable type tag written into every encoded payload.
    ///
    /// Renaming a tag orphans previously persisted records of that kind.
    const KIND: &'static str;
}

/// Generates a fresh globally unique task id (UUID v4).
///
/// Concrete tasks call this once in their constructor.
pub fn next_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Captures a structural snapshot of a serializable task.
///
/// Shorthand for `serde_json::to_value`, converting failures into
/// [`CodecError`]; the usual body of [`Task::state`].
pub fn snapshot<T: Serialize>(task: &T) -> Result<serde_json::Value, CodecError> {
    Ok(serde_json::to_value(task)?)
}
