//! # Task abstractions.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait every dispatchable unit of work implements
//! - [`TaskKind`] - registration companion carrying the concrete type tag
//! - [`TaskRef`] / [`BoxedTask`] - shared and owned task handles
//! - [`next_task_id`] / [`snapshot`] - identity and state-capture helpers

mod task;

pub use task::{next_task_id, snapshot, BoxedTask, Task, TaskKind, TaskRef};
