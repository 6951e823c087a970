//! Error types used by the taskfan queue and tasks.
//!
//! This module defines the error taxonomy of the dispatch engine:
//!
//! - [`ExecutionError`] — a task's own logic failed.
//! - [`CodecError`] — a payload could not be encoded or reconstructed.
//! - [`StoreError`] — the persistence layer failed.
//! - [`DispatchError`] — a submission could not be published.
//! - [`QueueError`] — the queue lifecycle itself failed.
//!
//! Per-task failures (`ExecutionError`, `CodecError`) are contained inside the
//! worker loop: the record is marked `faulted` and the loop keeps processing.
//! Only infrastructure failures (`DispatchError`, `QueueError`) reach callers.
//! The runtime-facing enums provide `as_label()` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Error produced by a task's own `execute`.
///
/// Carries a human-readable message; the worker loop converts it into a
/// `faulted` outcome and a [`TaskFaulted`](crate::events::EventKind::TaskFaulted)
/// event. A failing task never terminates its worker.
#[derive(Error, Debug)]
#[error("task execution failed: {message}")]
pub struct ExecutionError {
    /// The underlying failure message.
    pub message: String,
}

impl ExecutionError {
    /// Creates an execution error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// # Errors produced while encoding or decoding a task payload.
///
/// Decoding an unknown type tag is never silently swallowed: a worker that
/// cannot decode cannot execute or report completion for that record.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CodecError {
    /// No decoder is registered for the payload's type tag.
    #[error("unknown task kind '{kind}': no decoder registered")]
    UnknownTaskKind {
        /// The unrecognized type tag.
        kind: String,
    },

    /// A decoder for this type tag is already registered.
    #[error("task kind '{kind}' is already registered")]
    DuplicateKind {
        /// The colliding type tag.
        kind: String,
    },

    /// The payload is not a well-formed envelope.
    #[error("malformed payload envelope: {reason}")]
    BadEnvelope {
        /// What made the envelope unreadable.
        reason: String,
    },

    /// Structural (de)serialization of task state failed.
    #[error("task state serialization failed: {0}")]
    State(#[from] serde_json::Error),
}

/// # Errors produced by the durable store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Two `save` calls collided on the same task id.
    ///
    /// Ids are globally unique in the intended usage; a collision indicates a
    /// duplicated submission and fails loudly instead of overwriting.
    #[error("task '{id}' is already persisted")]
    DuplicateId {
        /// The colliding task id.
        id: String,
    },

    /// No pending record exists for the requested token.
    #[error("no pending record for '{id}'")]
    NotFound {
        /// The missing task id.
        id: String,
    },

    /// Backend I/O failed (file-backed strategy).
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be encoded or reconstructed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// # Errors surfaced to a submitting caller.
///
/// When `submit` fails the task is **not** counted as active and no record
/// of it is dispatched.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The queue has not been started (or has been shut down).
    #[error("queue is not running")]
    NotRunning,

    /// The forwarding device rejected the send (bound address released).
    #[error("bus unreachable at '{addr}'")]
    BusUnavailable {
        /// The fan-out bind address.
        addr: String,
    },

    /// Persisting the task before publish failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NotRunning => "dispatch_not_running",
            DispatchError::BusUnavailable { .. } => "dispatch_bus_unavailable",
            DispatchError::Store(_) => "dispatch_store_failed",
        }
    }
}

/// # Errors produced by the queue lifecycle.
///
/// Only resource-acquisition failures at startup/shutdown propagate out of
/// [`TaskQueue`](crate::TaskQueue); per-task faults never do.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum QueueError {
    /// Orphan recovery or another store operation failed during startup.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A worker never signalled readiness within the startup window.
    #[error("worker pool failed to become ready within {waited:?}")]
    ReadyTimeout {
        /// How long startup waited for the handshake.
        waited: Duration,
    },

    /// Shutdown grace period was exceeded; some workers were still busy.
    #[error("shutdown grace {grace:?} exceeded; busy slots: {busy:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Zero-padded labels of the slots that did not stop in time.
        busy: Vec<String>,
    },
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Store(_) => "queue_store_failed",
            QueueError::ReadyTimeout { .. } => "queue_ready_timeout",
            QueueError::GraceExceeded { .. } => "queue_grace_exceeded",
        }
    }
}
