//! # Notifications emitted by the queue, device, and workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Startup events**: per-worker readiness signals
//! - **Dispatch/outcome events**: task flow (dispatched, completed, faulted)
//! - **Lifecycle events**: shutdown progress and routing anomalies
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! slot labels, task ids, failure reasons, and — for completion events —
//! the executed task itself.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskfan::events::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFaulted)
//!     .with_task_id("task-42")
//!     .with_reason("division by zero");
//!
//! assert_eq!(ev.kind, EventKind::TaskFaulted);
//! assert_eq!(ev.task_id.as_deref(), Some("task-42"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::tasks::TaskRef;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup events ===
    /// A worker's subscription is live and it is accepting its slot's
    /// messages. Fired exactly once per worker per start.
    ///
    /// Sets:
    /// - `slot`: the worker's slot index (label via [`Event::slot_label`])
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerReady,

    // === Dispatch / outcome events ===
    /// A task was persisted, counted active, and published to its slot.
    ///
    /// Sets:
    /// - `task_id`: the dispatched task's id
    /// - `slot`: the assigned slot
    /// - `at`, `seq`
    TaskDispatched,

    /// A task executed successfully and was tagged `completed`.
    ///
    /// Sets:
    /// - `task_id`: the task's id
    /// - `task`: the executed task instance (outputs populated)
    /// - `slot`: the executing worker's slot
    /// - `at`, `seq`
    TaskCompleted,

    /// A task was tagged `faulted` (execution error or undecodable payload).
    ///
    /// Sets:
    /// - `task_id`: the task's id (raw token if the payload never decoded)
    /// - `task`: the task instance when one was reconstructed
    /// - `reason`: the failure message
    /// - `slot`: the executing worker's slot
    /// - `at`, `seq`
    TaskFaulted,

    // === Lifecycle / routing events ===
    /// The forwarding device dropped a frame it could not route.
    ///
    /// Sets:
    /// - `reason`: what was wrong with the frame
    /// - `at`, `seq`
    FrameDropped,

    /// Queue shutdown was requested; workers are being signalled to stop.
    ///
    /// Sets:
    /// - `at`, `seq`
    ShutdownRequested,

    /// All workers joined within the configured grace period.
    ///
    /// Sets:
    /// - `at`, `seq`
    PoolStopped,

    /// Grace period exceeded; some workers were still mid-task.
    ///
    /// Sets:
    /// - `at`, `seq`
    GraceExceeded,
}

/// Queue event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker slot index (1-based), if applicable.
    pub slot: Option<usize>,
    /// Id of the task, if applicable.
    pub task_id: Option<Arc<str>>,
    /// Human-readable reason (failure messages, drop details).
    pub reason: Option<Arc<str>>,
    /// The executed task, carried by completion events so observers can
    /// read typed outputs.
    pub task: Option<TaskRef>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            task_id: None,
            reason: None,
            task: None,
        }
    }

    /// Attaches a worker slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the executed task instance.
    #[inline]
    pub fn with_task(mut self, task: TaskRef) -> Self {
        self.task = Some(task);
        self
    }

    /// Returns the zero-padded topic label for this event's slot, if set.
    ///
    /// Matches the wire-format topic (`"0001"`, `"0002"`, ...).
    pub fn slot_label(&self) -> Option<String> {
        self.slot.map(|s| format!("{s:04}"))
    }

    /// True for the two terminal-outcome notifications.
    #[inline]
    pub fn is_completion(&self) -> bool {
        matches!(self.kind, EventKind::TaskCompleted | EventKind::TaskFaulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::WorkerReady);
        let b = Event::now(EventKind::WorkerReady);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn slot_label_is_zero_padded() {
        let ev = Event::now(EventKind::WorkerReady).with_slot(7);
        assert_eq!(ev.slot_label().as_deref(), Some("0007"));
    }
}
