//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [worker-ready] slot=0001
//! [dispatched] task=4f1c... slot=0002
//! [completed] task=4f1c... slot=0002
//! [faulted] task=9a3e... slot=0001 reason="division by zero"
//! [frame-dropped] reason="slot 0042 out of range"
//! [shutdown-requested]
//! [pool-stopped]
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::WorkerReady => {
                println!("[worker-ready] slot={:?}", e.slot_label());
            }
            EventKind::TaskDispatched => {
                println!(
                    "[dispatched] task={:?} slot={:?}",
                    e.task_id,
                    e.slot_label()
                );
            }
            EventKind::TaskCompleted => {
                println!("[completed] task={:?} slot={:?}", e.task_id, e.slot_label());
            }
            EventKind::TaskFaulted => {
                println!(
                    "[faulted] task={:?} slot={:?} reason={:?}",
                    e.task_id,
                    e.slot_label(),
                    e.reason
                );
            }
            EventKind::FrameDropped => {
                println!("[frame-dropped] reason={:?}", e.reason);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::PoolStopped => {
                println!("[pool-stopped]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
