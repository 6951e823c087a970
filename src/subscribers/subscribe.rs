//! # Core subscriber trait.
//!
//! `Subscribe` is the plug point for observing the queue: readiness,
//! dispatches, completions, faults, drops, and shutdown progress all arrive
//! as [`Event`]s on a dedicated worker loop fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they delay
//!   neither the publishing worker nor other subscribers.
//! - Each subscriber declares its queue depth via
//!   [`Subscribe::queue_capacity`]; on overflow, events for that subscriber
//!   are dropped and counted.
//!
//! ## Example: collecting task outputs
//! ```
//! use async_trait::async_trait;
//! use taskfan::events::{Event, EventKind};
//! use taskfan::subscribers::Subscribe;
//!
//! struct ResultSink;
//!
//! #[async_trait]
//! impl Subscribe for ResultSink {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind != EventKind::TaskCompleted {
//!             return;
//!         }
//!         // Completion events carry the executed task; its state snapshot
//!         // includes whatever output fields the task kind defines.
//!         if let Some(task) = &event.task {
//!             if let Ok(state) = task.state() {
//!                 let _output = state.get("output");
//!             }
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "result_sink"
//!     }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for queue event observers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative
/// waits); a subscriber stuck in `on_event` backs up only its own queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single queue event.
    ///
    /// The reference does not transfer ownership; retain data by cloning
    /// the (cheap, `Arc`-backed) fields that matter.
    async fn on_event(&self, event: &Event);

    /// Human-readable name, used in drop warnings and
    /// [`SubscriberSet::dropped`](crate::subscribers::SubscriberSet::dropped)
    /// lookups.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Depth of this subscriber's event queue.
    ///
    /// Size it for the subscriber's worst burst: a full queue drops events
    /// for this subscriber only.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
