//! # Event bus for broadcasting queue notifications.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] through which
//! the dispatcher, the forwarding device, and every worker publish their
//! notifications without awaiting anyone.
//!
//! ```text
//! Publishers (many):                 Subscriber (one per TaskQueue):
//!   Worker 1 ──┐
//!   Worker 2 ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   Worker N ──┤  (broadcast chan)
//!   Device   ──┘
//! ```
//!
//! The queue itself attaches a single listener that fans events out to the
//! registered [`Subscribe`](crate::subscribers::Subscribe) observers; tests
//! and embedding applications may attach additional raw receivers via
//! [`TaskQueue::events`](crate::TaskQueue::events).
//!
//! ## Rules
//! - **Non-blocking publish**: a worker reporting a completion never waits
//!   for observers.
//! - **Bounded capacity**: one ring buffer of recent events shared by all
//!   receivers; a lagging receiver observes `RecvError::Lagged(n)` and
//!   skips the `n` oldest events.
//! - **No persistence**: an event published with no live receiver is gone;
//!   durable outcome state lives in the store, not on the bus.
//!
//! ## Example
//! ```
//! use taskfan::events::{Bus, Event, EventKind};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Bus::new(64);
//! let mut completions = bus.subscribe();
//!
//! bus.publish(Event::now(EventKind::TaskCompleted).with_slot(3));
//!
//! let ev = completions.recv().await.unwrap();
//! assert_eq!(ev.slot_label().as_deref(), Some("0003"));
//! # }
//! ```

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel carrying [`Event`]s from the queue's components to its
/// observers.
///
/// Cheap to clone; every component holds its own handle and publishes
/// concurrently. Receivers get a clone of each event (the payloads are
/// `Arc`-backed, so cloning is shallow).
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` recent events
    /// (floored at 1). The capacity is shared across all receivers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes one event to every live receiver, returning immediately.
    ///
    /// With no receivers attached the event is silently discarded; outcome
    /// durability is the store's job.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Attaches an independent receiver observing subsequent events only.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
