//! # Fan-out of queue events to registered subscribers.
//!
//! One listener task (owned by the queue) pulls events off the broadcast
//! bus and hands them to [`SubscriberSet::emit`], which forwards each event
//! to every subscriber's private bounded queue. A dedicated worker drains
//! each queue, so a slow metrics sink never delays a fast logger and a
//! panicking subscriber never takes the others down.
//!
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► drain S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► drain S2 ─► on_event()
//!        └────────────────► [queue SN] ─► drain SN ─► on_event()
//! ```
//!
//! Delivery is per-subscriber FIFO with no ordering across subscribers.
//! A full or closed queue drops the event for that subscriber only; drops
//! are counted per subscriber and visible via [`SubscriberSet::dropped`].

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::Event;

use super::Subscribe;

/// One subscriber's delivery lane: its queue plus drop accounting.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: Arc<AtomicU64>,
    drain: JoinHandle<()>,
}

fn spawn_drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let handled = AssertUnwindSafe(sub.on_event(ev.as_ref())).catch_unwind().await;
            if let Err(panic) = handled {
                eprintln!("[taskfan] subscriber '{}' panicked: {:?}", sub.name(), panic);
            }
        }
    })
}

/// Composite fan-out with per-subscriber bounded queues and drain tasks.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Creates a set and spawns one drain task per subscriber.
    ///
    /// Queue capacity comes from each subscriber's own
    /// [`queue_capacity`](Subscribe::queue_capacity), floored at 1. Must be
    /// called within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                Lane {
                    name: sub.name(),
                    dropped: Arc::new(AtomicU64::new(0)),
                    drain: spawn_drain(sub, rx),
                    tx,
                }
            })
            .collect();
        Self { lanes }
    }

    /// Forwards one event to every subscriber without awaiting any of them.
    ///
    /// A subscriber whose queue is full or whose drain task has exited
    /// misses this event; the miss is counted and logged once per event.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            let outcome = lane.tx.try_send(Arc::clone(&ev));
            if let Err(e) = outcome {
                lane.dropped.fetch_add(1, Ordering::Relaxed);
                let why = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "drain task gone",
                };
                eprintln!("[taskfan] subscriber '{}' dropped event: {why}", lane.name);
            }
        }
    }

    /// How many events the named subscriber has missed so far.
    pub fn dropped(&self, name: &str) -> Option<u64> {
        self.lanes
            .iter()
            .find(|lane| lane.name == name)
            .map(|lane| lane.dropped.load(Ordering::Relaxed))
    }

    /// Closes every queue and awaits the drain tasks.
    pub async fn shutdown(self) {
        let drains: Vec<JoinHandle<()>> = self
            .lanes
            .into_iter()
            .map(|lane| {
                drop(lane.tx);
                lane.drain
            })
            .collect();
        for drain in drains {
            let _ = drain.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct Counter {
        seen: AtomicU64,
        ping: Notify,
    }

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
            self.ping.notify_one();
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Bomb;

    #[async_trait]
    impl Subscribe for Bomb {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber bomb");
        }
        fn name(&self) -> &'static str {
            "bomb"
        }
    }

    #[tokio::test]
    async fn a_panicking_subscriber_does_not_starve_the_rest() {
        let counter = Arc::new(Counter {
            seen: AtomicU64::new(0),
            ping: Notify::new(),
        });
        let set = SubscriberSet::new(vec![Arc::new(Bomb), counter.clone()]);

        set.emit(&Event::now(EventKind::PoolStopped));
        counter.ping.notified().await;
        set.emit(&Event::now(EventKind::PoolStopped));
        counter.ping.notified().await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
        set.shutdown().await;
    }

    struct Blocker;

    #[async_trait]
    impl Subscribe for Blocker {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }
        fn name(&self) -> &'static str {
            "blocker"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn overflow_is_counted_per_subscriber() {
        let set = SubscriberSet::new(vec![Arc::new(Blocker) as Arc<dyn Subscribe>]);

        for _ in 0..3 {
            set.emit(&Event::now(EventKind::TaskDispatched));
        }

        let missed = set.dropped("blocker").unwrap();
        assert!(missed >= 1, "no overflow recorded, got {missed}");
        assert_eq!(set.dropped("ghost"), None);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }
}
