//! Worker: one pool member bound to a single slot.
//!
//! Each worker owns the backend receiver for its slot, signals readiness
//! once before consuming, and then loops: resolve the frame's token through
//! the store, execute the task, record the terminal outcome, decrement the
//! active counter, publish the outcome event. A failing (or panicking) task
//! never terminates the loop; only cancellation or channel closure does.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::dispatch::ActiveCounter;
use crate::device::Frame;
use crate::events::{Bus, Event, EventKind};
use crate::store::{CompletionTag, TaskStore, Token};
use crate::tasks::TaskRef;

pub(crate) struct Worker {
    slot: usize,
    rx: mpsc::Receiver<String>,
    store: Arc<dyn TaskStore>,
    active: ActiveCounter,
    events: Bus,
}

impl Worker {
    pub(crate) fn new(
        slot: usize,
        rx: mpsc::Receiver<String>,
        store: Arc<dyn TaskStore>,
        active: ActiveCounter,
        events: Bus,
    ) -> Self {
        Self {
            slot,
            rx,
            store,
            active,
            events,
        }
    }

    /// Consumes this slot's frames until cancellation or device closure.
    ///
    /// Sends the ready signal first: the backend receiver is live from the
    /// moment the device was bound, so once the signal lands no subsequent
    /// frame for this slot can be lost. Returns the slot number so the
    /// queue can name stragglers at shutdown.
    pub(crate) async fn run(
        mut self,
        stop: CancellationToken,
        ready: mpsc::Sender<usize>,
    ) -> usize {
        let _ = ready.send(self.slot).await;
        self.events
            .publish(Event::now(EventKind::WorkerReady).with_slot(self.slot));

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                frame = self.rx.recv() => match frame {
                    Some(wire) => self.process(wire).await,
                    None => break,
                },
            }
        }
        self.slot
    }

    /// Handles one dispatched frame end to end.
    async fn process(&self, wire: String) {
        let token = match Frame::parse(&wire) {
            Ok(frame) => Token::new(frame.token),
            Err(e) => {
                // The device validates frames before forwarding, so this is
                // a routing bug rather than a task failure. No counter was
                // matched to this frame.
                self.events.publish(
                    Event::now(EventKind::FrameDropped)
                        .with_slot(self.slot)
                        .with_reason(format!("worker received unparseable frame: {e}")),
                );
                return;
            }
        };

        let mut task = match self.store.load(&token).await {
            Ok(task) => task,
            Err(e) => {
                // Undecodable or missing payloads are terminal: tag the raw
                // token faulted so the record is never retried.
                let _ = self
                    .store
                    .mark_outcome(token.as_str(), CompletionTag::Faulted)
                    .await;
                self.active.decrement();
                self.events.publish(
                    Event::now(EventKind::TaskFaulted)
                        .with_slot(self.slot)
                        .with_task_id(token.as_str())
                        .with_reason(e.to_string()),
                );
                return;
            }
        };

        let outcome = AssertUnwindSafe(task.execute()).catch_unwind().await;
        let id = task.id().to_string();

        let (tag, reason) = match outcome {
            Ok(Ok(())) => (CompletionTag::Completed, None),
            Ok(Err(e)) => (CompletionTag::Faulted, Some(e.to_string())),
            Err(panic) => (CompletionTag::Faulted, Some(panic_reason(&panic))),
        };

        if let Err(e) = self.store.mark_outcome(&id, tag).await {
            eprintln!("[taskfan] worker {:04}: mark_outcome('{id}') failed: {e}", self.slot);
        }
        self.active.decrement();

        let kind = match tag {
            CompletionTag::Completed => EventKind::TaskCompleted,
            _ => EventKind::TaskFaulted,
        };
        let mut ev = Event::now(kind)
            .with_slot(self.slot)
            .with_task_id(id)
            .with_task(TaskRef::from(task));
        if let Some(reason) = reason {
            ev = ev.with_reason(reason);
        }
        self.events.publish(ev);
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use crate::codec::{Codec, TaskRegistry};
    use crate::error::{CodecError, ExecutionError};
    use crate::store::MemoryStore;
    use crate::tasks::{snapshot, Task, TaskKind};

    #[derive(Debug, Serialize, Deserialize)]
    struct Flaky {
        id: String,
        fail: bool,
        panic: bool,
    }

    #[async_trait]
    impl Task for Flaky {
        fn id(&self) -> &str {
            &self.id
        }
        fn kind(&self) -> &'static str {
            Self::KIND
        }
        fn state(&self) -> Result<serde_json::Value, CodecError> {
            snapshot(self)
        }
        async fn execute(&mut self) -> Result<(), ExecutionError> {
            if self.panic {
                panic!("boom");
            }
            if self.fail {
                return Err(ExecutionError::new("flaky failure"));
            }
            Ok(())
        }
    }

    impl TaskKind for Flaky {
        const KIND: &'static str = "test.flaky";
    }

    fn harness() -> (mpsc::Sender<String>, Arc<MemoryStore>, ActiveCounter, Bus, CancellationToken) {
        let mut registry = TaskRegistry::new();
        registry.register::<Flaky>().unwrap();
        let codec = Arc::new(Codec::new(registry));
        let store = Arc::new(MemoryStore::new(codec));
        let active = ActiveCounter::new();
        let bus = Bus::new(64);
        let (tx, rx) = mpsc::channel(8);
        let stop = CancellationToken::new();

        let worker = Worker::new(1, rx, store.clone(), active.clone(), bus.clone());
        let (ready_tx, _ready_rx) = mpsc::channel(1);
        tokio::spawn(worker.run(stop.clone(), ready_tx));

        (tx, store, active, bus, stop)
    }

    async fn dispatch(
        tx: &mpsc::Sender<String>,
        store: &Arc<MemoryStore>,
        active: &ActiveCounter,
        task: Flaky,
    ) {
        let token = store.save(&task).await.unwrap();
        active.increment();
        tx.send(Frame::new(1, token.into_string()).encode())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn success_is_marked_completed_and_counter_drops() {
        let (tx, store, active, bus, _stop) = harness();
        let mut rx = bus.subscribe();

        let task = Flaky {
            id: "t-1".into(),
            fail: false,
            panic: false,
        };
        dispatch(&tx, &store, &active, task).await;

        let ev = loop {
            let ev = rx.recv().await.unwrap();
            if ev.is_completion() {
                break ev;
            }
        };
        assert_eq!(ev.kind, EventKind::TaskCompleted);
        assert_eq!(ev.task_id.as_deref(), Some("t-1"));
        assert!(ev.task.is_some());
        assert_eq!(active.get(), 0);
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_and_panic_fault_without_killing_the_loop() {
        let (tx, store, active, bus, _stop) = harness();
        let mut rx = bus.subscribe();

        let failing = Flaky {
            id: "t-fail".into(),
            fail: true,
            panic: false,
        };
        let panicking = Flaky {
            id: "t-panic".into(),
            fail: false,
            panic: true,
        };
        let healthy = Flaky {
            id: "t-ok".into(),
            fail: false,
            panic: false,
        };
        dispatch(&tx, &store, &active, failing).await;
        dispatch(&tx, &store, &active, panicking).await;
        dispatch(&tx, &store, &active, healthy).await;

        let mut outcomes = Vec::new();
        while outcomes.len() < 3 {
            let ev = rx.recv().await.unwrap();
            if ev.is_completion() {
                outcomes.push((ev.task_id.as_deref().unwrap().to_string(), ev.kind));
            }
        }
        assert_eq!(outcomes[0], ("t-fail".to_string(), EventKind::TaskFaulted));
        assert_eq!(outcomes[1], ("t-panic".to_string(), EventKind::TaskFaulted));
        assert_eq!(outcomes[2], ("t-ok".to_string(), EventKind::TaskCompleted));
        assert_eq!(active.get(), 0);
    }

    #[tokio::test]
    async fn undecodable_token_is_faulted_by_raw_token() {
        let (tx, _store, active, bus, _stop) = harness();
        let mut rx = bus.subscribe();

        active.increment();
        tx.send(Frame::new(1, "no-such-record").encode())
            .await
            .unwrap();

        let ev = loop {
            let ev = rx.recv().await.unwrap();
            if ev.is_completion() {
                break ev;
            }
        };
        assert_eq!(ev.kind, EventKind::TaskFaulted);
        assert_eq!(ev.task_id.as_deref(), Some("no-such-record"));
        assert!(ev.task.is_none());
        assert_eq!(active.get(), 0);
    }
}
