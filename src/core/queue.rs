//! TaskQueue: the public facade over dispatcher, device, and worker pool.
//!
//! ## Lifecycle
//! ```text
//! build ──► start ──► submit* ──► shutdown
//!             │                      │
//!             ├─ orphan recovery     ├─ cancel + grace-bounded join
//!             ├─ bind device         └─ PoolStopped | GraceExceeded
//!             ├─ spawn N workers
//!             └─ await N ready signals
//! ```
//!
//! ## Rules
//! - `start` and `shutdown` are idempotent; a second call is a no-op.
//! - Orphan recovery runs **before** the first dispatch is accepted, so a
//!   recovered record can never race a fresh submission for the same id.
//! - A task faulting (or panicking) never surfaces through `submit` or
//!   `shutdown`; per-task outcomes travel on the event bus.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::dispatch::{ActiveCounter, RoundRobin};
use crate::core::worker::Worker;
use crate::device::{Device, DeviceHandle, Frame};
use crate::error::{DispatchError, QueueError};
use crate::events::{Bus, Event, EventKind};
use crate::store::{CompletionTag, TaskStore};
use crate::subscribers::SubscriberSet;
use crate::tasks::BoxedTask;

/// Live resources of a started queue, dropped wholesale at shutdown.
struct Running {
    handle: DeviceHandle,
    stop: CancellationToken,
    pool: JoinSet<usize>,
}

/// Durable, at-most-once-per-slot task dispatch queue.
///
/// Built via [`TaskQueueBuilder`](crate::TaskQueueBuilder). All methods
/// take `&self`; the queue is designed to be shared behind an `Arc`.
pub struct TaskQueue {
    cfg: Config,
    store: Arc<dyn TaskStore>,
    events: Bus,
    subscribers: Arc<SubscriberSet>,
    active: ActiveCounter,
    cursor: Mutex<RoundRobin>,
    state: RwLock<Option<Running>>,
}

impl TaskQueue {
    pub(crate) fn new(
        cfg: Config,
        store: Arc<dyn TaskStore>,
        events: Bus,
        subscribers: Arc<SubscriberSet>,
    ) -> Self {
        let slots = cfg.pool_size_clamped();
        Self {
            cfg,
            store,
            events,
            subscribers,
            active: ActiveCounter::new(),
            cursor: Mutex::new(RoundRobin::new(slots)),
            state: RwLock::new(None),
        }
    }

    /// Starts the queue: recovers orphans, binds the device, spawns the
    /// pool, and waits for every worker's ready signal.
    ///
    /// Idempotent; calling `start` on a running queue is a no-op.
    pub async fn start(&self) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Ok(());
        }

        // Recover before accepting any dispatches: records left pending by
        // a prior run are terminally tagged and never re-executed.
        for id in self.store.list_pending().await? {
            self.store
                .mark_outcome(&id, CompletionTag::Orphaned)
                .await?;
        }

        let slots = self.cfg.pool_size_clamped();
        self.cursor.lock().await.reset(slots);

        let stop = CancellationToken::new();
        let (device, handle, receivers) =
            Device::bind(self.cfg.fanout_addr.clone(), slots, self.events.clone());

        let mut pool = JoinSet::new();
        {
            let stop = stop.clone();
            pool.spawn(async move {
                device.run(stop).await;
                0 // sentinel: not a worker slot
            });
        }

        let (ready_tx, mut ready_rx) = mpsc::channel::<usize>(slots);
        for (i, rx) in receivers.into_iter().enumerate() {
            let worker = Worker::new(
                i + 1,
                rx,
                Arc::clone(&self.store),
                self.active.clone(),
                self.events.clone(),
            );
            pool.spawn(worker.run(stop.clone(), ready_tx.clone()));
        }
        drop(ready_tx);

        for _ in 0..slots {
            match time::timeout(self.cfg.ready_timeout, ready_rx.recv()).await {
                Ok(Some(_slot)) => {}
                Ok(None) | Err(_) => {
                    stop.cancel();
                    pool.abort_all();
                    return Err(QueueError::ReadyTimeout {
                        waited: self.cfg.ready_timeout,
                    });
                }
            }
        }

        *state = Some(Running { handle, stop, pool });
        Ok(())
    }

    /// Persists, counts, and publishes one task to the next slot in the
    /// round-robin cycle.
    ///
    /// On any failure the task is not counted active and nothing reaches a
    /// worker. The chosen slot is consumed either way, matching the cursor
    /// contract of one advance per call.
    pub async fn submit(&self, task: BoxedTask) -> Result<(), DispatchError> {
        let handle = {
            let state = self.state.read().await;
            match state.as_ref() {
                Some(running) => running.handle.clone(),
                None => return Err(DispatchError::NotRunning),
            }
        };

        let slot = self.cursor.lock().await.next();
        let token = self.store.save(task.as_ref()).await?;
        let id = task.id().to_string();

        self.active.increment();
        let wire = Frame::new(slot, token.into_string()).encode();
        if let Err(e) = handle.publish(wire).await {
            // The frame never left; un-count it.
            self.active.decrement();
            return Err(e);
        }

        self.events.publish(
            Event::now(EventKind::TaskDispatched)
                .with_slot(slot)
                .with_task_id(id),
        );
        Ok(())
    }

    /// Stops the queue: cancels the pool and joins it within the grace
    /// period.
    ///
    /// Idempotent; calling `shutdown` on a stopped queue is a no-op. Workers
    /// finish their in-flight task before exiting; a worker still busy when
    /// the grace expires is abandoned and reported in
    /// [`QueueError::GraceExceeded`].
    pub async fn shutdown(&self) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        let Some(mut running) = state.take() else {
            return Ok(());
        };

        self.events.publish(Event::now(EventKind::ShutdownRequested));
        running.stop.cancel();
        drop(running.handle);

        let slots = self.cfg.pool_size_clamped();
        let mut joined = vec![false; slots + 1];
        let all_joined = time::timeout(self.cfg.grace, async {
            while let Some(res) = running.pool.join_next().await {
                if let Ok(slot) = res {
                    if (1..=slots).contains(&slot) {
                        joined[slot] = true;
                    }
                }
            }
        })
        .await;

        match all_joined {
            Ok(()) => {
                self.events.publish(Event::now(EventKind::PoolStopped));
                Ok(())
            }
            Err(_elapsed) => {
                running.pool.abort_all();
                self.events.publish(Event::now(EventKind::GraceExceeded));
                let busy = (1..=slots)
                    .filter(|s| !joined[*s])
                    .map(|s| format!("{s:04}"))
                    .collect();
                Err(QueueError::GraceExceeded {
                    grace: self.cfg.grace,
                    busy,
                })
            }
        }
    }

    /// Number of dispatched tasks that have not yet reached a terminal
    /// outcome. Zero once the queue is drained.
    ///
    /// The count is exact at quiescent points. While a `submit` is mid
    /// flight a concurrent poll may briefly see its task counted before the
    /// publish lands (a rejected publish is un-counted before `submit`
    /// returns).
    pub fn active(&self) -> u64 {
        self.active.get()
    }

    /// The queue's event bus, for raw subscriptions alongside the
    /// registered [`Subscribe`](crate::subscribers::Subscribe) observers.
    pub fn events(&self) -> &Bus {
        &self.events
    }

    /// The store the queue dispatches through.
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// True while the queue accepts submissions.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Number of registered event subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
