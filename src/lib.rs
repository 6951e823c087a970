//! # taskfan
//!
//! **Taskfan** is a durable task dispatch library for Rust.
//!
//! It fans submitted tasks out over a fixed pool of slot-bound workers with
//! at-most-once delivery per slot, persisting every task before publish so
//! that work interrupted by an unclean shutdown is recovered (and terminally
//! tagged) at the next start instead of silently lost.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            submit(task)
//!                 │
//! ┌───────────────▼───────────────────────────────────────────────┐
//! │  TaskQueue (facade)                                           │
//! │  - RoundRobin cursor (slot per submission, 1..=N cycling)     │
//! │  - TaskStore (persist before publish)                         │
//! │  - ActiveCounter (dispatched minus finished)                  │
//! │  - Bus (broadcast events)                                     │
//! └───────────────┬───────────────────────────────────────────────┘
//!                 │ "{slot:04} {token}"
//!                 ▼
//!       ┌──────────────────┐
//!       │      Device      │   routes by 4-digit slot prefix,
//!       │ (forwarding loop)│   FIFO per slot, drops the unroutable
//!       └──┬──────┬─────┬──┘
//!          ▼      ▼     ▼
//!      ┌──────┐┌──────┐┌──────┐
//!      │Worker││Worker││Worker│   load ► execute ► mark_outcome
//!      │ 0001 ││ 0002 ││ 000N │   ► decrement ► publish outcome
//!      └──┬───┘└──┬───┘└──┬───┘
//!         │       │       │
//!         ▼       ▼       ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast channel)                    │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 ▼
//!                     ┌───────────────────────┐
//!                     │  subscriber listener  │
//!                     │    (per TaskQueue)    │
//!                     └───────────┬───────────┘
//!                                 ▼
//!                           SubscriberSet
//!                         (per-sub queues)
//!                      ┌─────────┼─────────┐
//!                      ▼         ▼         ▼
//!                    sub1.on   sub2.on   subN.on
//!                    _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskQueueBuilder ──► TaskQueue::start()
//!
//! start {
//!   ├─► list_pending() ──► mark_outcome(orphaned) for each   (recovery)
//!   ├─► reset round-robin cursor to slot 1
//!   ├─► bind device, spawn routing loop
//!   ├─► spawn N workers (slot 1..=N)
//!   └─► await N ready signals (or ReadyTimeout)
//! }
//!
//! submit(task) {
//!   ├─► slot = cursor.next()          (one advance per call)
//!   ├─► token = store.save(task)      (duplicate id fails loudly)
//!   ├─► active += 1
//!   ├─► publish "{slot:04} {token}"   (on failure: active -= 1, error)
//!   └─► event TaskDispatched
//! }
//!
//! worker loop {
//!   ├─► task = store.load(token)      (undecodable ─► faulted, continue)
//!   ├─► task.execute()                (error/panic contained)
//!   ├─► store.mark_outcome(completed | faulted)
//!   ├─► active -= 1                   (every terminal path)
//!   └─► event TaskCompleted | TaskFaulted (carries the executed task)
//! }
//!
//! shutdown {
//!   ├─► event ShutdownRequested, cancel pool
//!   ├─► join within grace ──► PoolStopped
//!   └─► grace exceeded    ──► GraceExceeded { busy slots }
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------------|-------------------------------------------|
//! | **Dispatch**      | Round-robin fan-out over a fixed slot-bound worker pool.            | [`TaskQueue`], [`Config`]                 |
//! | **Persistence**   | Pluggable durable store; pending work survives restarts.            | [`TaskStore`], [`StoreStrategy`]          |
//! | **Codec**         | Tagged-envelope (de)hydration of polymorphic tasks.                 | [`Codec`], [`TaskRegistry`], [`TaskKind`] |
//! | **Subscriber API**| Observe readiness, dispatch, and outcome events.                    | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors split by dispatch, store, codec, and lifecycle.        | [`DispatchError`], [`QueueError`]         |
//! | **Tasks**         | Define serializable units of work with typed outputs.               | [`Task`], [`TaskKind`]                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use serde::{Deserialize, Serialize};
//! use taskfan::{
//!     next_task_id, snapshot, CodecError, Config, ExecutionError, StoreStrategy, Task,
//!     TaskKind, TaskQueueBuilder, TaskRegistry,
//! };
//!
//! #[derive(Serialize, Deserialize)]
//! struct Greet {
//!     id: String,
//!     name: String,
//! }
//!
//! #[async_trait]
//! impl Task for Greet {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!     fn kind(&self) -> &'static str {
//!         Self::KIND
//!     }
//!     fn state(&self) -> Result<serde_json::Value, CodecError> {
//!         snapshot(self)
//!     }
//!     async fn execute(&mut self) -> Result<(), ExecutionError> {
//!         println!("hello, {}!", self.name);
//!         Ok(())
//!     }
//! }
//!
//! impl TaskKind for Greet {
//!     const KIND: &'static str = "demo.greet";
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = TaskRegistry::new();
//!     registry.register::<Greet>()?;
//!
//!     let mut cfg = Config::default();
//!     cfg.pool_size = 2;
//!     cfg.store = StoreStrategy::Memory;
//!
//!     let queue = TaskQueueBuilder::new(cfg)
//!         .with_registry(registry)
//!         .build()
//!         .await?;
//!
//!     queue.start().await?;
//!     queue
//!         .submit(Box::new(Greet {
//!             id: next_task_id(),
//!             name: "world".into(),
//!         }))
//!         .await?;
//!     queue.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod core;

pub mod codec;
pub mod device;
pub mod error;
pub mod events;
pub mod store;
pub mod subscribers;
pub mod tasks;

// ---- Public re-exports ----

pub use codec::{Codec, TaskRegistry};
pub use core::{Config, StoreStrategy, TaskQueue, TaskQueueBuilder};
pub use error::{CodecError, DispatchError, ExecutionError, QueueError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use store::{CompletionTag, FsStore, InlineStore, MemoryStore, Retention, TaskStore, Token};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{next_task_id, snapshot, BoxedTask, Task, TaskKind, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
