//! Builder wiring configuration, task registry, store, and subscribers
//! into a [`TaskQueue`].

use std::sync::Arc;

use crate::codec::{Codec, TaskRegistry};
use crate::core::config::{Config, StoreStrategy};
use crate::core::queue::TaskQueue;
use crate::error::QueueError;
use crate::events::Bus;
use crate::store::{FsStore, InlineStore, MemoryStore, TaskStore};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`TaskQueue`].
///
/// The registry tells the queue how to reconstruct every task kind the
/// application will submit; register all kinds before building.
///
/// # Example
/// ```no_run
/// use taskfan::{Config, StoreStrategy, TaskKind, TaskQueueBuilder, TaskRegistry};
///
/// # use async_trait::async_trait;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Serialize, Deserialize)]
/// # struct MyTask { id: String }
/// # #[async_trait]
/// # impl taskfan::Task for MyTask {
/// #     fn id(&self) -> &str { &self.id }
/// #     fn kind(&self) -> &'static str { Self::KIND }
/// #     fn state(&self) -> Result<serde_json::Value, taskfan::CodecError> {
/// #         taskfan::tasks::snapshot(self)
/// #     }
/// #     async fn execute(&mut self) -> Result<(), taskfan::ExecutionError> { Ok(()) }
/// # }
/// # impl taskfan::TaskKind for MyTask { const KIND: &'static str = "my.task"; }
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry = TaskRegistry::new();
/// registry.register::<MyTask>()?;
///
/// let mut cfg = Config::default();
/// cfg.store = StoreStrategy::Memory;
///
/// let queue = TaskQueueBuilder::new(cfg)
///     .with_registry(registry)
///     .build()
///     .await?;
/// queue.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct TaskQueueBuilder {
    cfg: Config,
    registry: TaskRegistry,
    subscribers: Vec<Arc<dyn Subscribe>>,
    store: Option<Arc<dyn TaskStore>>,
}

impl TaskQueueBuilder {
    /// Starts a builder from the given configuration.
    #[must_use]
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            registry: TaskRegistry::new(),
            subscribers: Vec::new(),
            store: None,
        }
    }

    /// Sets the decoder registry used to reconstruct dispatched tasks.
    #[must_use]
    pub fn with_registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers event subscribers (observers of dispatch and outcome
    /// events).
    #[must_use]
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subs;
        self
    }

    /// Injects a store, overriding the strategy named in the config.
    ///
    /// The injected store owns its own codec; the builder's registry is not
    /// consulted for it.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the queue: constructs the configured store strategy, wires
    /// the event bus, and spawns the subscriber fan-out listener.
    ///
    /// Must be called within a tokio runtime.
    pub async fn build(self) -> Result<TaskQueue, QueueError> {
        let store: Arc<dyn TaskStore> = match self.store {
            Some(store) => store,
            None => {
                let codec = Arc::new(Codec::new(self.registry));
                match self.cfg.store.clone() {
                    StoreStrategy::FileSystem { root, retention } => {
                        Arc::new(FsStore::open(root, retention, codec).await?)
                    }
                    StoreStrategy::Memory => Arc::new(MemoryStore::new(codec)),
                    StoreStrategy::Inline => Arc::new(InlineStore::new(codec)),
                }
            }
        };

        let events = Bus::new(self.cfg.bus_capacity);
        let subscribers = Arc::new(SubscriberSet::new(self.subscribers));

        // One listener bridges the broadcast bus into the per-subscriber
        // queues; it ends when the queue (the last bus sender) is dropped.
        if !subscribers.is_empty() {
            let set = Arc::clone(&subscribers);
            let mut rx = events.subscribe();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(ev) => set.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }

        Ok(TaskQueue::new(self.cfg, store, events, subscribers))
    }
}
