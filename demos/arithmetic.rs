//! Arithmetic dispatch demo.
//!
//! Run with:
//! ```bash
//! cargo run --example arithmetic --features logging
//! ```
//!
//! Builds a two-worker queue over an in-memory store, fans four arithmetic
//! tasks across the slots, and prints every event via [`LogWriter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use taskfan::{
    next_task_id, snapshot, CodecError, Config, ExecutionError, LogWriter, StoreStrategy,
    Subscribe, Task, TaskKind, TaskQueueBuilder, TaskRegistry,
};

#[derive(Debug, Serialize, Deserialize)]
struct Add {
    id: String,
    left: f64,
    right: f64,
    output: Option<f64>,
}

impl Add {
    fn new(left: f64, right: f64) -> Self {
        Self {
            id: next_task_id(),
            left,
            right,
            output: None,
        }
    }
}

#[async_trait]
impl Task for Add {
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
        self.output = Some(self.left + self.right);
        Ok(())
    }
}

impl TaskKind for Add {
    const KIND: &'static str = "demo.add";
}

#[derive(Debug, Serialize, Deserialize)]
struct Divide {
    id: String,
    left: f64,
    right: f64,
    output: Option<f64>,
}

impl Divide {
    fn new(left: f64, right: f64) -> Self {
        Self {
            id: next_task_id(),
            left,
            right,
            output: None,
        }
    }
}

#[async_trait]
impl Task for Divide {
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
        if self.right == 0.0 {
            return Err(ExecutionError::new("division by zero"));
        }
        self.output = Some(self.left / self.right);
        Ok(())
    }
}

impl TaskKind for Divide {
    const KIND: &'static str = "demo.divide";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = TaskRegistry::new();
    registry.register::<Add>()?;
    registry.register::<Divide>()?;

    let mut cfg = Config::default();
    cfg.pool_size = 2;
    cfg.store = StoreStrategy::Memory;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let queue = TaskQueueBuilder::new(cfg)
        .with_registry(registry)
        .with_subscribers(subs)
        .build()
        .await?;

    queue.start().await?;

    queue.submit(Box::new(Add::new(10.0, 20.0))).await?;
    queue.submit(Box::new(Add::new(2.5, 0.5))).await?;
    queue.submit(Box::new(Divide::new(10.0, 4.0))).await?;
    queue.submit(Box::new(Divide::new(1.0, 0.0))).await?;

    // Give the pool a moment to drain before stopping.
    while queue.active() > 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    queue.shutdown().await?;
    Ok(())
}
