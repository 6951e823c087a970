//! Shared fixtures for the integration tests: four arithmetic task kinds
//! and a recording subscriber.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use taskfan::{
    next_task_id, snapshot, CodecError, Event, EventKind, ExecutionError, Subscribe, Task,
    TaskKind, TaskRegistry,
};

macro_rules! arithmetic_task {
    ($name:ident, $tag:literal, |$left:ident, $right:ident| $body:expr) => {
        #[derive(Debug, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            pub left: f64,
            pub right: f64,
            pub output: Option<f64>,
        }

        impl $name {
            pub fn new(left: f64, right: f64) -> Self {
                Self {
                    id: next_task_id(),
                    left,
                    right,
                    output: None,
                }
            }
        }

        #[async_trait]
        impl Task for $name {
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
                let $left = self.left;
                let $right = self.right;
                self.output = Some($body);
                Ok(())
            }
        }

        impl TaskKind for $name {
            const KIND: &'static str = $tag;
        }
    };
}

arithmetic_task!(DoAdd, "math.add", |a, b| a + b);
arithmetic_task!(DoSubtract, "math.subtract", |a, b| a - b);
arithmetic_task!(DoMultiply, "math.multiply", |a, b| a * b);

/// Division faults on a zero divisor instead of yielding infinity.
#[derive(Debug, Serialize, Deserialize)]
pub struct DoDivide {
    pub id: String,
    pub left: f64,
    pub right: f64,
    pub output: Option<f64>,
}

impl DoDivide {
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            id: next_task_id(),
            left,
            right,
            output: None,
        }
    }
}

#[async_trait]
impl Task for DoDivide {
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

impl TaskKind for DoDivide {
    const KIND: &'static str = "math.divide";
}

/// Registry covering all four arithmetic kinds.
pub fn arithmetic_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register::<DoAdd>().unwrap();
    registry.register::<DoSubtract>().unwrap();
    registry.register::<DoMultiply>().unwrap();
    registry.register::<DoDivide>().unwrap();
    registry
}

/// Reads the `output` field from an executed task carried by an event.
pub fn output_of(ev: &Event) -> Option<f64> {
    let task = ev.task.as_ref()?;
    task.state().ok()?.get("output")?.as_f64()
}

/// Subscriber that records completion outcomes and signals each arrival.
pub struct Recorder {
    outcomes: Mutex<Vec<(String, EventKind)>>,
    notify: mpsc::Sender<()>,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(64);
        let recorder = Arc::new(Self {
            outcomes: Mutex::new(Vec::new()),
            notify: tx,
        });
        (recorder, rx)
    }

    pub fn outcomes(&self) -> Vec<(String, EventKind)> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        if event.is_completion() {
            let id = event.task_id.as_deref().unwrap_or("?").to_string();
            self.outcomes.lock().unwrap().push((id, event.kind));
            let _ = self.notify.send(()).await;
        }
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
