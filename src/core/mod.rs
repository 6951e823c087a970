//! Runtime core: dispatch, lifecycle, and the worker pool.
//!
//! The public API from this module is [`TaskQueue`] (built via
//! [`TaskQueueBuilder`]) plus its [`Config`].
//!
//! Internal modules:
//! - [`dispatch`]: round-robin slot cursor and the active-task counter;
//! - [`worker`]: per-slot consumer loop with fault isolation;
//! - [`queue`]: the facade orchestrating startup, submission, and shutdown;
//! - [`builder`]: wires config, registry, store, and subscribers together.

mod builder;
mod config;
mod dispatch;
mod queue;
mod worker;

pub use builder::TaskQueueBuilder;
pub use config::{Config, StoreStrategy};
pub use queue::TaskQueue;
