//! Queue events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to notifications emitted by the dispatcher, the
//! forwarding device and the slot-bound workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskQueue` (dispatch/lifecycle), `Device` (routing),
//!   `Worker` (readiness and completion).
//! - **Consumer**: the queue's subscriber listener, which fans events out to
//!   the registered [`Subscribe`](crate::subscribers::Subscribe) observers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
