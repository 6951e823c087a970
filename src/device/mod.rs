//! # Forwarding device: the broker between the dispatcher and the pool.
//!
//! The [`Device`] binds the internal fan-out address, receives wire frames
//! from the dispatcher on a frontend channel, and forwards each frame to
//! the per-slot backend queue its 4-digit prefix addresses. Workers pull
//! from their own backend queue, so delivery to one slot never blocks on
//! another slot's consumer.
//!
//! ## Architecture
//! ```text
//!  submit() ──► [frontend queue] ──► Device::run ──┬──► [slot 1 queue] ─► worker 1
//!                 (DeviceHandle)     (route by      ├──► [slot 2 queue] ─► worker 2
//!                                     4-digit       └──► [slot N queue] ─► worker N
//!                                     prefix)
//! ```
//!
//! ## Rules
//! - Frames for the same slot are forwarded in arrival order (FIFO per
//!   slot); there is no ordering across slots.
//! - The dispatcher clamps slots into range before send; a frame the device
//!   cannot route (malformed, out of range, dead or full backend) is
//!   dropped with a [`FrameDropped`](crate::events::EventKind::FrameDropped)
//!   event, never re-delivered elsewhere.
//! - Forwarding never awaits a backend: a slot whose queue is full loses
//!   the frame instead of stalling the routing loop. The persisted record
//!   stays pending and is orphan-recovered at the next start.
//! - The device stops when cancelled or when every dispatcher handle is
//!   dropped.

mod frame;

pub use frame::{Frame, FrameError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::events::{Bus, Event, EventKind};

/// Depth of the frontend and of each per-slot backend queue.
const CHANNEL_DEPTH: usize = 1024;

/// Dispatcher-side handle to the bound device.
///
/// Cheap to clone; dropping every clone releases the frontend and stops the
/// device once drained.
#[derive(Clone)]
pub struct DeviceHandle {
    addr: String,
    tx: mpsc::Sender<String>,
}

impl DeviceHandle {
    /// Publishes one wire frame to the device.
    ///
    /// Fails with [`DispatchError::BusUnavailable`] once the device is gone.
    pub async fn publish(&self, wire: String) -> Result<(), DispatchError> {
        self.tx
            .send(wire)
            .await
            .map_err(|_| DispatchError::BusUnavailable {
                addr: self.addr.clone(),
            })
    }

    /// The bound fan-out address this handle publishes to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

/// Central forwarding device plus its per-slot backend queues.
pub struct Device {
    addr: String,
    frontend: mpsc::Receiver<String>,
    backends: Vec<mpsc::Sender<String>>,
    events: Bus,
}

impl Device {
    /// Binds the fan-out address for a pool of `slots` workers.
    ///
    /// Returns the device itself (drive it with [`Device::run`]), the
    /// dispatcher handle, and one frame receiver per slot, index `i`
    /// serving slot `i + 1`.
    pub fn bind(
        addr: impl Into<String>,
        slots: usize,
        events: Bus,
    ) -> (Self, DeviceHandle, Vec<mpsc::Receiver<String>>) {
        let addr = addr.into();
        let (front_tx, front_rx) = mpsc::channel(CHANNEL_DEPTH);

        let mut backends = Vec::with_capacity(slots);
        let mut receivers = Vec::with_capacity(slots);
        for _ in 0..slots {
            let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
            backends.push(tx);
            receivers.push(rx);
        }

        let handle = DeviceHandle {
            addr: addr.clone(),
            tx: front_tx,
        };
        let device = Self {
            addr,
            frontend: front_rx,
            backends,
            events,
        };
        (device, handle, receivers)
    }

    /// Runs the routing loop until cancellation or frontend closure.
    pub async fn run(mut self, stop: CancellationToken) {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                frame = self.frontend.recv() => match frame {
                    Some(wire) => self.route(wire),
                    None => break,
                },
            }
        }
    }

    /// Forwards one frame to its slot queue, or drops it loudly.
    fn route(&self, wire: String) {
        let frame = match Frame::parse(&wire) {
            Ok(f) => f,
            Err(e) => {
                self.drop_frame(format!("unparseable frame at '{}': {e}", self.addr));
                return;
            }
        };

        let backend = match frame.slot.checked_sub(1).and_then(|i| self.backends.get(i)) {
            Some(tx) => tx,
            None => {
                self.drop_frame(format!(
                    "slot {:04} out of range 1..={}",
                    frame.slot,
                    self.backends.len()
                ));
                return;
            }
        };

        // try_send keeps the loop from blocking on one slot's backlog;
        // a stalled worker must never delay delivery to the other slots.
        match backend.try_send(wire) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.drop_frame(format!("slot {:04} queue is full", frame.slot));
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.drop_frame(format!("slot {:04} receiver is gone", frame.slot));
            }
        }
    }

    fn drop_frame(&self, reason: String) {
        self.events
            .publish(Event::now(EventKind::FrameDropped).with_reason(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness(slots: usize) -> (DeviceHandle, Vec<mpsc::Receiver<String>>, Bus, CancellationToken) {
        let bus = Bus::new(64);
        let (device, handle, receivers) = Device::bind("inproc://test_q", slots, bus.clone());
        let stop = CancellationToken::new();
        tokio::spawn(device.run(stop.clone()));
        (handle, receivers, bus, stop)
    }

    #[tokio::test]
    async fn routes_frames_to_their_slot_in_order() {
        let (handle, mut receivers, _bus, _stop) = harness(2);

        handle.publish(Frame::new(1, "a").encode()).await.unwrap();
        handle.publish(Frame::new(2, "b").encode()).await.unwrap();
        handle.publish(Frame::new(1, "c").encode()).await.unwrap();

        assert_eq!(receivers[0].recv().await.unwrap(), "0001 a");
        assert_eq!(receivers[0].recv().await.unwrap(), "0001 c");
        assert_eq!(receivers[1].recv().await.unwrap(), "0002 b");
    }

    #[tokio::test]
    async fn out_of_range_slot_is_dropped_with_event() {
        let (handle, _receivers, bus, _stop) = harness(2);
        let mut rx = bus.subscribe();

        handle.publish(Frame::new(3, "x").encode()).await.unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::FrameDropped);
        assert!(ev.reason.as_deref().unwrap().contains("out of range"));
    }

    #[tokio::test]
    async fn full_slot_backlog_never_stalls_other_slots() {
        let (handle, mut receivers, bus, _stop) = harness(2);
        let mut events = bus.subscribe();

        // Leave slot 1 undrained and push one frame past its queue depth.
        for i in 0..=CHANNEL_DEPTH {
            handle
                .publish(Frame::new(1, format!("t-{i}")).encode())
                .await
                .unwrap();
        }
        handle.publish(Frame::new(2, "other").encode()).await.unwrap();

        // Slot 2 delivery must not wait on slot 1's backlog.
        let got = tokio::time::timeout(std::time::Duration::from_secs(2), receivers[1].recv())
            .await
            .expect("slot 2 delivery stalled behind slot 1's backlog")
            .unwrap();
        assert_eq!(got, "0002 other");

        // The overflowing slot 1 frame was dropped loudly, not queued.
        let ev = loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::FrameDropped {
                break ev;
            }
        };
        assert!(ev.reason.as_deref().unwrap().contains("queue is full"));
    }

    #[tokio::test]
    async fn publish_after_stop_is_bus_unavailable() {
        let bus = Bus::new(64);
        let (device, handle, receivers) = Device::bind("inproc://test_q", 1, bus);
        drop(device);
        drop(receivers);

        let err = handle
            .publish(Frame::new(1, "x").encode())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::BusUnavailable { addr } if addr == "inproc://test_q"));
    }
}
