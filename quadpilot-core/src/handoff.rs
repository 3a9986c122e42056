//! Snapshot Hand-off into the Control Loop
//!
//! ## Overview
//!
//! Sensor acquisition and telemetry may run on their own thread or in an
//! interrupt handler. They never touch pipeline state directly; they build a
//! complete [`TickInput`] and hand it over by value through a bounded
//! single-producer/single-consumer queue:
//!
//! ```text
//! Producer (ISR / thread)                     Consumer (control loop)
//!      ↓                                             ↓
//!  try_send(TickInput) ──→ heapless::spsc ──→ poll_next() / latest()
//!      ↓                                             ↓
//!  Err(input) when full                  WouldBlock when empty
//! ```
//!
//! ## Capacity
//!
//! `heapless::spsc::Queue<_, N>` keeps one slot free, so `N` slots hold
//! `N - 1` snapshots. [`HANDOFF_QUEUE_CAPACITY`] is the crate default.
//!
//! ## Staleness
//!
//! A control loop that only cares about the freshest snapshot calls
//! [`SnapshotReceiver::latest`], which drains the queue and keeps the last
//! entry. Detecting a stalled producer is left to the transport layer.
//!
//! ```rust
//! use quadpilot_core::handoff::SnapshotQueue;
//! use quadpilot_core::pipeline::TickInput;
//!
//! let mut queue: SnapshotQueue<4> = SnapshotQueue::new();
//! let (mut tx, mut rx) = queue.split();
//!
//! assert!(rx.poll_next().is_err());
//! tx.try_send(TickInput::default()).unwrap();
//! assert!(rx.poll_next().is_ok());
//! ```

use core::convert::Infallible;

use heapless::spsc::{Consumer, Producer, Queue};

use crate::constants::buffers::HANDOFF_QUEUE_CAPACITY;
use crate::pipeline::TickInput;

/// Queue with the crate's default number of slots
pub type DefaultSnapshotQueue = SnapshotQueue<HANDOFF_QUEUE_CAPACITY>;

/// Bounded SPSC queue of tick inputs
///
/// Statically allocatable; split it once and move the halves to their
/// threads.
pub struct SnapshotQueue<const N: usize> {
    queue: Queue<TickInput, N>,
}

impl<const N: usize> SnapshotQueue<N> {
    /// Empty queue
    pub const fn new() -> Self {
        Self { queue: Queue::new() }
    }

    /// Snapshots the queue can hold at once
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Producer and consumer halves
    pub fn split(&mut self) -> (SnapshotSender<'_, N>, SnapshotReceiver<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            SnapshotSender { producer, rejected: 0 },
            SnapshotReceiver { consumer },
        )
    }
}

impl<const N: usize> Default for SnapshotQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half
pub struct SnapshotSender<'a, const N: usize> {
    producer: Producer<'a, TickInput, N>,
    rejected: u32,
}

impl<'a, const N: usize> SnapshotSender<'a, N> {
    /// Enqueue a snapshot, handing it back if the queue is full
    pub fn try_send(&mut self, input: TickInput) -> Result<(), TickInput> {
        self.producer.enqueue(input).map_err(|input| {
            self.rejected = self.rejected.wrapping_add(1);
            log_debug!("handoff: queue full, snapshot rejected ({} so far)", self.rejected);
            input
        })
    }

    /// Room for at least one more snapshot
    pub fn ready(&self) -> bool {
        self.producer.ready()
    }

    /// Snapshots rejected because the queue was full
    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}

/// Consumer half
pub struct SnapshotReceiver<'a, const N: usize> {
    consumer: Consumer<'a, TickInput, N>,
}

impl<'a, const N: usize> SnapshotReceiver<'a, N> {
    /// Oldest pending snapshot
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while the queue is empty.
    pub fn poll_next(&mut self) -> nb::Result<TickInput, Infallible> {
        self.consumer.dequeue().ok_or(nb::Error::WouldBlock)
    }

    /// Drain the queue, keeping only the newest snapshot
    pub fn latest(&mut self) -> Option<TickInput> {
        let mut newest = None;
        while let Some(input) = self.consumer.dequeue() {
            newest = Some(input);
        }
        newest
    }

    /// Snapshots waiting
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Nothing waiting
    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }
}
