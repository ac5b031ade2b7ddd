//! Bounded blocking FIFO used to circulate audio buffers.
//!
//! The pipeline uses two of these in a closed loop: `backstock` carries
//! spent buffers back to the renderer and `playable` carries rendered
//! buffers to playback. A fixed number of buffers circulates, so nothing is
//! allocated on the audio path after startup.

use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

/// A fixed-capacity FIFO whose `enqueue` blocks while full and whose
/// `dequeue` blocks while empty.
///
/// Both ends of a bounded channel live in the queue, so sends and receives
/// never fail on disconnection.
#[derive(Debug)]
pub struct RecyclingQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    /// Dropped by [`interrupt`](Self::interrupt) to wake waiters.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
}

impl<T> RecyclingQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        let (tx, rx) = bounded(capacity);
        let (shutdown_tx, shutdown_rx) = bounded(0);
        Self {
            tx,
            rx,
            capacity,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
        }
    }

    /// Appends `item`, waiting for space if the queue is full.
    pub fn enqueue(&self, item: T) {
        // The receiver lives in `self`, so this only waits for room.
        let _ = self.tx.send(item);
    }

    /// Appends `item` only if there is room, handing it back otherwise.
    pub fn try_enqueue(&self, item: T) -> Result<(), T> {
        self.tx.try_send(item).map_err(|e| e.into_inner())
    }

    /// Removes the oldest item, waiting until one is available.
    ///
    /// Returns `None` only if the channel disconnected, which cannot happen
    /// while the queue exists.
    pub fn dequeue(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Like [`dequeue`](Self::dequeue), but gives up with `None` once the
    /// queue has been interrupted and is empty.
    pub fn dequeue_interruptible(&self) -> Option<T> {
        if let Ok(item) = self.rx.try_recv() {
            return Some(item);
        }
        select! {
            recv(self.rx) -> item => item.ok(),
            // Disconnected: an item may still have raced in.
            recv(self.shutdown_rx) -> _ => self.rx.try_recv().ok(),
        }
    }

    /// Wakes every waiter in [`dequeue_interruptible`](Self::dequeue_interruptible)
    /// and makes later calls return `None` instead of waiting.
    pub fn interrupt(&self) {
        self.shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Removes the oldest item if there is one.
    pub fn try_dequeue(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Removes and returns every queued item.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    /// Number of items currently queued.
    pub fn size(&self) -> usize {
        self.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
