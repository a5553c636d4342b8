//! One-shot UI events.
//!
//! An event reaches the receivers subscribed when it is emitted and no one
//! else: there is no replay for late subscribers, and an event emitted with
//! nobody listening is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use tasker_core::TaskId;
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 16;

/// A task was written; carries the stored id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSaved {
    /// Id of the saved task.
    pub id: TaskId,
}

/// The user asked to open the completed-tasks screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShowCompletedRequested;

/// Broadcast-based emitter for one kind of event.
///
/// `emit` never awaits. A receiver that falls more than `capacity` events
/// behind observes `Lagged` and skips ahead.
#[derive(Debug)]
pub struct EventEmitter<E> {
    tx: broadcast::Sender<E>,
    emit_count: AtomicU64,
}

impl<E: Clone> EventEmitter<E> {
    /// Create an emitter with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an emitter with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Deliver `event` to current subscribers. Returns how many received it.
    pub fn emit(&self, event: E) -> usize {
        let _ = self.emit_count.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Events emitted so far, delivered or not.
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl<E: Clone> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}
