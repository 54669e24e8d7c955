//! Single-writer, multi-reader state container.
//!
//! Each session owns one `Observable`. Readers either take a snapshot
//! (`Arc<T>`, never mutated afterwards) or subscribe to receive every new
//! snapshot over a channel. Writes go through `update`, which copies on write
//! when a reader still holds the previous snapshot.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Holder of the current snapshot and its subscribers.
#[derive(Debug)]
pub struct Observable<T> {
    current: Arc<T>,
    version: u64,
    subscribers: Vec<Sender<Arc<T>>>,
}

impl<T: Clone> Observable<T> {
    /// Wrap `initial` as version 0.
    pub fn new(initial: T) -> Self {
        Self {
            current: Arc::new(initial),
            version: 0,
            subscribers: Vec::new(),
        }
    }

    /// Current state as a shared, immutable snapshot.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.current)
    }

    /// Borrow the current state without taking a snapshot.
    pub fn get(&self) -> &T {
        &self.current
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Receive every snapshot published after this call.
    ///
    /// Dropping the receiver unsubscribes on the next publish.
    pub fn subscribe(&mut self) -> Receiver<Arc<T>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Mutate the state and publish the result to subscribers.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(Arc::make_mut(&mut self.current));
        self.version += 1;
        self.publish();
        result
    }

    fn publish(&mut self) {
        let snapshot = Arc::clone(&self.current);
        self.subscribers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
