//! Hand-off of edits from producer threads to the editor thread.
//!
//! Any number of threads may [`EditQueue::enqueue`]; only the editor thread
//! drains. Every enqueue also writes one byte to a [`WakeSignal`] so an
//! editor blocked waiting for input wakes up and drains at its next safe
//! point.
use std::collections::LinkedList;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::edit::Edit;

const WAKE_BYTE: u8 = 0x01;

/// FIFO of edits shared between producers and the single consumer.
///
/// The lock only ever covers relinking list nodes: nodes are allocated
/// before it is taken and the drained list is unpacked after it is released.
#[derive(Debug)]
pub struct EditQueue {
    edits: Mutex<LinkedList<Edit>>,
    signal: Sender<u8>,
}

impl EditQueue {
    /// Create an empty queue and the consumer end of its wake-up signal.
    pub fn new() -> (Self, WakeSignal) {
        let (signal, rx) = mpsc::channel();
        let queue = Self {
            edits: Mutex::new(LinkedList::new()),
            signal,
        };
        (queue, WakeSignal { rx })
    }

    /// Append an edit at the tail and wake the consumer.
    pub fn enqueue(&self, edit: Edit) {
        let mut node = LinkedList::new();
        node.push_back(edit);
        self.lock().append(&mut node);
        // The consumer may already be gone during shutdown; nothing to wake then.
        let _ = self.signal.send(WAKE_BYTE);
    }

    /// Detach everything queued so far, oldest first, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<Edit> {
        let drained = std::mem::take(&mut *self.lock());
        drained.into_iter().collect()
    }

    /// Whether at least one edit is waiting.
    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    // Every critical section leaves the list consistent, so a panic elsewhere
    // while holding the lock does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, LinkedList<Edit>> {
        self.edits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Consumer end of the queue's wake-up channel: one byte per enqueue.
#[derive(Debug)]
pub struct WakeSignal {
    rx: Receiver<u8>,
}

impl WakeSignal {
    /// Block until an enqueue happens or `timeout` elapses.
    ///
    /// All pending wake bytes are discarded. Returns `true` if woken by an
    /// enqueue.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(_) => {
                self.discard();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Discard pending wake bytes without blocking. Returns `true` if any were pending.
    pub fn try_consume(&self) -> bool {
        let woke = self.rx.try_recv().is_ok();
        if woke {
            self.discard();
        }
        woke
    }

    fn discard(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}
