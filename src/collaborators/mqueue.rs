use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::types::message::PublishMessage;

/// The per-session pending-message queue: messages waiting for a slot in
/// the QoS 1/2 inflight window, or for the client to reconnect at all.
///
/// Grounded on `mesquitte-core`'s `PendingPackets`: a bounded deque that
/// logs and drops the oldest entry once `max_in_mem_pending_messages` is
/// reached, rather than blocking the publisher or growing without bound.
pub trait MQueue: Send + Sync {
    /// Pushes `msg` onto the back of the queue. Returns `true` if an older
    /// message was evicted to make room.
    fn push(&self, msg: PublishMessage) -> bool;

    fn pop(&self) -> Option<PublishMessage>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference in-memory `MQueue`: a `VecDeque` behind a lock, capped at
/// construction time.
pub struct BoundedMemoryQueue {
    capacity: usize,
    queue: Mutex<VecDeque<PublishMessage>>,
}

impl BoundedMemoryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

impl MQueue for BoundedMemoryQueue {
    fn push(&self, msg: PublishMessage) -> bool {
        let mut queue = self.queue.lock();
        let evicted = if queue.len() >= self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(msg);
        if evicted {
            crate::warn!("pending message queue full, oldest message dropped");
        }
        evicted
    }

    fn pop(&self) -> Option<PublishMessage> {
        self.queue.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.queue.lock().len()
    }
}
