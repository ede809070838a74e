//! FIFO Job Queue
//!
//! Single unbounded channel of job ids shared by every category and every
//! worker. Delivery is strict insertion order. The contents can be scanned to
//! report how far back a waiting job sits.

use crate::types::JobId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Default)]
pub struct FifoQueue {
    /// Waiting ids, head first. Never held across an await.
    items: Mutex<VecDeque<JobId>>,
    /// Wakes workers suspended on an empty queue
    notify: Notify,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id to the tail
    pub fn push(&self, id: JobId) {
        let len = {
            let mut items = self.items.lock();
            items.push_back(id);
            items.len()
        };
        trace!(job_id = %id, queue_len = len, "Pushed job id");
        self.notify.notify_one();
    }

    /// Take the head, suspending while the queue is empty.
    ///
    /// Cancel safe: dropping the future never loses an id.
    pub async fn pop(&self) -> JobId {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await still wakes us.
            notified.as_mut().enable();

            if let Some(id) = self.try_pop() {
                return id;
            }
            notified.await;
        }
    }

    pub fn try_pop(&self) -> Option<JobId> {
        self.items.lock().pop_front()
    }

    /// 1-based offset of `id` from the head, if it is still waiting.
    ///
    /// Computed from a consistent snapshot; workers drain concurrently, so the
    /// answer is advisory once the lock is released.
    pub fn position(&self, id: JobId) -> Option<usize> {
        self.items
            .lock()
            .iter()
            .position(|queued| *queued == id)
            .map(|offset| offset + 1)
    }

    pub fn snapshot(&self) -> Vec<JobId> {
        self.items.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
