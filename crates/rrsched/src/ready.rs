//! FIFO ready queue.
//!
//! The queue alone decides dispatch order: the oldest appended thread runs
//! next. Priorities are not consulted.

use std::collections::VecDeque;

use crate::thread::{ThreadCb, ThreadId, ThreadRef};

#[derive(Default)]
pub struct ReadyQueue {
    threads: VecDeque<ThreadRef>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `thread` at the tail.
    ///
    /// A thread that is already queued keeps its position and `false` is
    /// returned.
    pub fn append(&mut self, thread: ThreadRef) -> bool {
        if self.contains(&thread) {
            log::debug!("{} already on the ready queue", thread.id());
            return false;
        }
        self.threads.push_back(thread);
        true
    }

    /// Removes and returns the oldest entry.
    pub fn remove_head(&mut self) -> Option<ThreadRef> {
        self.threads.pop_front()
    }

    /// Removes `thread` if present; returns whether it was queued.
    pub fn remove(&mut self, thread: &ThreadCb) -> bool {
        let before = self.threads.len();
        self.threads.retain(|queued| queued.id() != thread.id());
        self.threads.len() != before
    }

    pub fn contains(&self, thread: &ThreadCb) -> bool {
        self.threads.iter().any(|queued| queued.id() == thread.id())
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Queued ids, head first.
    pub fn ids(&self) -> Vec<ThreadId> {
        self.threads.iter().map(|thread| thread.id()).collect()
    }

    pub fn clear(&mut self) {
        self.threads.clear();
    }
}
