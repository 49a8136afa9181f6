// src/mission/ring.rs

//! Bounded in-memory buffer between ingestion and the flush task.
//!
//! Producers never block: a full buffer either displaces its oldest record
//! or refuses the new one, depending on the configured [`OverflowPolicy`].

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::OverflowPolicy;

/// Result of offering one item to a [`RingBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Stored; the oldest buffered item was dropped to make room.
    Evicted,
    /// Not stored; the buffer was full.
    Rejected,
}

pub struct RingBuffer<T> {
    queue: ArrayQueue<T>,
    policy: OverflowPolicy,
    evicted: AtomicU64,
    rejected: AtomicU64,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            policy,
            evicted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn offer(&self, item: T) -> Offer {
        match self.policy {
            OverflowPolicy::OverwriteOldest => match self.queue.force_push(item) {
                None => Offer::Accepted,
                Some(_oldest) => {
                    self.evicted.fetch_add(1, Ordering::Relaxed);
                    Offer::Evicted
                }
            },
            OverflowPolicy::RejectNewest => match self.queue.push(item) {
                Ok(()) => Offer::Accepted,
                Err(_item) => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                    Offer::Rejected
                }
            },
        }
    }

    /// Remove up to `max` items, oldest first.
    pub fn drain(&self, max: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(max.min(self.queue.len()));
        while out.len() < max {
            match self.queue.pop() {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Items dropped to make room since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Items refused since creation.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
