//! Partial queue adapter: a [`FaaQueue`] plus the load metrics the
//! multi-queue's dispatch and double-collect protocol need.

use crate::config::Gc;
use crate::error::QueueError;
use crate::faaq::FaaQueue;
use crate::trace::ThreadLog;
use std::sync::atomic::{AtomicU64, Ordering};

/// A [`FaaQueue`] instrumented with a monotonically increasing tail version,
/// bumped on every successful enqueue. `enq_count`/`deq_count`/`length` are
/// read straight off the underlying FAAQ's approximate counters; only
/// `tail_version` needs an atomic of its own, since nothing in `Segment`'s
/// index arithmetic tracks it.
pub struct PartialQueue<const B: usize> {
    queue: FaaQueue<B>,
    tail_version: AtomicU64,
}

impl<const B: usize> Default for PartialQueue<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const B: usize> PartialQueue<B> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_gc(Gc::default())
    }

    /// Creates a new sub-queue with the given reclamation policy.
    #[must_use]
    pub fn with_gc(gc: Gc) -> Self {
        Self {
            queue: FaaQueue::with_gc(gc),
            tail_version: AtomicU64::new(0),
        }
    }

    /// Enqueues `v`, bumping `tail_version` on completion.
    pub fn enqueue(&self, v: u64) {
        self.queue.enqueue(v);
        self.tail_version.fetch_add(1, Ordering::AcqRel);
    }

    /// Enqueues `v` like [`PartialQueue::enqueue`], additionally recording a
    /// put event in `log`.
    pub fn enqueue_traced(&self, v: u64, log: &mut ThreadLog) -> Result<(), QueueError> {
        self.queue.enqueue_traced(v, log)?;
        self.tail_version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Dequeues a value, or `None` if this sub-queue alone observed itself
    /// empty (the multi-queue is responsible for the double-collect
    /// confirmation across all sub-queues).
    pub fn dequeue(&self) -> Option<u64> {
        self.queue.dequeue()
    }

    /// Dequeues like [`PartialQueue::dequeue`], additionally recording a get
    /// event in `log` when a value was taken.
    pub fn dequeue_traced(&self, log: &mut ThreadLog) -> Result<Option<u64>, QueueError> {
        self.queue.dequeue_traced(log)
    }

    pub fn enq_count(&self) -> u64 {
        self.queue.approx_enq_count()
    }

    pub fn deq_count(&self) -> u64 {
        self.queue.approx_deq_count()
    }

    /// `enq_count - deq_count`, clamped to zero against transient staleness
    /// between the two independent reads.
    pub fn length(&self) -> u64 {
        self.enq_count().saturating_sub(self.deq_count())
    }

    /// Current tail version, read without synchronizing with any particular
    /// enqueue.
    pub fn tail_version(&self) -> u64 {
        self.tail_version.load(Ordering::Acquire)
    }
}
