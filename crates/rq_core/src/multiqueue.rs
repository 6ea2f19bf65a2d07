//! D-choice balanced multi-queue.
//!
//! `enqueue`/`dequeue` draw `d` random sub-queue indices and pick the one
//! with the lowest heuristic value (strict `<`, so the first draw wins
//! ties); a dequeue that comes up empty on its chosen sub-queue falls
//! through to [`MultiQueue::double_collect`], which sweeps every sub-queue
//! starting one past the one that just reported empty.

use crate::config::{Config, LoadHeuristic, TraceMode};
use crate::error::QueueError;
use crate::partial::PartialQueue;
use crate::scratch::FixedVec;
use crate::trace::{ThreadId, ThreadLog};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Per-thread registration state: an RNG for dispatch, a reusable scratch
/// buffer for the double-collect version sweep, and — when the owning
/// queue's `trace_mode != None` — this thread's put/get log.
pub struct ThreadHandle {
    thread_id: ThreadId,
    rng: SmallRng,
    versions: FixedVec<u64>,
    log: Option<ThreadLog>,
}

impl ThreadHandle {
    fn new(thread_id: ThreadId, width: usize, trace_capacity: Option<usize>) -> Self {
        Self {
            thread_id,
            rng: SmallRng::from_entropy(),
            versions: FixedVec::with_capacity(width),
            log: trace_capacity.map(|capacity| ThreadLog::new(thread_id, capacity)),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// This thread's recorded put/get log, if tracing is enabled for the
    /// owning queue.
    pub fn log(&self) -> Option<&ThreadLog> {
        self.log.as_ref()
    }

    /// Takes ownership of the recorded log, leaving this handle with none.
    /// Called once per thread at shutdown before handing logs to the
    /// analyzer.
    pub fn take_log(&mut self) -> Option<ThreadLog> {
        self.log.take()
    }
}

/// An array of `w` independent [`PartialQueue`]s, dispatched to via `d`
/// random choices per operation.
pub struct MultiQueue<const B: usize> {
    width: u32,
    d: u32,
    heuristic: LoadHeuristic,
    trace_mode: TraceMode,
    trace_capacity: usize,
    queues: Box<[PartialQueue<B>]>,
}

impl<const B: usize> MultiQueue<B> {
    /// Constructs a multi-queue of `width` sub-queues, each operation
    /// sampling `d` of them. Fails if `d == 0`, `width == 0`, or `d > width`.
    pub fn new(width: u32, d: u32, config: Config) -> Result<Self, QueueError> {
        if width == 0 {
            return Err(QueueError::InvalidConfiguration { reason: "width must be nonzero" });
        }
        if d == 0 {
            return Err(QueueError::InvalidConfiguration { reason: "d must be nonzero" });
        }
        if d > width {
            return Err(QueueError::InvalidConfiguration { reason: "d must not exceed width" });
        }
        let queues = (0..width).map(|_| PartialQueue::with_gc(config.gc)).collect();
        tracing::debug!(
            width,
            d,
            heuristic = ?config.heuristic,
            trace_mode = ?config.trace_mode,
            gc = ?config.gc,
            "constructed multi-queue"
        );
        Ok(Self {
            width,
            d,
            heuristic: config.heuristic,
            trace_mode: config.trace_mode,
            trace_capacity: config.trace_capacity,
            queues,
        })
    }

    /// Per-thread initialization: a dispatch RNG, a double-collect scratch
    /// buffer sized to `width`, and a trace log sized to `trace_capacity`
    /// when this queue's `trace_mode != TraceMode::None`.
    #[must_use]
    pub fn register(&self, thread_id: ThreadId) -> ThreadHandle {
        let trace_capacity = (self.trace_mode != TraceMode::None).then_some(self.trace_capacity);
        ThreadHandle::new(thread_id, self.width as usize, trace_capacity)
    }

    fn random_index(&self, handle: &mut ThreadHandle) -> usize {
        handle.rng.gen_range(0..self.width) as usize
    }

    fn enqueue_heuristic(&self, q: &PartialQueue<B>) -> i64 {
        match self.heuristic {
            LoadHeuristic::Length => q.length() as i64,
            LoadHeuristic::Count => q.enq_count() as i64,
        }
    }

    fn dequeue_heuristic(&self, q: &PartialQueue<B>) -> i64 {
        match self.heuristic {
            LoadHeuristic::Length => -(q.length() as i64),
            LoadHeuristic::Count => q.deq_count() as i64,
        }
    }

    /// Picks the sub-queue index minimizing `heuristic` over `d` random
    /// draws; the first draw wins ties (strict `<` comparison).
    fn choose(&self, handle: &mut ThreadHandle, heuristic: impl Fn(&PartialQueue<B>) -> i64) -> usize {
        let mut opt_index = self.random_index(handle);
        let mut opt = heuristic(&self.queues[opt_index]);
        for _ in 1..self.d {
            let index = self.random_index(handle);
            let index_val = heuristic(&self.queues[index]);
            if index_val < opt {
                opt_index = index;
                opt = index_val;
            }
        }
        opt_index
    }

    /// Enqueues `value` onto the sub-queue chosen by the configured
    /// heuristic. `key` is accepted for API parity with callers that route
    /// by key elsewhere, but plays no role in dispatch or storage here —
    /// sub-queue selection is purely random, and only `value` ever occupies
    /// a slot. Records a put event into `handle`'s log when tracing is on.
    pub fn enqueue(&self, handle: &mut ThreadHandle, _key: u64, value: u64) -> Result<(), QueueError> {
        let index = self.choose(handle, |q| self.enqueue_heuristic(q));
        match handle.log.as_mut() {
            Some(log) => self.queues[index].enqueue_traced(value, log),
            None => {
                self.queues[index].enqueue(value);
                Ok(())
            }
        }
    }

    /// Dequeues from sub-queue `index`, recording a get event into `handle`'s
    /// log when tracing is on and a value was actually taken.
    fn dequeue_sub(&self, index: usize, handle: &mut ThreadHandle) -> Result<Option<u64>, QueueError> {
        match handle.log.as_mut() {
            Some(log) => self.queues[index].dequeue_traced(log),
            None => Ok(self.queues[index].dequeue()),
        }
    }

    /// Dequeues a value, falling through to the double-collect emptiness
    /// protocol if the chosen sub-queue alone reports empty.
    pub fn dequeue(&self, handle: &mut ThreadHandle) -> Result<Option<u64>, QueueError> {
        let index = self.choose(handle, |q| self.dequeue_heuristic(q));
        if let Some(v) = self.dequeue_sub(index, handle)? {
            return Ok(Some(v));
        }
        self.double_collect(handle, (index + 1) % self.width as usize)
    }

    /// Confirms genuine multi-queue emptiness, or finds and returns a value
    /// that the initial dispatch missed.
    fn double_collect(&self, handle: &mut ThreadHandle, mut start_index: usize) -> Result<Option<u64>, QueueError> {
        let width = self.width as usize;
        'restart: loop {
            handle.versions.clear();
            for _ in 0..width {
                handle.versions.push(0);
            }
            for i in 0..width {
                let k = (start_index + i) % width;
                handle.versions.as_slice_mut()[k] = self.queues[k].tail_version();
                if let Some(v) = self.dequeue_sub(k, handle)? {
                    return Ok(Some(v));
                }
            }
            for i in 0..width {
                let k = (start_index + i) % width;
                if handle.versions.as_slice()[k] != self.queues[k].tail_version() {
                    tracing::trace!(sub_queue = k, "double-collect observed a concurrent enqueue, restarting sweep");
                    start_index = k;
                    continue 'restart;
                }
            }
            return Ok(None);
        }
    }

    /// Best-effort, non-linearizable sum of sub-queue lengths.
    pub fn size(&self) -> u64 {
        self.queues.iter().map(PartialQueue::length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn single_sub_queue_is_strict_fifo() {
        // w=1, d=1, B=4.
        let q: MultiQueue<4> = MultiQueue::new(1, 1, Config::default()).unwrap();
        let mut h = q.register(ThreadId(0));
        for v in [10, 20, 30, 40, 50] {
            q.enqueue(&mut h, 0, v).unwrap();
        }
        for expected in [10, 20, 30, 40, 50] {
            assert_eq!(q.dequeue(&mut h).unwrap(), Some(expected));
        }
        assert_eq!(q.dequeue(&mut h).unwrap(), None);
    }

    #[test]
    fn contended_empty_never_crashes_or_fabricates_values() {
        // w=2, d=2, no producers.
        let q: MultiQueue<8> = MultiQueue::new(2, 2, Config::default()).unwrap();
        let mut h0 = q.register(ThreadId(0));
        let mut h1 = q.register(ThreadId(1));
        for _ in 0..50 {
            assert_eq!(q.dequeue(&mut h0).unwrap(), None);
            assert_eq!(q.dequeue(&mut h1).unwrap(), None);
        }
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(matches!(
            MultiQueue::<4>::new(0, 1, Config::default()),
            Err(QueueError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            MultiQueue::<4>::new(4, 0, Config::default()),
            Err(QueueError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            MultiQueue::<4>::new(2, 3, Config::default()),
            Err(QueueError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn dispersed_queue_conserves_values() {
        // w=4, d=2, single-threaded drive to keep the test deterministic;
        // the multi-threaded variant lives in tests/.
        let q: MultiQueue<16> = MultiQueue::new(4, 2, Config::default()).unwrap();
        let mut h = q.register(ThreadId(0));
        let values: Vec<u64> = (0..1000).collect();
        for &v in &values {
            q.enqueue(&mut h, 0, v).unwrap();
        }
        let mut out = Vec::with_capacity(values.len());
        while let Some(v) = q.dequeue(&mut h).unwrap() {
            out.push(v);
        }
        out.sort_unstable();
        assert_eq!(out, values);
        assert_eq!(q.size(), 0);
    }
}
