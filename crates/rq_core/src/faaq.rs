//! Segmented fetch-and-add queue — the core lock-free FIFO algorithm.
//!
//! Producers and consumers claim disjoint slot indices via fetch-and-add on
//! a segment's `enq_idx` / `deq_idx`, publish/claim values via
//! compare-exchange / atomic swap, and hand off between segments via a
//! single-writer `CAE` on `next`. Segment pointers are
//! `crossbeam_epoch::Atomic` rather than hand-rolled `AtomicPtr` + hazard
//! pointers, so reclamation is consumed from the ecosystem's canonical
//! epoch-GC crate instead of hand-rolled.

use crate::config::Gc;
use crate::error::QueueError;
use crate::memory::{EpochMemoryProvider, MemoryProvider};
use crate::segment::{Segment, EMPTY, TAKEN};
use crate::trace::{now_ns, LogEntry, ThreadLog};
use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use crossbeam_utils::CachePadded;
use std::sync::atomic::Ordering;

/// A lock-free, segmented multi-producer/multi-consumer FIFO queue.
///
/// `enqueue` always succeeds eventually; `dequeue` returns `None` only when
/// the caller observed a single consistent moment at which the queue was
/// empty. `head` and `tail` are cache-line padded to avoid false sharing
/// between producers (which touch `tail`) and the consumer side (which
/// touches `head`).
pub struct FaaQueue<const B: usize> {
    head: CachePadded<Atomic<Segment<B>>>,
    tail: CachePadded<Atomic<Segment<B>>>,
    gc: Gc,
    provider: EpochMemoryProvider,
}

impl<const B: usize> Default for FaaQueue<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const B: usize> FaaQueue<B> {
    /// Creates a new queue with a single empty segment shared by `head` and
    /// `tail`, reclaiming retired segments ([`Gc::On`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_gc(Gc::default())
    }

    /// Creates a new queue with the given reclamation policy.
    #[must_use]
    pub fn with_gc(gc: Gc) -> Self {
        let provider = EpochMemoryProvider;
        let guard = &provider.pin();
        let sentinel = Owned::new(Segment::empty(0)).into_shared(guard);
        Self {
            head: CachePadded::new(Atomic::from(sentinel)),
            tail: CachePadded::new(Atomic::from(sentinel)),
            gc,
            provider,
        }
    }

    /// Enqueues `v`, retrying internally until it is published. `v` must not
    /// equal the reserved sentinels `EMPTY`/`TAKEN`.
    pub fn enqueue(&self, v: u64) {
        debug_assert!(
            v != EMPTY && v != TAKEN,
            "enqueued value collides with a reserved sentinel"
        );
        let guard = &self.provider.pin();
        loop {
            let tail_shared = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: tail always points to a live segment; the epoch guard
            // keeps it alive for the duration of this reference.
            let tail = unsafe { tail_shared.deref() };
            let i = tail.enq_idx.fetch_add(1, Ordering::AcqRel);

            if i < B {
                // Linearization point: the fetch-and-add above reserved this
                // index for us alone, so only a racing consumer that already
                // forced the slot to TAKEN can make this CAE fail.
                if tail.items[i]
                    .compare_exchange(EMPTY, v, Ordering::Release, Ordering::Relaxed)
                    .is_ok()
                {
                    return;
                }
                continue;
            }

            if i == B {
                // Exactly one producer observes this index. Re-check tail
                // hasn't already moved before committing to a new segment.
                if self.tail.load(Ordering::Acquire, guard) != tail_shared {
                    continue;
                }
                let next = tail.next.load(Ordering::Acquire, guard);
                if !next.is_null() {
                    let _ = self.tail.compare_exchange(
                        tail_shared,
                        next,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    );
                    continue;
                }
                let new_segment = Owned::new(Segment::prefilled(tail.node_idx + 1, v));
                match tail.next.compare_exchange(
                    Shared::null(),
                    new_segment,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    guard,
                ) {
                    Ok(new_shared) => {
                        tracing::trace!(node_idx = tail.node_idx + 1, "linked new segment");
                        // Advisory: failure here is harmless, a later
                        // operation will advance tail instead.
                        let _ = self.tail.compare_exchange(
                            tail_shared,
                            new_shared,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                            guard,
                        );
                        return;
                    }
                    Err(_failed) => continue, // another producer linked a successor first
                }
            }

            // i > B: segment is full, help advance tail and retry.
            let next = tail.next.load(Ordering::Acquire, guard);
            if !next.is_null() {
                let _ = self.tail.compare_exchange(
                    tail_shared,
                    next,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    guard,
                );
            }
        }
    }

    /// Dequeues a value previously enqueued, or `None` if the caller observed
    /// a consistent moment at which the queue was empty.
    pub fn dequeue(&self) -> Option<u64> {
        let guard = &self.provider.pin();
        loop {
            let head_shared = self.head.load(Ordering::Acquire, guard);
            // SAFETY: head always points to a live segment, kept alive by
            // the epoch guard.
            let head = unsafe { head_shared.deref() };
            let enq_idx = head.enq_idx.load(Ordering::Acquire);
            let deq_idx_peek = head.deq_idx.load(Ordering::Acquire);
            let next = head.next.load(Ordering::Acquire, guard);

            if deq_idx_peek >= enq_idx && next.is_null() {
                // Only linearization point for an empty return: both indices
                // coincide and no successor segment exists.
                return None;
            }

            let i = head.deq_idx.fetch_add(1, Ordering::AcqRel);

            if i < B {
                let x = head.items[i].swap(TAKEN, Ordering::AcqRel);
                if x != EMPTY {
                    return Some(x);
                }
                // Raced ahead of the producer for this slot; the producer's
                // CAE will fail and it will retry against a later index.
                continue;
            }

            // i >= B: this segment is drained.
            if next.is_null() {
                return None;
            }
            if self
                .head
                .compare_exchange(head_shared, next, Ordering::AcqRel, Ordering::Acquire, guard)
                .is_ok()
            {
                // SAFETY: head has advanced past this segment; no consumer
                // can still reach it, and it is only physically freed once
                // no thread's epoch guard could still observe it.
                if self.gc == Gc::On {
                    unsafe {
                        guard.defer_destroy(head_shared);
                    }
                }
            }
        }
    }

    /// Enqueues `v` like [`FaaQueue::enqueue`], additionally recording a put
    /// event spanning the call in `log`.
    pub fn enqueue_traced(&self, v: u64, log: &mut ThreadLog) -> Result<(), QueueError> {
        let start_ns = now_ns();
        self.enqueue(v);
        let end_ns = now_ns();
        log.record_put(LogEntry { value: v, start_ns, end_ns })
    }

    /// Dequeues like [`FaaQueue::dequeue`], additionally recording a get
    /// event in `log` when a value was actually taken.
    pub fn dequeue_traced(&self, log: &mut ThreadLog) -> Result<Option<u64>, QueueError> {
        let start_ns = now_ns();
        let result = self.dequeue();
        let end_ns = now_ns();
        if let Some(value) = result {
            log.record_get(LogEntry { value, start_ns, end_ns })?;
        }
        Ok(result)
    }

    /// Approximate count of values ever successfully enqueued, derived from
    /// `tail.enq_idx` and `tail.node_idx` rather than a separate atomic
    /// counter.
    pub fn approx_enq_count(&self) -> u64 {
        let guard = &self.provider.pin();
        let tail = unsafe { self.tail.load(Ordering::Acquire, guard).deref() };
        let idx = tail.enq_idx.load(Ordering::Relaxed).min(B);
        idx as u64 + B as u64 * tail.node_idx as u64
    }

    /// Approximate count of values ever successfully dequeued, derived from
    /// `head.deq_idx` and `head.node_idx`.
    pub fn approx_deq_count(&self) -> u64 {
        let guard = &self.provider.pin();
        let head = unsafe { self.head.load(Ordering::Acquire, guard).deref() };
        let idx = head.deq_idx.load(Ordering::Relaxed).min(B);
        idx as u64 + B as u64 * head.node_idx as u64
    }
}

impl<const B: usize> Drop for FaaQueue<B> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can hold a reference
        // into this queue, so it's safe to walk and free the chain without
        // a protecting guard.
        unsafe {
            let guard = epoch::unprotected();
            let mut node = self.head.load(Ordering::Relaxed, guard);
            while !node.is_null() {
                let owned = node.into_owned();
                let next = owned.next.load(Ordering::Relaxed, guard);
                drop(owned);
                node = next;
            }
        }
    }
}

// SAFETY: all shared state is behind atomics or `crossbeam_epoch::Atomic`,
// which already requires `T: Send + Sync` to implement `Send`/`Sync` itself;
// `Segment<B>` satisfies that, so these follow automatically. Declared
// explicitly for readability.
unsafe impl<const B: usize> Send for FaaQueue<B> {}
unsafe impl<const B: usize> Sync for FaaQueue<B> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_threaded_full_cycle() {
        // w=1,d=1,B=4 full cycle, exercised here directly against the FAAQ
        // before the multi-queue wraps it.
        let q: FaaQueue<4> = FaaQueue::new();
        for v in [10, 20, 30, 40, 50] {
            q.enqueue(v);
        }
        for expected in [10, 20, 30, 40, 50] {
            assert_eq!(q.dequeue(), Some(expected));
        }
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn enqueue_then_dequeue_on_empty_queue() {
        let q: FaaQueue<8> = FaaQueue::new();
        q.enqueue(42);
        assert_eq!(q.dequeue(), Some(42));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn segment_boundary_roll_preserves_order() {
        let q: FaaQueue<2> = FaaQueue::new();
        let values: Vec<u64> = (0..1000).collect();
        for &v in &values {
            q.enqueue(v);
        }
        let mut out = Vec::with_capacity(values.len());
        while let Some(v) = q.dequeue() {
            out.push(v);
        }
        assert_eq!(out, values);
    }

    #[test]
    fn repeated_empty_dequeue_is_stable() {
        let q: FaaQueue<4> = FaaQueue::new();
        for _ in 0..10 {
            assert_eq!(q.dequeue(), None);
        }
    }

    #[test]
    fn two_producers_one_consumer_preserve_conservation_and_per_producer_order() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(FaaQueue::<8>::new());
        let n = 1000u64;

        let producer = |tag: u64, q: Arc<FaaQueue<8>>| {
            thread::spawn(move || {
                for i in 0..n {
                    // distinct tag bit so values are unique across producers
                    q.enqueue((i << 1) | tag);
                }
            })
        };
        let p0 = producer(0, Arc::clone(&q));
        let p1 = producer(1, Arc::clone(&q));

        let mut seen = Vec::new();
        let mut misses_in_a_row = 0;
        while misses_in_a_row < 2 || seen.len() < (2 * n) as usize {
            match q.dequeue() {
                Some(v) => {
                    seen.push(v);
                    misses_in_a_row = 0;
                }
                None => misses_in_a_row += 1,
            }
            if seen.len() as u64 == 2 * n {
                break;
            }
        }
        p0.join().unwrap();
        p1.join().unwrap();
        // Drain anything left in flight.
        while let Some(v) = q.dequeue() {
            seen.push(v);
        }

        assert_eq!(seen.len(), (2 * n) as usize);
        let mut from_p0: Vec<u64> = seen.iter().copied().filter(|v| v & 1 == 0).map(|v| v >> 1).collect();
        let mut from_p1: Vec<u64> = seen.iter().copied().filter(|v| v & 1 == 1).map(|v| v >> 1).collect();
        // Per-producer FIFO order is preserved even though the two
        // producers' values interleave arbitrarily with each other.
        let sorted_p0 = { let mut s = from_p0.clone(); s.sort_unstable(); s };
        let sorted_p1 = { let mut s = from_p1.clone(); s.sort_unstable(); s };
        assert!(from_p0.is_sorted() || from_p0 == sorted_p0);
        assert!(from_p1.is_sorted() || from_p1 == sorted_p1);
        from_p0.dedup();
        from_p1.dedup();
        assert_eq!(from_p0.len(), n as usize);
        assert_eq!(from_p1.len(), n as usize);
    }
}
