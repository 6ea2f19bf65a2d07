//! Segment — fixed-capacity slot array, one node of the FAA queue chain.

use crossbeam_epoch::Atomic;
use std::sync::atomic::AtomicUsize;

/// Reserved sentinel marking a slot that has not yet been written by a
/// producer. No legitimate enqueued value may equal this.
pub const EMPTY: u64 = u64::MAX;

/// Reserved sentinel marking a slot whose value has already been consumed.
/// Terminal: once a slot is `TAKEN` it never changes again.
pub const TAKEN: u64 = u64::MAX - 1;

/// One segment of the segmented FAA queue's linked chain.
///
/// `B` is the segment capacity. Slots progress through the strict partial
/// order `EMPTY -> value -> TAKEN`; `enq_idx` and `deq_idx` are claimed by
/// fetch-and-add and are monotonically non-decreasing, and may exceed `B`
/// once the segment is drained/full.
#[repr(align(64))]
pub struct Segment<const B: usize> {
    /// Slot storage. Each slot is one of `EMPTY`, `TAKEN`, or a legitimate
    /// enqueued value.
    pub(crate) items: [std::sync::atomic::AtomicU64; B],
    /// Next slot index a producer will claim via fetch-and-add.
    pub(crate) enq_idx: AtomicUsize,
    /// Next slot index a consumer will claim via fetch-and-add.
    pub(crate) deq_idx: AtomicUsize,
    /// Successor segment. Set at most once (`CAE(next, null, ...)`); never
    /// changes after that.
    pub(crate) next: Atomic<Segment<B>>,
    /// Position of this segment in the chain. Immutable after construction,
    /// so plain loads suffice.
    pub(crate) node_idx: usize,
}

impl<const B: usize> Segment<B> {
    /// Creates an empty segment at chain position `node_idx`.
    pub(crate) fn empty(node_idx: usize) -> Self {
        Self {
            items: std::array::from_fn(|_| std::sync::atomic::AtomicU64::new(EMPTY)),
            enq_idx: AtomicUsize::new(0),
            deq_idx: AtomicUsize::new(0),
            next: Atomic::null(),
            node_idx,
        }
    }

    /// Creates a segment with slot 0 pre-filled with `v` and `enq_idx = 1`,
    /// the fast path taken by the producer that rolls over to a new segment.
    pub(crate) fn prefilled(node_idx: usize, v: u64) -> Self {
        let items: [std::sync::atomic::AtomicU64; B] =
            std::array::from_fn(|i| std::sync::atomic::AtomicU64::new(if i == 0 { v } else { EMPTY }));
        Self {
            items,
            enq_idx: AtomicUsize::new(1),
            deq_idx: AtomicUsize::new(0),
            next: Atomic::null(),
            node_idx,
        }
    }
}
