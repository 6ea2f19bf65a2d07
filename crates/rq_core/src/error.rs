//! Error taxonomy for the queue library.
//!
//! Retries internal to the lock-free algorithms are never surfaced here;
//! an empty dequeue is a regular return value, not an error.

use thiserror::Error;

/// Fatal conditions that a caller of [`crate::multiqueue::MultiQueue`] or
/// [`crate::faaq::FaaQueue`] must handle. None of these are raised on the
/// hot path of a successful enqueue/dequeue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The memory provider returned no memory for a new segment.
    #[error("allocation failure while growing the segment chain")]
    AllocationFailure,

    /// A per-thread trace log exceeded its configured capacity.
    #[error("trace buffer overflow for thread {thread_id}: capacity {capacity} exceeded")]
    TraceBufferOverflow {
        /// The thread whose log buffer is full.
        thread_id: u32,
        /// The configured capacity that was exceeded.
        capacity: usize,
    },

    /// `d > w`, `w == 0`, or `d == 0` at construction time.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human-readable description of which invariant was violated.
        reason: &'static str,
    },
}
