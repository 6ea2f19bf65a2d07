//! Concurrent relaxed FIFO queues: a segmented fetch-and-add queue and a
//! d-choice balanced multi-queue built on top of it.
//!
//! [`faaq::FaaQueue`] is the single-queue algorithm; [`multiqueue::MultiQueue`]
//! fans a workload out over several of them via random dispatch and a
//! double-collect emptiness protocol, trading strict FIFO order for
//! throughput under contention. [`trace::ThreadLog`] records operations when
//! a caller wants `rq_analyzer` to later quantify how relaxed a given run
//! actually was.

pub mod config;
pub mod error;
pub mod faaq;
pub mod memory;
pub mod multiqueue;
pub mod partial;
mod scratch;
pub mod segment;
pub mod trace;

pub use config::{Config, Gc, LoadHeuristic, TraceMode};
pub use error::QueueError;
pub use faaq::FaaQueue;
pub use memory::{EpochMemoryProvider, MemoryProvider};
pub use multiqueue::{MultiQueue, ThreadHandle};
pub use partial::PartialQueue;
pub use trace::{Kind, LogEntry, ThreadId, ThreadLog};
