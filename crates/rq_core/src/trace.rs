//! Per-thread timestamp recorder.
//!
//! Append-only, one buffer per registered thread, owned exclusively by that
//! thread until the multi-queue hands all buffers to the analyzer at
//! shutdown. Capacity is fixed at registration time; overflow is a fatal
//! `QueueError::TraceBufferOverflow`, not a silent drop.

use crate::error::QueueError;
use std::sync::OnceLock;
use std::time::Instant;

static CLOCK_START: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanosecond timestamp relative to this process's first call.
/// All callers share the same origin, so timestamps from different threads
/// remain comparable.
pub fn now_ns() -> u64 {
    let start = CLOCK_START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Dense per-queue thread identifier assigned at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u32);

/// Which operation a [`LogEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Put,
    Get,
}

/// One recorded put or get: the value involved and its invocation/response
/// timestamps, in monotonic-clock nanoseconds since an unspecified epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub value: u64,
    pub start_ns: u64,
    pub end_ns: u64,
}

/// A single thread's append-only put/get logs.
#[derive(Debug, Clone)]
pub struct ThreadLog {
    thread_id: ThreadId,
    capacity: usize,
    puts: Vec<LogEntry>,
    gets: Vec<LogEntry>,
}

impl ThreadLog {
    #[must_use]
    pub fn new(thread_id: ThreadId, capacity: usize) -> Self {
        Self {
            thread_id,
            capacity,
            puts: Vec::with_capacity(capacity),
            gets: Vec::with_capacity(capacity),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Appends a put event. Fails if this thread's put log is already at
    /// capacity.
    pub fn record_put(&mut self, entry: LogEntry) -> Result<(), QueueError> {
        Self::push(&mut self.puts, entry, self.thread_id, self.capacity)
    }

    /// Appends a get event. Fails if this thread's get log is already at
    /// capacity.
    pub fn record_get(&mut self, entry: LogEntry) -> Result<(), QueueError> {
        Self::push(&mut self.gets, entry, self.thread_id, self.capacity)
    }

    fn push(
        log: &mut Vec<LogEntry>,
        entry: LogEntry,
        thread_id: ThreadId,
        capacity: usize,
    ) -> Result<(), QueueError> {
        if log.len() >= capacity {
            tracing::warn!(thread_id = thread_id.0, capacity, "trace buffer overflowed");
            return Err(QueueError::TraceBufferOverflow {
                thread_id: thread_id.0,
                capacity,
            });
        }
        log.push(entry);
        Ok(())
    }

    pub fn puts(&self) -> &[LogEntry] {
        &self.puts
    }

    pub fn gets(&self) -> &[LogEntry] {
        &self.gets
    }
}
