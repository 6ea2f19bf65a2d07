//! Runtime configuration for queue construction.
//!
//! Every knob here is a plain runtime value passed to construction rather
//! than a compile-time feature or preprocessor switch.

/// Sub-queue load heuristic used by the multi-queue's d-choice dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadHeuristic {
    /// `length(q) = enq_count(q) - deq_count(q)`. Enqueue picks the minimum
    /// length; dequeue picks the maximum length (minimum of `-length`).
    #[default]
    Length,
    /// Enqueue picks the minimum `enq_count`; dequeue picks the minimum
    /// `deq_count`.
    Count,
}

/// Whether and how queue operations are recorded for relaxation analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// No recording; `rq_core::trace` is never touched.
    #[default]
    None,
    /// Record under a lock held for the duration of the recorded event.
    ///
    /// This implementation always uses append-only per-thread logs, so this
    /// variant and [`TraceMode::Timer`] behave identically to
    /// [`TraceMode::LinearizationTimestamp`] except for which instant is
    /// recorded.
    LockBased,
    /// Record a single timestamp taken at the FAA linearization point.
    Timer,
    /// Record both the invocation and response timestamps of the operation
    /// as a `(value, start, end)` log entry.
    LinearizationTimestamp,
}

/// Whether the memory provider participates in epoch-based reclamation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gc {
    /// Retired segments are reclaimed once no thread can still reach them.
    #[default]
    On,
    /// Retired segments are leaked. Useful for short-lived benchmark runs
    /// where reclamation overhead is unwanted.
    Off,
}

/// Configuration for a [`crate::faaq::FaaQueue`] / [`crate::multiqueue::MultiQueue`].
///
/// Segment capacity (`B`) is not a field here: it is fixed at compile time
/// via the const generic on `FaaQueue`/`MultiQueue`/`PartialQueue`, so there
/// is no runtime knob for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Which sub-queue load heuristic the multi-queue dispatches with.
    pub heuristic: LoadHeuristic,
    /// Whether/how operations are recorded for relaxation analysis.
    pub trace_mode: TraceMode,
    /// Whether retired segments are reclaimed or leaked.
    pub gc: Gc,
    /// Capacity of each per-thread trace log, when `trace_mode != None`.
    pub trace_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heuristic: LoadHeuristic::default(),
            trace_mode: TraceMode::default(),
            gc: Gc::default(),
            trace_capacity: 1 << 20,
        }
    }
}

impl Config {
    /// Starts from [`Config::default`] and overrides `heuristic`.
    #[must_use]
    pub fn with_heuristic(mut self, heuristic: LoadHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Starts from [`Config::default`] and overrides `trace_mode`.
    #[must_use]
    pub fn with_trace_mode(mut self, trace_mode: TraceMode) -> Self {
        self.trace_mode = trace_mode;
        self
    }

    /// Starts from [`Config::default`] and overrides `gc`.
    #[must_use]
    pub fn with_gc(mut self, gc: Gc) -> Self {
        self.gc = gc;
        self
    }

    /// Starts from [`Config::default`] and overrides `trace_capacity`.
    #[must_use]
    pub fn with_trace_capacity(mut self, trace_capacity: usize) -> Self {
        self.trace_capacity = trace_capacity;
        self
    }
}
