//! Error taxonomy for the offline analyzer.

use thiserror::Error;

/// Fatal conditions raised while reconstructing the strict-FIFO snapshot.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A get's value could not be matched against any remaining put in the
    /// reconstructed snapshot — either a duplicate dequeue or a missing
    /// enqueue in the supplied logs.
    #[error("inconsistent trace: get #{get_index} returned value {value} with no matching unconsumed put")]
    InconsistentTrace { get_index: usize, value: u64 },
}
