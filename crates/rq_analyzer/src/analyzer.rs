//! Offline relaxation analyzer.
//!
//! Merges every thread's put/get logs, sorts each by invocation start,
//! replays the puts as a reconstructed strict-FIFO snapshot, then for each
//! get in order finds and unlinks the matching put, recording its
//! zero-based distance from the head as that dequeue's rank error. The
//! reconstructed snapshot is a `Vec<Option<u64>>` — an indexable container
//! with tombstones in place of unlinked nodes; O(n) search per get is
//! accepted because analysis happens offline, after the run has quiesced.

use crate::error::AnalyzerError;
use crate::report::RelaxationReport;
use rq_core::trace::{LogEntry, ThreadLog};

/// Computes the rank-error distribution for one completed run.
///
/// `logs` must contain every worker thread's put/get events, already
/// quiesced — analysis requires the caller to have joined every worker
/// thread before calling this.
pub fn analyze(logs: &[ThreadLog]) -> Result<RelaxationReport, AnalyzerError> {
    let mut puts: Vec<LogEntry> = logs.iter().flat_map(|log| log.puts().iter().copied()).collect();
    puts.sort_by_key(|e| e.start_ns);

    let mut gets: Vec<LogEntry> = logs.iter().flat_map(|log| log.gets().iter().copied()).collect();
    gets.sort_by_key(|e| e.start_ns);

    let mut snapshot: Vec<Option<u64>> = puts.iter().map(|e| Some(e.value)).collect();

    let n_get = gets.len();
    if n_get == 0 {
        return Ok(RelaxationReport { mean: 0.0, max: 0, variance: 0.0, n_get: 0 });
    }

    let mut rank_errors = Vec::with_capacity(n_get);
    for (get_index, get) in gets.iter().enumerate() {
        let mut live_seen = 0usize;
        let mut found = None;
        for slot in &mut snapshot {
            match slot {
                Some(value) if *value == get.value => {
                    found = Some(live_seen);
                    *slot = None;
                    break;
                }
                Some(_) => live_seen += 1,
                None => {}
            }
        }
        match found {
            Some(rank) => rank_errors.push(rank as u64),
            None => {
                tracing::error!(get_index, value = get.value, "get has no matching unconsumed put");
                return Err(AnalyzerError::InconsistentTrace {
                    get_index,
                    value: get.value,
                })
            }
        }
    }

    let sum: u64 = rank_errors.iter().sum();
    let mean = sum as f64 / n_get as f64;
    let max = rank_errors.iter().copied().max().unwrap_or(0);
    let variance = if n_get > 1 {
        let sq_diff_sum: f64 = rank_errors
            .iter()
            .map(|&r| {
                let d = r as f64 - mean;
                d * d
            })
            .sum();
        sq_diff_sum / (n_get - 1) as f64
    } else {
        0.0
    };

    tracing::info!(n_get, mean, max, variance, "relaxation analysis complete");
    Ok(RelaxationReport { mean, max, variance, n_get })
}
