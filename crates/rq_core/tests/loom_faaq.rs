//! Interleaving exploration of the single-slot producer/consumer race,
//! modeled with `loom` rather than `std`'s real atomics. Only compiled
//! under `--cfg loom` with the `loom` feature enabled; a normal `cargo test`
//! never builds this file.
//!
//! This models the specific race §4.1 calls out: a consumer's atomic swap
//! on an `EMPTY` slot racing a producer's compare-exchange into that same
//! slot, reduced to the smallest schedule that can exhibit it (one slot,
//! one producer, one consumer) since `loom` exhaustively explores every
//! interleaving and cannot afford full segment/multi-queue state.

#![cfg(loom)]

use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

const EMPTY: u64 = u64::MAX;
const TAKEN: u64 = u64::MAX - 1;

#[test]
fn producer_consumer_single_slot_never_loses_or_duplicates() {
    loom::model(|| {
        let slot = Arc::new(AtomicU64::new(EMPTY));
        let published = Arc::new(loom::sync::atomic::AtomicBool::new(false));

        let producer = {
            let slot = slot.clone();
            thread::spawn(move || slot.compare_exchange(EMPTY, 42, Ordering::Release, Ordering::Relaxed).is_ok())
        };

        let consumer = {
            let slot = slot.clone();
            let published = published.clone();
            thread::spawn(move || {
                let prev = slot.swap(TAKEN, Ordering::AcqRel);
                if prev != EMPTY && prev != TAKEN {
                    published.store(true, Ordering::Release);
                }
                prev
            })
        };

        let enqueue_won = producer.join().unwrap();
        let dequeued = consumer.join().unwrap();

        // Exactly one of "producer's CAE succeeded" / "consumer saw a real
        // value" can be true per schedule, and every schedule where the
        // consumer observed EMPTY corresponds to the producer losing its CAE
        // and being expected to retry — never a lost or duplicated value.
        if dequeued != EMPTY && dequeued != TAKEN {
            assert!(!enqueue_won, "producer must not believe it also won when consumer already consumed its write");
        }
    });
}
