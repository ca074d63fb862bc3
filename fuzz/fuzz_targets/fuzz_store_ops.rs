//! Fuzz target for conflict-set bookkeeping.
//!
//! Applies arbitrary operation sequences to a store and checks that
//! confidences never decrease and decisions stay in order.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use snowball_store::ConflictSetStore;
use snowball_types::Transaction;

#[derive(Debug, Arbitrary)]
enum Op {
    Update { ix: u8, value: i8 },
    Fail { ix: u8 },
    Decide { ix: u8, value: i8 },
    Get { ix: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    seeds: Vec<i8>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let seeds: Vec<_> = input
        .seeds
        .iter()
        .map(|v| Transaction::new(i64::from(*v)))
        .collect();
    let store = ConflictSetStore::with_seeds(seeds, "unused.txt");

    for op in input.ops {
        let ix = match op {
            Op::Update { ix, .. } | Op::Fail { ix } | Op::Decide { ix, .. } | Op::Get { ix } => {
                u64::from(ix)
            }
        };
        let before = store.candidates(ix).ok();
        let decided_before = store.decided_count();

        let _ = match op {
            Op::Update { value, .. } => store.update(ix, Transaction::new(i64::from(value))),
            Op::Fail { .. } => store.update_failed(ix),
            Op::Decide { value, .. } => store.decide(ix, Transaction::new(i64::from(value))),
            Op::Get { .. } => store.get(ix).map(|_| ()),
        };

        if let (Some(before), Ok(after)) = (before, store.candidates(ix)) {
            for old in &before {
                let new = after
                    .iter()
                    .find(|c| c.transaction == old.transaction)
                    .expect("candidate vanished");
                assert!(new.confidence >= old.confidence);
            }
        }
        let decided_after = store.decided_count();
        assert!(decided_after == decided_before || decided_after == decided_before + 1);
        if decided_after > decided_before {
            assert_eq!(ix, decided_before as u64);
        }
    }
});
