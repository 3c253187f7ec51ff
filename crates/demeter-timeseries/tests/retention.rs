//! Retention properties of the history log.

use chrono::{TimeZone, Utc};
use demeter_timeseries::{retain_latest, MAX_RECORDS};
use demeter_types::{Role, Snapshot};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn snapshot(seq: usize) -> Snapshot {
    let mut readings = BTreeMap::new();
    readings.insert(Role::Ec, Some(seq as f64));
    Snapshot::new(
        Utc.timestamp_opt(1_700_000_000 + seq as i64 * 3600, 0).unwrap(),
        readings,
    )
}

/// Appends `count` snapshots one at a time, the way the store does.
fn append_all(count: usize, max: usize) -> Vec<Snapshot> {
    let mut log = Vec::new();
    for seq in 0..count {
        log.push(snapshot(seq));
        retain_latest(&mut log, max);
    }
    log
}

proptest! {
    #[test]
    fn log_never_exceeds_cap(count in 0usize..500) {
        let log = append_all(count, MAX_RECORDS);
        prop_assert!(log.len() <= MAX_RECORDS);
        prop_assert_eq!(log.len(), count.min(MAX_RECORDS));
    }

    #[test]
    fn log_keeps_newest_in_order(count in 1usize..500, max in 1usize..200) {
        let log = append_all(count, max);
        let first = count.saturating_sub(max);

        let seqs: Vec<f64> = log.iter().filter_map(|s| s.get(Role::Ec)).collect();
        let expected: Vec<f64> = (first..count).map(|seq| seq as f64).collect();
        prop_assert_eq!(seqs, expected);
    }
}

#[test]
fn appending_past_cap_evicts_exactly_oldest() {
    let mut log = append_all(MAX_RECORDS, MAX_RECORDS);
    assert_eq!(log.len(), MAX_RECORDS);

    log.push(snapshot(MAX_RECORDS));
    let evicted = retain_latest(&mut log, MAX_RECORDS);

    assert_eq!(evicted, 1);
    assert_eq!(log.len(), MAX_RECORDS);
    assert_eq!(log[0].get(Role::Ec), Some(1.0));
    assert_eq!(log[MAX_RECORDS - 1].get(Role::Ec), Some(MAX_RECORDS as f64));
}
