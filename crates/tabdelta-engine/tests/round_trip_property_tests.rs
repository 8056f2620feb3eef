#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::owner;
use proptest::prelude::*;
use tabdelta_core::model::{ColumnSpec, Snapshot, Value};
use tabdelta_engine::DeltaEngine;

fn people(rows: &[(i64, f64, String, bool)]) -> Snapshot {
    let mut snapshot = Snapshot::new(vec![
        ColumnSpec::new("id", "int64"),
        ColumnSpec::new("visits", "int64"),
        ColumnSpec::new("score", "float64"),
        ColumnSpec::new("name", "object"),
        ColumnSpec::new("active", "bool"),
    ]);
    for (i, (visits, score, name, active)) in rows.iter().enumerate() {
        snapshot.push_row(vec![
            Value::Int(i as i64),
            Value::Int(*visits),
            Value::Float(*score),
            Value::Text(name.clone()),
            Value::Bool(*active),
        ]);
    }
    snapshot
}

fn row_strategy() -> impl Strategy<Value = (i64, f64, String, bool)> {
    (any::<i64>(), -1.0e12f64..1.0e12f64, ".{0,12}", any::<bool>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn insert_only_snapshot_rebuilds_exactly(
        rows in prop::collection::vec(row_strategy(), 0..16)
    ) {
        let mut engine = DeltaEngine::open_in_memory().unwrap();
        let snapshot = people(&rows);

        let descriptor = engine.save("people", &snapshot, &owner(1)).unwrap();
        let rebuilt = engine.rebuild(&descriptor).unwrap();

        prop_assert_eq!(descriptor.row_ids.len(), rows.len());
        prop_assert_eq!(rebuilt.column_names(), snapshot.column_names());
        prop_assert_eq!(rebuilt.rows, snapshot.rows);
    }

    #[test]
    fn resaving_a_snapshot_reuses_every_row(
        rows in prop::collection::vec(row_strategy(), 1..16)
    ) {
        let mut engine = DeltaEngine::open_in_memory().unwrap();
        let snapshot = people(&rows);

        let first = engine.save("people", &snapshot, &owner(1)).unwrap();
        let second = engine.save("people", &snapshot, &owner(2)).unwrap();

        prop_assert_eq!(first.row_ids, second.row_ids);
        prop_assert_eq!(
            engine.stats("people").unwrap().physical_rows,
            rows.len() as u64
        );
    }
}
