#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{owner, setup_engine, students_a, students_b};
use tabdelta_core::errors::ExErrorKind;
use tabdelta_store::ReclaimOptions;

#[test]
fn test_reclaim_is_transparent_to_rebuild() {
    let (_dir, mut engine) = setup_engine();
    let a = engine.save("students", &students_a(), &owner(1)).unwrap();
    let b = engine.save("students", &students_b(), &owner(2)).unwrap();
    let rebuilt_a = engine.rebuild(&a).unwrap();
    let rebuilt_b = engine.rebuild(&b).unwrap();

    let report = engine
        .reclaim("students", ReclaimOptions::with_vacuum())
        .unwrap();
    assert_eq!(report.rows_copied, 4);
    assert!(report.vacuumed);
    assert!(report.pages_after > 0);

    assert_eq!(engine.rebuild(&a).unwrap(), rebuilt_a);
    assert_eq!(engine.rebuild(&b).unwrap(), rebuilt_b);
}

#[test]
fn test_reclaim_never_reissues_row_ids() {
    let (_dir, mut engine) = setup_engine();
    engine.save("students", &students_a(), &owner(1)).unwrap();
    engine.save("students", &students_b(), &owner(2)).unwrap();

    engine.reclaim("students", ReclaimOptions::default()).unwrap();

    let changed = students_a(); // Al back to 20: differs from r3
    let c = engine.save("students", &changed, &owner(3)).unwrap();
    assert_eq!(c.row_ids, vec![5, 2]);
}

#[test]
fn test_reclaim_unknown_table() {
    let (_dir, mut engine) = setup_engine();
    let err = engine
        .reclaim("missing", ReclaimOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}
