use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use tabdelta_core::model::{ColumnSpec, OwnerRef, Snapshot, Value};
use tabdelta_engine::DeltaEngine;
use tabdelta_store::StoreConfig;
use tempfile::TempDir;

/// Open an engine on a fresh on-disk store
///
/// The TempDir must be kept alive for as long as the engine is used.
#[allow(dead_code)]
pub fn setup_engine() -> (TempDir, DeltaEngine) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let engine = DeltaEngine::open(dir.path().join("tabdelta.db"), &StoreConfig::default())
        .expect("Failed to open engine");
    (dir, engine)
}

/// Owner reference for the statement on `line`, at a fixed time
#[allow(dead_code)]
pub fn owner(line: u32) -> OwnerRef {
    OwnerRef::new("df", format!("notebook.py:{}", line))
        .at(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap())
}

/// students(id, name, age): (1, Al, 20), (2, Bo, 19)
#[allow(dead_code)]
pub fn students_a() -> Snapshot {
    Snapshot::new(vec![
        ColumnSpec::new("id", "int64"),
        ColumnSpec::new("name", "object"),
        ColumnSpec::new("age", "float64"),
    ])
    .with_row(vec![Value::Int(1), "Al".into(), Value::Int(20)])
    .with_row(vec![Value::Int(2), "Bo".into(), Value::Int(19)])
}

/// Al's age changed, Bo unchanged, Cy new with a new `grade` column
#[allow(dead_code)]
pub fn students_b() -> Snapshot {
    Snapshot::new(vec![
        ColumnSpec::new("id", "int64"),
        ColumnSpec::new("name", "object"),
        ColumnSpec::new("age", "float64"),
        ColumnSpec::new("grade", "object"),
    ])
    .with_row(vec![Value::Int(1), "Al".into(), Value::Int(21), Value::Null])
    .with_row(vec![Value::Int(2), "Bo".into(), Value::Int(19), Value::Null])
    .with_row(vec![Value::Int(3), "Cy".into(), Value::Int(22), "A".into()])
}

/// Every row of every table, in rowid order
///
/// Two equal dumps mean the database content is identical.
#[allow(dead_code)]
pub fn dump_state(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let mut dump = Vec::new();
    for table in tables {
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM \"{}\" ORDER BY rowid", table))
            .unwrap();
        let width = stmt.column_count();
        let mut rows = stmt.query([]).unwrap();
        while let Some(row) = rows.next().unwrap() {
            let cells: Vec<String> = (0..width)
                .map(|i| format!("{:?}", row.get_ref(i).unwrap()))
                .collect();
            dump.push(format!("{}|{}", table, cells.join("|")));
        }
    }
    dump
}
