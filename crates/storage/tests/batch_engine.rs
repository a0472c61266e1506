#![forbid(unsafe_code)]

use rowsync_core::{Operation, OperationError, OperationKind, RowData, Scalar};
use rowsync_storage::{BatchOutcome, Persister, SqlitePersister, StoreConfig, StoreError};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;
use std::sync::Barrier;
use std::thread;
use tempfile::TempDir;

const TODOS_SQL: &str = r#"
    CREATE TABLE todos (
      id TEXT PRIMARY KEY,
      text TEXT NOT NULL DEFAULT '',
      done INTEGER NOT NULL DEFAULT 0,
      list_id TEXT
    );
"#;

struct Fixture {
    _dir: TempDir,
    db_path: PathBuf,
    persister: SqlitePersister,
}

impl Fixture {
    fn open(test_name: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("rowsync_{test_name}_"))
            .tempdir()
            .expect("create temp dir");
        let db_path = dir.path().join("rowsync.db");
        let persister = SqlitePersister::open(&StoreConfig::new(db_path.to_string_lossy()))
            .expect("open persister");
        let conn = Connection::open(&db_path).expect("open raw connection");
        conn.execute_batch(TODOS_SQL).expect("create todos");
        Self {
            _dir: dir,
            db_path,
            persister,
        }
    }

    fn raw(&self) -> Connection {
        Connection::open(&self.db_path).expect("open raw connection")
    }

    fn todo(&self, id: &str) -> Option<(String, i64, Option<String>)> {
        self.raw()
            .query_row(
                "SELECT text, done, list_id FROM todos WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .expect("query todo")
    }

    fn todo_count(&self) -> i64 {
        self.raw()
            .query_row("SELECT COUNT(1) FROM todos", [], |row| row.get(0))
            .expect("count todos")
    }
}

fn data(pairs: &[(&str, Scalar)]) -> RowData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn put_then_patch_yields_merged_row() {
    let fx = Fixture::open("put_then_patch_yields_merged_row");

    fx.persister
        .apply_batch(&[Operation::put(
            "todos",
            "1",
            data(&[("text", "buy milk".into()), ("done", false.into())]),
        )])
        .expect("put");
    fx.persister
        .apply_batch(&[Operation::patch("todos", "1", data(&[("done", true.into())]))])
        .expect("patch");

    assert_eq!(fx.todo("1"), Some(("buy milk".to_string(), 1, None)));
}

#[test]
fn invalid_last_operation_rolls_back_whole_batch() {
    let fx = Fixture::open("invalid_last_operation_rolls_back_whole_batch");

    let batch = vec![
        Operation::put("todos", "1", data(&[("text", "a".into())])),
        Operation::put("todos", "2", data(&[("text", "b".into())])),
        Operation::patch("todos", "1", data(&[("owner", "me".into())])),
    ];
    let err = fx.persister.apply_batch(&batch).expect_err("unknown column");
    match err {
        StoreError::Invalid { index, source } => {
            assert_eq!(index, 2);
            assert_eq!(
                source,
                OperationError::UnknownColumn {
                    table: "todos".to_string(),
                    column: "owner".to_string(),
                }
            );
        }
        other => panic!("expected Invalid error, got {other:?}"),
    }

    assert_eq!(fx.todo_count(), 0, "expected atomic rollback");
}

#[test]
fn backend_failure_rolls_back_whole_batch() {
    let fx = Fixture::open("backend_failure_rolls_back_whole_batch");

    let batch = vec![
        Operation::put("todos", "1", data(&[("text", "a".into())])),
        Operation::delete("todos", "missing"),
        Operation::put("todos", "2", data(&[("text", Scalar::Null)])),
    ];
    let err = fx.persister.apply_batch(&batch).expect_err("not null violation");
    assert_eq!(err.operation_index(), Some(2));
    assert!(!err.is_validation());
    assert!(
        err.to_string().contains("NOT NULL"),
        "unexpected message: {err}"
    );

    assert_eq!(fx.todo_count(), 0, "expected atomic rollback");
}

#[test]
fn put_is_idempotent() {
    let fx = Fixture::open("put_is_idempotent");
    let put = Operation::put(
        "todos",
        "1",
        data(&[("text", "buy milk".into()), ("list_id", "l1".into())]),
    );

    fx.persister.apply_batch(&[put.clone()]).expect("first put");
    let once = fx.todo("1");
    fx.persister.apply_batch(&[put]).expect("second put");

    assert_eq!(fx.todo("1"), once);
    assert_eq!(fx.todo_count(), 1);
}

#[test]
fn put_leaves_absent_columns_alone() {
    let fx = Fixture::open("put_leaves_absent_columns_alone");

    fx.persister
        .apply_batch(&[Operation::put("todos", "1", data(&[("text", "draft".into())]))])
        .expect("insert");
    assert_eq!(fx.todo("1"), Some(("draft".to_string(), 0, None)));

    fx.persister
        .apply_batch(&[
            Operation::patch("todos", "1", data(&[("done", true.into())])),
            Operation::put("todos", "1", data(&[("list_id", "l9".into())])),
        ])
        .expect("upsert");
    assert_eq!(
        fx.todo("1"),
        Some(("draft".to_string(), 1, Some("l9".to_string())))
    );
}

#[test]
fn patch_on_missing_row_changes_nothing() {
    let fx = Fixture::open("patch_on_missing_row_changes_nothing");

    let outcome = fx
        .persister
        .apply_batch(&[Operation::patch(
            "todos",
            "missing",
            data(&[("done", true.into())]),
        )])
        .expect("patch");

    assert_eq!(
        outcome,
        BatchOutcome {
            operations: 1,
            rows_changed: 0
        }
    );
    assert_eq!(fx.todo_count(), 0);
}

#[test]
fn delete_is_idempotent() {
    let fx = Fixture::open("delete_is_idempotent");
    fx.persister
        .apply_batch(&[Operation::put("todos", "1", data(&[("text", "a".into())]))])
        .expect("put");

    let first = fx
        .persister
        .apply_batch(&[Operation::delete("todos", "1")])
        .expect("first delete");
    let second = fx
        .persister
        .apply_batch(&[Operation::delete("todos", "1")])
        .expect("second delete");

    assert_eq!(first.rows_changed, 1);
    assert_eq!(second.rows_changed, 0);
    assert_eq!(fx.todo("1"), None);
}

#[test]
fn later_operations_see_earlier_ones() {
    let fx = Fixture::open("later_operations_see_earlier_ones");

    let outcome = fx
        .persister
        .apply_batch(&[
            Operation::put("todos", "1", data(&[("text", "a".into())])),
            Operation::patch("todos", "1", data(&[("text", "b".into())])),
            Operation::put("todos", "2", data(&[("text", "c".into())])),
            Operation::delete("todos", "2"),
        ])
        .expect("batch");

    assert_eq!(outcome.operations, 4);
    assert_eq!(outcome.rows_changed, 4);
    assert_eq!(fx.todo("1"), Some(("b".to_string(), 0, None)));
    assert_eq!(fx.todo("2"), None);
}

#[test]
fn put_reads_id_from_data_when_absent() {
    let fx = Fixture::open("put_reads_id_from_data_when_absent");

    let op = Operation {
        kind: OperationKind::Put,
        table: "todos".to_string(),
        id: None,
        data: Some(data(&[("id", "7".into()), ("text", "from data".into())])),
    };
    fx.persister.apply_batch(&[op]).expect("put");

    assert_eq!(fx.todo("7"), Some(("from data".to_string(), 0, None)));
}

#[test]
fn hostile_table_names_are_rejected_before_execution() {
    let fx = Fixture::open("hostile_table_names_are_rejected_before_execution");
    fx.persister
        .apply_batch(&[Operation::put("todos", "1", data(&[("text", "a".into())]))])
        .expect("put");

    let err = fx
        .persister
        .apply_batch(&[Operation::delete("todos; DROP TABLE todos; --", "1")])
        .expect_err("hostile table");
    assert!(err.is_validation());
    assert!(matches!(
        err,
        StoreError::Invalid {
            index: 0,
            source: OperationError::InvalidIdentifier { .. }
        }
    ));

    assert_eq!(fx.todo_count(), 1);
}

#[test]
fn checkpoint_table_is_not_writable_through_batches() {
    let fx = Fixture::open("checkpoint_table_is_not_writable_through_batches");
    assert_eq!(fx.persister.create_checkpoint("u1", "c1").expect("bump"), 1);

    let err = fx
        .persister
        .apply_batch(&[Operation::patch(
            "checkpoints",
            "u1",
            data(&[("checkpoint", Scalar::Integer(100))]),
        )])
        .expect_err("reserved table");
    assert!(matches!(
        err,
        StoreError::Invalid {
            source: OperationError::ReservedTable(_),
            ..
        }
    ));

    assert_eq!(fx.persister.create_checkpoint("u1", "c1").expect("bump"), 2);
}

#[test]
fn table_created_after_open_is_visible() {
    let fx = Fixture::open("table_created_after_open_is_visible");
    fx.raw()
        .execute_batch("CREATE TABLE lists (id TEXT PRIMARY KEY, name TEXT);")
        .expect("create lists");

    fx.persister
        .apply_batch(&[Operation::put("lists", "l1", data(&[("name", "groceries".into())]))])
        .expect("put list");

    let name: String = fx
        .raw()
        .query_row("SELECT name FROM lists WHERE id = 'l1'", [], |row| row.get(0))
        .expect("read list");
    assert_eq!(name, "groceries");
}

#[test]
fn empty_batch_commits_nothing() {
    let fx = Fixture::open("empty_batch_commits_nothing");
    let outcome = fx.persister.apply_batch(&[]).expect("empty batch");
    assert_eq!(outcome, BatchOutcome::default());
}

#[test]
fn columns_differing_only_in_case_are_rejected() {
    let fx = Fixture::open("columns_differing_only_in_case_are_rejected");

    let err = fx
        .persister
        .apply_batch(&[Operation::put(
            "todos",
            "1",
            data(&[("DONE", Scalar::Integer(5)), ("done", Scalar::Integer(7))]),
        )])
        .expect_err("duplicate put column");
    assert!(matches!(
        err,
        StoreError::Invalid {
            index: 0,
            source: OperationError::DuplicateColumn { .. }
        }
    ));
    assert_eq!(fx.todo_count(), 0);

    fx.persister
        .apply_batch(&[Operation::put("todos", "1", data(&[("text", "a".into())]))])
        .expect("put");
    let err = fx
        .persister
        .apply_batch(&[Operation::patch(
            "todos",
            "1",
            data(&[("Text", "b".into()), ("text", "c".into())]),
        )])
        .expect_err("duplicate patch column");
    assert!(err.is_validation());
    assert_eq!(fx.todo("1"), Some(("a".to_string(), 0, None)));
}

#[test]
fn concurrent_batches_all_commit() {
    const THREADS: usize = 8;
    const BATCHES_PER_THREAD: usize = 25;

    let fx = Fixture::open("concurrent_batches_all_commit");
    let barrier = Barrier::new(THREADS);

    let mut checkpoints = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|worker| {
                let persister = &fx.persister;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let mut seen = Vec::with_capacity(BATCHES_PER_THREAD);
                    for n in 0..BATCHES_PER_THREAD {
                        let id = format!("{worker}-{n}");
                        let outcome = persister
                            .apply_batch(&[
                                Operation::put("todos", id.as_str(), data(&[("text", "x".into())])),
                                Operation::patch("todos", id.as_str(), data(&[("done", true.into())])),
                            ])
                            .expect("batch");
                        assert_eq!(outcome.rows_changed, 2);
                        seen.push(persister.create_checkpoint("u1", "c1").expect("bump"));
                    }
                    seen
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("join"))
            .collect::<Vec<_>>()
    });
    checkpoints.sort_unstable();

    let total = THREADS * BATCHES_PER_THREAD;
    assert_eq!(fx.todo_count(), total as i64);
    let done: i64 = fx
        .raw()
        .query_row("SELECT COUNT(1) FROM todos WHERE done = 1", [], |row| {
            row.get(0)
        })
        .expect("count done");
    assert_eq!(done, total as i64);
    assert_eq!(checkpoints, (1..=total as i64).collect::<Vec<_>>());
}
