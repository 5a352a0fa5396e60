use nota_core::db::migrations::{latest_version, schema_version};
use nota_core::db::{ensure_search_index, open_db, open_db_in_memory, DbError, SearchIndexStatus};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "note");
    assert_table_exists(&conn, "config");
    assert_table_exists(&conn, "note_fts");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nota.sqlite");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let mut conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "note");
    let status = ensure_search_index(&mut conn_second).unwrap();
    assert_eq!(status, SearchIndexStatus::Present);
    assert!(status.is_available());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn search_index_backfills_rows_written_before_it_existed() {
    let mut conn = Connection::open_in_memory().unwrap();
    nota_core::db::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO note (id, title, content, version, created_at, updated_at)
         VALUES ('note_old', 'Groceries', 'buy oranges', 1, 1, 1);",
        [],
    )
    .unwrap();

    let status = ensure_search_index(&mut conn).unwrap();
    assert_eq!(status, SearchIndexStatus::Created);
    assert!(status.is_available());
    assert!(!SearchIndexStatus::Unavailable.is_available());
    let hits: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM note_fts WHERE note_fts MATCH '\"orange\"';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(hits, 1);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
