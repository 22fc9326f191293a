use appcharts_core::db::migrations::latest_version;
use appcharts_core::db::{open_db, open_db_in_memory, DbError};
use appcharts_core::{ChartRepository, ChartType, EntryQuery, SqliteChartRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "top_apps");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("charts.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "top_apps");
}

#[test]
fn existing_unversioned_table_is_adopted_with_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE top_apps (
            country TEXT,
            chart_type TEXT,
            rank INTEGER,
            app_name TEXT,
            artist TEXT,
            icon_url TEXT,
            fetched_date TEXT,
            PRIMARY KEY (country, chart_type, rank, fetched_date)
        );
        INSERT INTO top_apps VALUES ('us', 'top-free', 1, 'Legacy', 'Old Co', '', '2024-12-31');
        INSERT INTO top_apps VALUES ('us', 'top-free', 2, 'Nameless Artist', NULL, NULL, '2024-12-31');
        INSERT INTO top_apps VALUES ('us', 'top-free', 3, NULL, 'Ghost Co', '', '2024-12-31');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM top_apps;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 3);
    drop(conn);

    let repo = SqliteChartRepository::try_new(&path).unwrap();
    let entries = repo.fetch_entries(&EntryQuery::latest("us", None)).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].app_name, "Nameless Artist");
    assert_eq!(entries[1].artist, "");
    assert_eq!(entries[1].icon_url, "");
    assert_eq!(entries[2].app_name, "");
    assert_eq!(entries[2].artist, "Ghost Co");

    let names = repo.app_names_for_latest(ChartType::TopFree, 50).unwrap();
    assert_eq!(names, vec!["", "Legacy", "Nameless Artist"]);
    assert_eq!(
        repo.app_icon("Nameless Artist", ChartType::TopFree, 50)
            .unwrap()
            .as_deref(),
        Some("")
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
