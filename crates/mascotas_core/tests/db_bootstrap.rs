use mascotas_core::db::{latest_version, SchemaError};
use mascotas_core::{
    AppConfig, ConfigErrorKind, ConnectionError, ConnectionSource, DatabaseConfig,
    SqliteConnectionProvider,
};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn provider_creates_schema_on_first_connection() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SqliteConnectionProvider::new(&DatabaseConfig::sqlite(dir.path().join("m.db")))
        .unwrap();

    let conn = provider.get_connection().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "microchip");
    assert_table_exists(&conn, "mascota");
    assert!(conn.is_autocommit());
}

#[test]
fn every_connection_enforces_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SqliteConnectionProvider::new(&DatabaseConfig::sqlite(dir.path().join("m.db")))
        .unwrap();

    let first = provider.get_connection().unwrap();
    let second = provider.get_connection().unwrap();
    for conn in [&first, &second] {
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}

#[test]
fn reopening_same_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::sqlite(dir.path().join("m.db"));
    let provider = SqliteConnectionProvider::new(&config).unwrap();

    drop(provider.get_connection().unwrap());
    let conn = provider.get_connection().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let provider = SqliteConnectionProvider::new(&DatabaseConfig::sqlite(&path)).unwrap();
    let err = provider.get_connection().unwrap_err();
    match err {
        ConnectionError::Schema(SchemaError::UnsupportedVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_creation_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        create_schema: false,
        ..DatabaseConfig::sqlite(dir.path().join("bare.db"))
    };
    let conn = SqliteConnectionProvider::new(&config)
        .unwrap()
        .get_connection()
        .unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn unopenable_path_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("m.db");
    let provider = SqliteConnectionProvider::new(&DatabaseConfig::sqlite(path)).unwrap();

    let err = provider.get_connection().unwrap_err();
    assert!(matches!(err, ConnectionError::Open { .. }));
}

#[test]
fn startup_failure_kinds_are_distinguishable() {
    let dir = tempfile::tempdir().unwrap();

    let missing_file = AppConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(missing_file.kind(), ConfigErrorKind::Unreadable);

    let wrong_driver = SqliteConnectionProvider::new(&DatabaseConfig {
        driver: Some("postgres".to_string()),
        ..DatabaseConfig::sqlite("m.db")
    })
    .unwrap_err();
    assert_eq!(wrong_driver.kind(), ConfigErrorKind::DriverUnavailable);

    let no_path = SqliteConnectionProvider::new(&DatabaseConfig {
        path: None,
        ..DatabaseConfig::sqlite("m.db")
    })
    .unwrap_err();
    assert_eq!(no_path.kind(), ConfigErrorKind::MissingField);
}

#[test]
fn config_file_feeds_the_provider() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("from-file.db");
    let config_path = dir.path().join("mascotas.toml");
    std::fs::write(
        &config_path,
        format!(
            "[database]\ndriver = \"sqlite\"\npath = \"{}\"\nbusy_timeout_ms = 1200\n",
            db_path.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load(&config_path).unwrap();
    let provider = SqliteConnectionProvider::new(&config.database).unwrap();
    assert_eq!(provider.settings().path, db_path);
    assert_eq!(provider.settings().busy_timeout, Duration::from_millis(1200));

    drop(provider.get_connection().unwrap());
    assert!(db_path.exists());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
