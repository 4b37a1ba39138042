//! `SQLite`-backed key-value store.
//!
//! Each operation opens its own connection so the store can be shared across
//! the session controller and release note cards without holding a connection
//! for the lifetime of the process. Prefix purges run inside a transaction.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use crate::telemetry::TelemetrySink;

use super::{KeyValueStore, PersistenceError, migrate_database};

const KV_STORE_TABLE: &str = "kv_store";

/// SQLite-backed implementation of [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    database_url: String,
}

impl SqliteKeyValueStore {
    /// Creates a store targeting `database_url` without touching the schema.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string.trim().to_owned(),
        })
    }

    /// Applies pending migrations and returns a ready store.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the URL is blank or migrations fail.
    pub fn open(
        database_url: impl Into<String>,
        telemetry: &dyn TelemetrySink,
    ) -> Result<Self, PersistenceError> {
        let store = Self::new(database_url)?;
        migrate_database(&store.database_url, telemetry)?;
        Ok(store)
    }

    fn establish_connection(&self) -> Result<SqliteConnection, PersistenceError> {
        SqliteConnection::establish(&self.database_url).map_err(|error| {
            PersistenceError::ConnectionFailed {
                message: error.to_string(),
            }
        })
    }

    fn table_exists(connection: &mut SqliteConnection) -> Result<bool, diesel::result::Error> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            one: i64,
        }

        let exists: Option<Row> = sql_query(
            "SELECT 1 AS one FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1;",
        )
        .bind::<Text, _>(KV_STORE_TABLE)
        .get_result(connection)
        .optional()?;

        Ok(exists.is_some_and(|row| row.one == 1))
    }

    fn map_error_with_schema_check<F>(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
        create_error: F,
    ) -> PersistenceError
    where
        F: Fn(String) -> PersistenceError,
    {
        match Self::table_exists(connection) {
            Ok(false) => PersistenceError::SchemaNotInitialised,
            Ok(true) => create_error(error.to_string()),
            Err(check_error) => create_error(format!(
                "schema presence check failed: {check_error}; original error: {error}"
            )),
        }
    }

    fn map_query_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> PersistenceError {
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::QueryFailed { message }
        })
    }

    fn map_write_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> PersistenceError {
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::WriteFailed { message }
        })
    }
}

#[derive(Debug, QueryableByName)]
struct ValueRow {
    #[diesel(sql_type = Text)]
    item_value: String,
}

#[derive(Debug, QueryableByName)]
struct KeyRow {
    #[diesel(sql_type = Text)]
    item_key: String,
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let mut connection = self.establish_connection()?;

        let row: Option<ValueRow> =
            sql_query("SELECT item_value FROM kv_store WHERE item_key = ? LIMIT 1;")
                .bind::<Text, _>(key)
                .get_result(&mut connection)
                .optional()
                .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(row.map(|found| found.item_value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut connection = self.establish_connection()?;

        sql_query(
            "INSERT INTO kv_store (item_key, item_value) VALUES (?, ?) \
             ON CONFLICT(item_key) DO UPDATE SET \
               item_value = excluded.item_value, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(key)
        .bind::<Text, _>(value)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut connection = self.establish_connection()?;

        sql_query("DELETE FROM kv_store WHERE item_key = ?;")
            .bind::<Text, _>(key)
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let mut connection = self.establish_connection()?;

        let rows: Vec<KeyRow> = sql_query("SELECT item_key FROM kv_store ORDER BY item_key;")
            .load(&mut connection)
            .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(rows.into_iter().map(|row| row.item_key).collect())
    }

    fn remove_prefixed(&self, prefixes: &[&str]) -> Result<usize, PersistenceError> {
        let mut connection = self.establish_connection()?;

        let result = connection.transaction::<usize, diesel::result::Error, _>(|transaction| {
            let mut removed = 0;
            for prefix in prefixes {
                removed += sql_query(
                    "DELETE FROM kv_store WHERE substr(item_key, 1, length(?)) = ?;",
                )
                .bind::<Text, _>(*prefix)
                .bind::<Text, _>(*prefix)
                .execute(transaction)?;
            }
            Ok(removed)
        });

        result.map_err(|error| Self::map_write_error(&mut connection, &error))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::SqliteKeyValueStore;
    use crate::persistence::{DIFF_PREFIX, KeyValueStore, PERSISTED_PREFIX, PersistenceError};
    use crate::telemetry::NoopTelemetrySink;

    #[fixture]
    fn temp_db() -> (TempDir, String) {
        let temp_dir =
            TempDir::new().unwrap_or_else(|error| panic!("temp dir should be created: {error}"));
        let db_path = temp_dir.path().join("diff-digest.sqlite");
        (temp_dir, db_path.to_string_lossy().to_string())
    }

    #[fixture]
    fn migrated_store(temp_db: (TempDir, String)) -> (TempDir, SqliteKeyValueStore) {
        let (temp_dir, database_url) = temp_db;
        let store = SqliteKeyValueStore::open(database_url, &NoopTelemetrySink)
            .unwrap_or_else(|error| panic!("store should open: {error}"));
        (temp_dir, store)
    }

    #[rstest]
    fn store_round_trips_values(migrated_store: (TempDir, SqliteKeyValueStore)) {
        let (_temp_dir, store) = migrated_store;

        store
            .set("persisted-session", r#"{"version":1}"#)
            .unwrap_or_else(|error| panic!("write should succeed: {error}"));
        store
            .set("persisted-session", r#"{"version":2}"#)
            .unwrap_or_else(|error| panic!("overwrite should succeed: {error}"));

        let value = store
            .get("persisted-session")
            .unwrap_or_else(|error| panic!("read should succeed: {error}"));
        assert_eq!(value.as_deref(), Some(r#"{"version":2}"#));
        assert_eq!(
            store.get("missing").expect("read should succeed"),
            None,
            "missing keys should read as None"
        );
    }

    #[rstest]
    fn remove_prefixed_purges_both_namespaces(migrated_store: (TempDir, SqliteKeyValueStore)) {
        let (_temp_dir, store) = migrated_store;
        for key in ["persisted-session", "diff-7-notes", "other-key"] {
            store
                .set(key, "{}")
                .unwrap_or_else(|error| panic!("seed should succeed: {error}"));
        }

        let removed = store
            .remove_prefixed(&[PERSISTED_PREFIX, DIFF_PREFIX])
            .unwrap_or_else(|error| panic!("purge should succeed: {error}"));

        assert_eq!(removed, 2);
        assert_eq!(
            store.keys().expect("keys should list"),
            vec!["other-key".to_owned()]
        );
    }

    #[rstest]
    fn unmigrated_database_reports_missing_schema(temp_db: (TempDir, String)) {
        let (_temp_dir, database_url) = temp_db;
        let store = SqliteKeyValueStore::new(database_url)
            .unwrap_or_else(|error| panic!("store should build: {error}"));

        let error = store
            .get("persisted-session")
            .expect_err("query without schema should fail");

        assert_eq!(error, PersistenceError::SchemaNotInitialised);
    }

    #[rstest]
    fn blank_database_url_is_rejected() {
        let error = SqliteKeyValueStore::new("  ").expect_err("blank URL should be rejected");

        assert_eq!(error, PersistenceError::BlankDatabaseUrl);
    }
}
