//! Local persistence and database migrations.
//!
//! Diff Digest mirrors its session state into a key-value store. The durable
//! backend is a local `SQLite` database whose schema is managed with Diesel
//! migrations; an in-memory store backs ephemeral runs and tests.

mod error;
mod key_value;
mod migrator;
mod sqlite_store;

pub use error::PersistenceError;
pub use key_value::{DIFF_PREFIX, KeyValueStore, MemoryKeyValueStore, PERSISTED_PREFIX};
pub use migrator::{INITIAL_SCHEMA_VERSION, MIGRATIONS, SchemaVersion, migrate_database};
pub use sqlite_store::SqliteKeyValueStore;
