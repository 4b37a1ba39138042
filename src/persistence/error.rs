//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned while initialising, migrating, or using the session store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The key-value table has not been created yet.
    #[error("session store schema not initialised (run with --migrate-db)")]
    SchemaNotInitialised,

    /// A read query failed.
    #[error("session store query failed: {message}")]
    QueryFailed {
        /// Error detail from the backend.
        message: String,
    },

    /// A write failed and was rolled back.
    #[error("session store write failed: {message}")]
    WriteFailed {
        /// Error detail from the backend.
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("stored value for '{key}' is invalid: {message}")]
    InvalidValue {
        /// Key whose value failed to round-trip.
        key: String,
        /// Serializer error detail.
        message: String,
    },

    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("session store lock poisoned")]
    LockPoisoned,
}
