//! Database migration operations.

use std::io::Write;

use diff_digest::persistence::{PersistenceError, migrate_database};
use diff_digest::telemetry::StderrJsonlTelemetrySink;
use diff_digest::{DiffDigestConfig, DigestError};

use super::output::io_error;

/// Runs database migrations and reports the resulting schema version.
///
/// # Errors
///
/// Returns [`DigestError::Configuration`] if the database URL is missing or blank.
/// Returns [`DigestError::Io`] for connection or migration failures.
pub fn run<W: Write>(config: &DiffDigestConfig, writer: &mut W) -> Result<(), DigestError> {
    let database_url =
        config
            .database_url
            .as_deref()
            .ok_or_else(|| DigestError::Configuration {
                message: "database URL is required (use --database-url)".to_owned(),
            })?;

    let telemetry = StderrJsonlTelemetrySink;
    let version =
        migrate_database(database_url, &telemetry).map_err(|error| map_persistence_error(&error))?;
    writeln!(writer, "Session store schema version: {}", version.as_str())
        .map_err(|e| io_error(&e))
}

/// Maps a persistence error to a digest error.
///
/// Configuration-related errors (blank URL) become [`DigestError::Configuration`],
/// while runtime errors (connection, migration, query failures) become
/// [`DigestError::Io`].
fn map_persistence_error(error: &PersistenceError) -> DigestError {
    if is_configuration_error(error) {
        DigestError::Configuration {
            message: error.to_string(),
        }
    } else {
        DigestError::Io {
            message: error.to_string(),
        }
    }
}

/// Returns true if the persistence error is a configuration problem.
const fn is_configuration_error(error: &PersistenceError) -> bool {
    matches!(error, PersistenceError::BlankDatabaseUrl)
}
