//! Application telemetry events and sinks.
//!
//! Diff Digest runs locally, but a few operational signals are still worth
//! capturing for debugging: the session store schema version, fetch latency,
//! and batch generation results.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by Diff Digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20261017000000`).
        schema_version: String,
    },
    /// Records a completed diff listing request.
    DiffsFetched {
        /// Page number that was requested.
        page: u32,
        /// Number of diffs the endpoint returned.
        received: usize,
        /// Wall-clock latency of the request in milliseconds.
        latency_ms: u64,
    },
    /// Records the outcome of a batch release note run.
    BatchGenerationCompleted {
        /// Number of pull requests that produced notes.
        generated: usize,
        /// Number of pull requests whose generation failed.
        failed: usize,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// In-memory sink for asserting on recorded events in tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every recorded event until [`RecordingSink::take`].
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingSink {
        /// Drains and returns the recorded events.
        ///
        /// # Panics
        ///
        /// Panics if the events mutex was poisoned by a panicking writer.
        #[must_use]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(|error| panic!("events mutex poisoned: {error}"))
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }
}
