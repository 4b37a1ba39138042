//! Clearing persisted session state.

use std::io::Write;

use diff_digest::{DigestError, DigestSession};

use super::output::io_error;

/// Resets the session and purges stored state and cached notes.
///
/// # Errors
///
/// Returns [`DigestError::Persistence`] when the purge fails.
pub fn run<W: Write>(session: &mut DigestSession, writer: &mut W) -> Result<(), DigestError> {
    let removed = session.clear_all_state()?;
    writeln!(writer, "Cleared {removed} stored entries.").map_err(|e| io_error(&e))
}

#[cfg(test)]
mod tests {
    use diff_digest::persistence::KeyValueStore;

    use super::run;
    use crate::cli::test_utils::{output_text, session_for};

    #[test]
    fn clear_reports_removed_entries_and_resets_state() {
        let (mut session, store) = session_for("http://127.0.0.1:9");
        store
            .set("diff-1-notes", "{}")
            .expect("write should succeed");

        let mut buffer = Vec::new();
        run(&mut session, &mut buffer).expect("clear should succeed");

        assert_eq!(output_text(buffer), "Cleared 2 stored entries.\n");
        assert!(session.page_state().owner.is_empty());
        assert!(store.keys().expect("keys should list").is_empty());
    }
}
