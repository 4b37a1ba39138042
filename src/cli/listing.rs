//! Fetch, resume, and load-more operations.

use std::io::Write;

use diff_digest::{DigestError, DigestSession};

use super::output::{io_error, write_session_summary};

/// Starts a fresh listing from the configured page.
///
/// The summary is written even when the fetch fails, so the recorded error
/// is visible alongside the (cleared) list.
///
/// # Errors
///
/// Returns the fetch error after the summary is written.
pub async fn fetch<W: Write>(session: &mut DigestSession, writer: &mut W) -> Result<(), DigestError> {
    let outcome = session.handle_fetch_click().await;
    write_session_summary(writer, session)?;
    outcome
}

/// Appends the next page of the stored listing.
///
/// # Errors
///
/// Returns the fetch error after the summary is written.
pub async fn load_more<W: Write>(
    session: &mut DigestSession,
    writer: &mut W,
) -> Result<(), DigestError> {
    let outcome = session.load_more().await;
    if matches!(outcome, Ok(false)) {
        writeln!(writer, "No more pull requests to load.").map_err(|e| io_error(&e))?;
    }
    write_session_summary(writer, session)?;
    outcome.map(drop)
}

/// Shows the stored listing, re-fetching it when an earlier fetch left it
/// empty.
///
/// # Errors
///
/// Returns the fetch error after the summary is written.
pub async fn resume<W: Write>(session: &mut DigestSession, writer: &mut W) -> Result<(), DigestError> {
    let outcome = session.auto_fetch_if_needed().await;
    write_session_summary(writer, session)?;
    outcome.map(drop)
}
