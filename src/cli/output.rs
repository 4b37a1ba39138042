//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use diff_digest::{BatchReport, DigestError, DigestSession};

/// Writes the loaded diffs, stats panel, and pagination hint.
pub fn write_session_summary<W: Write>(
    writer: &mut W,
    session: &DigestSession,
) -> Result<(), DigestError> {
    let page = session.page_state();
    let stats = session.stats();

    if page.has_repository() {
        writeln!(
            writer,
            "Merged pull requests for {}/{} (page {}):",
            page.owner, page.repo, page.current_page
        )
        .map_err(|e| io_error(&e))?;
    } else {
        writeln!(writer, "No repository selected.").map_err(|e| io_error(&e))?;
    }
    writeln!(writer).map_err(|e| io_error(&e))?;

    for item in session.diffs() {
        let title = item.description.lines().next().unwrap_or("(no description)");
        writeln!(writer, "  #{} {title}", item.id).map_err(|e| io_error(&e))?;
        if !item.url.is_empty() {
            writeln!(writer, "    {}", item.url).map_err(|e| io_error(&e))?;
        }
    }
    if session.diffs().is_empty() {
        writeln!(writer, "  (no diffs loaded)").map_err(|e| io_error(&e))?;
    }

    writeln!(writer).map_err(|e| io_error(&e))?;
    writeln!(writer, "PRs merged: {}", stats.merged_count).map_err(|e| io_error(&e))?;
    writeln!(writer, "Languages: {}", stats.languages_label()).map_err(|e| io_error(&e))?;

    if let Some(error) = session.error() {
        writeln!(writer, "Error: {error}").map_err(|e| io_error(&e))?;
    }
    if let Some(next_page) = page.next_page {
        writeln!(
            writer,
            "More pull requests available from page {next_page} (use --load-more)."
        )
        .map_err(|e| io_error(&e))?;
    }

    Ok(())
}

/// Writes the per-item outcome of a batch generation run.
pub fn write_batch_report<W: Write>(writer: &mut W, report: &BatchReport) -> Result<(), DigestError> {
    writeln!(
        writer,
        "Generated release notes for {} of {} pull requests.",
        report.generated.len(),
        report.attempted()
    )
    .map_err(|e| io_error(&e))?;

    for (id, error) in &report.failed {
        writeln!(writer, "  #{id} failed: {error}").map_err(|e| io_error(&e))?;
    }
    Ok(())
}

/// Converts an I/O error to a [`DigestError::Io`].
pub(crate) fn io_error(error: &io::Error) -> DigestError {
    DigestError::Io {
        message: error.to_string(),
    }
}
