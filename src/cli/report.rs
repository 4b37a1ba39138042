//! Digest rendering for the stored session.

use std::io::Write;

use camino::Utf8Path;
use diff_digest::persistence::KeyValueStore;
use diff_digest::report::{DEFAULT_TEMPLATE, DigestReport, load_template, write_report};
use diff_digest::{DigestError, DigestSession};

/// Renders the digest through the configured or built-in template.
///
/// # Errors
///
/// Returns [`DigestError::Io`] when the template cannot be read or output
/// cannot be written, and [`DigestError::Configuration`] for template
/// errors.
pub fn run<W: Write>(
    session: &DigestSession,
    store: &dyn KeyValueStore,
    template_path: Option<&Utf8Path>,
    writer: &mut W,
) -> Result<(), DigestError> {
    let template = match template_path {
        Some(path) => load_template(path)?,
        None => DEFAULT_TEMPLATE.to_owned(),
    };
    let report = DigestReport::from_session(session, store)?;
    write_report(writer, &report, &template)
}
