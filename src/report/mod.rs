//! Markdown digest rendering using Jinja2-compatible templates.
//!
//! The digest summarises the loaded session: the PR stats panel, one entry
//! per pull request, and any release notes already generated for it. A
//! built-in template is used unless the caller supplies their own.
//!
//! # Available Variables
//!
//! - `owner`, `repo`: repository coordinates
//! - `generated_at`: render timestamp (ISO 8601)
//! - `merged_count`: number of merged pull requests
//! - `languages`: top languages label, e.g. `Rust (4), Go (2)`
//! - `top_languages`: list of `{language, count}` objects
//! - `next_page`: next page to load, if any
//! - `pull_requests`: list of `{id, title, description, url, notes}`, where
//!   `notes` is `{developer, marketing}` or empty

use std::io::Write;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::Utc;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::DigestError;
use crate::notes::{ReleaseNotes, load_notes};
use crate::persistence::KeyValueStore;
use crate::session::DigestSession;
use crate::stats::PrStats;

/// Template used when no custom template is configured.
pub const DEFAULT_TEMPLATE: &str = "\
# Diff Digest: {{ owner }}/{{ repo }}

Generated {{ generated_at }}

## PR Stats

- PRs merged: {{ merged_count }}
- Languages: {{ languages }}

## Pull requests
{% for pr in pull_requests %}
### #{{ pr.id }} {{ pr.title }}

{{ pr.url }}
{% if pr.notes %}
- Developer: {{ pr.notes.developer }}
- Marketing: {{ pr.notes.marketing }}
{% endif %}{% else %}
No pull requests loaded.
{% endfor %}{% if next_page %}
More pull requests are available from page {{ next_page }}.
{% endif %}";

/// One pull request entry in the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPullRequest {
    /// Pull request identifier.
    pub id: String,
    /// First line of the description.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Link to the pull request.
    pub url: String,
    /// Previously generated release notes.
    pub notes: Option<ReleaseNotes>,
}

/// Everything the digest template can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Next page to load, if any.
    pub next_page: Option<u32>,
    /// Stats panel figures.
    pub stats: PrStats,
    /// Loaded pull requests in display order.
    pub pull_requests: Vec<ReportPullRequest>,
}

impl DigestReport {
    /// Collects the session's diffs together with any cached notes.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when cached notes cannot be read.
    pub fn from_session(
        session: &DigestSession,
        store: &dyn KeyValueStore,
    ) -> Result<Self, DigestError> {
        let pull_requests = session
            .diffs()
            .iter()
            .map(|item| {
                Ok(ReportPullRequest {
                    id: item.id.clone(),
                    title: item.description.lines().next().unwrap_or_default().to_owned(),
                    description: item.description.clone(),
                    url: item.url.clone(),
                    notes: load_notes(store, &item.id)?,
                })
            })
            .collect::<Result<Vec<_>, DigestError>>()?;

        let page = session.page_state();
        Ok(Self {
            owner: page.owner.clone(),
            repo: page.repo.clone(),
            next_page: page.next_page,
            stats: session.stats(),
            pull_requests,
        })
    }
}

/// Renders `report` through `template_content` into `writer`.
///
/// # Errors
///
/// Returns [`DigestError::Configuration`] if the template has syntax errors
/// or fails to render. Returns [`DigestError::Io`] if writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &DigestReport,
    template_content: &str,
) -> Result<(), DigestError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);

    env.add_template("digest", template_content)
        .map_err(|e| DigestError::Configuration {
            message: format!("invalid template syntax: {e}"),
        })?;

    let ctx = context! {
        owner => &report.owner,
        repo => &report.repo,
        generated_at => Utc::now().to_rfc3339(),
        merged_count => report.stats.merged_count,
        languages => report.stats.languages_label(),
        top_languages => &report.stats.top_languages,
        next_page => report.next_page,
        pull_requests => &report.pull_requests,
    };

    let tmpl = env.get_template("digest").map_err(|e| DigestError::Io {
        message: format!("failed to retrieve template: {e}"),
    })?;

    let output = tmpl.render(ctx).map_err(|e| DigestError::Configuration {
        message: format!("template rendering failed: {e}"),
    })?;

    writer
        .write_all(output.as_bytes())
        .map_err(|e| DigestError::Io {
            message: format!("failed to write report: {e}"),
        })
}

/// Reads a template file relative to the working directory.
///
/// # Errors
///
/// Returns [`DigestError::Io`] when the file cannot be opened or read.
pub fn load_template(path: &Utf8Path) -> Result<String, DigestError> {
    let file_name = path.file_name().ok_or_else(|| DigestError::Io {
        message: format!("invalid template path '{path}': no file name"),
    })?;
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        DigestError::Io {
            message: format!("failed to open template directory '{parent}': {error}"),
        }
    })?;
    dir.read_to_string(file_name)
        .map_err(|error| DigestError::Io {
            message: format!("failed to read template '{path}': {error}"),
        })
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
