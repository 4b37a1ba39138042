//! Data models for the diff-listing endpoint and the GitHub REST API.

use serde::{Deserialize, Serialize};

/// One merged pull request and its unified diff.
///
/// Items are immutable once fetched; the session replaces or extends its list
/// wholesale and never edits an item in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffItem {
    /// Stable identifier of the pull request (its number for GitHub).
    pub id: String,
    /// Human-readable summary of the pull request.
    pub description: String,
    /// Unified diff text.
    pub diff: String,
    /// Link to the pull request.
    pub url: String,
}

/// One page of diffs returned by a listing gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffListingPage {
    /// Diffs on this page, in endpoint order.
    pub diffs: Vec<DiffItem>,
    /// Page the endpoint reports as current.
    pub current_page: u32,
    /// Next page to request, or `None` at the end of the listing.
    pub next_page: Option<u32>,
}

/// Wire payload of the diff-listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiDiffListing {
    #[serde(default)]
    pub(super) diffs: Vec<DiffItem>,
    pub(super) current_page: Option<u32>,
    pub(super) next_page: Option<u32>,
}

impl ApiDiffListing {
    /// Converts the payload, falling back to the requested page when the
    /// endpoint omits `currentPage`.
    pub(super) fn into_page(self, requested_page: u32) -> DiffListingPage {
        DiffListingPage {
            diffs: self.diffs,
            current_page: self.current_page.unwrap_or(requested_page),
            next_page: self.next_page,
        }
    }
}

/// Error envelope returned alongside non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) error: Option<String>,
}

/// Pull request fields read from the GitHub list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: u64,
    pub(super) title: Option<String>,
    pub(super) body: Option<String>,
    pub(super) html_url: Option<String>,
    pub(super) merged_at: Option<String>,
}

impl ApiPullRequest {
    pub(super) const fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    /// Builds the display description from the title and optional body.
    pub(super) fn description(&self) -> String {
        let title = self.title.as_deref().unwrap_or("(no title)");
        match self.body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => format!("{title}\n\n{body}"),
            _ => title.to_owned(),
        }
    }

    pub(super) fn into_item(self, diff: String) -> DiffItem {
        let description = self.description();
        DiffItem {
            id: self.number.to_string(),
            description,
            diff,
            url: self.html_url.unwrap_or_default(),
        }
    }
}
