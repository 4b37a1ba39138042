//! Gateways that list merged pull requests together with their diffs.
//!
//! The session controller only depends on [`DiffListingGateway`]. Two
//! implementations exist: [`HttpDiffListingGateway`] talks to a diff-listing
//! endpoint that already returns `{diffs, currentPage, nextPage}` pages, and
//! [`OctocrabDiffListingGateway`] builds the same pages straight from the
//! GitHub REST API.

mod endpoint;
mod error_mapping;
mod github;
mod models;
mod token;

pub use endpoint::HttpDiffListingGateway;
pub use github::{DEFAULT_GITHUB_API_URL, OctocrabDiffListingGateway};
pub use models::{DiffItem, DiffListingPage};
pub use token::PersonalAccessToken;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DigestError;

/// Largest page size accepted by the listing endpoints.
pub const MAX_PER_PAGE: u8 = 100;

/// Parameters of a single listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffListingQuery {
    /// Repository owner (e.g. "openai").
    pub owner: String,
    /// Repository name (e.g. "openai-node").
    pub repo: String,
    /// Page number to fetch (1-based).
    pub page: u32,
    /// Items per page.
    pub per_page: u8,
}

/// Gateway that can list one page of merged pull request diffs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiffListingGateway: Send + Sync {
    /// Fetch one page of diffs.
    ///
    /// Implementations must stop work and return
    /// [`DigestError::Cancelled`] once `cancel` fires, releasing any
    /// in-flight request.
    async fn list_diffs(
        &self,
        query: &DiffListingQuery,
        cancel: CancellationToken,
    ) -> Result<DiffListingPage, DigestError>;
}
