//! Gateway for a diff-listing endpoint that already returns paged diffs.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::DigestError;

use super::error_mapping::{map_http_error, map_reqwest_error};
use super::models::{ApiDiffListing, DiffListingPage};
use super::{DiffListingGateway, DiffListingQuery};

/// Reqwest-backed gateway for `GET <endpoint>?owner=&repo=&page=&per_page=`.
#[derive(Debug, Clone)]
pub struct HttpDiffListingGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpDiffListingGateway {
    /// Creates a gateway for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when the URL cannot be parsed.
    pub fn new(endpoint: &str) -> Result<Self, DigestError> {
        let parsed = Url::parse(endpoint.trim()).map_err(|error| DigestError::Configuration {
            message: format!("invalid listing URL '{endpoint}': {error}"),
        })?;
        Ok(Self::with_client(reqwest::Client::new(), parsed))
    }

    /// Creates a gateway that reuses an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    fn request_url(&self, query: &DiffListingQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("owner", &query.owner)
            .append_pair("repo", &query.repo)
            .append_pair("page", &query.page.to_string())
            .append_pair("per_page", &query.per_page.to_string());
        url
    }
}

#[async_trait]
impl DiffListingGateway for HttpDiffListingGateway {
    async fn list_diffs(
        &self,
        query: &DiffListingQuery,
        cancel: CancellationToken,
    ) -> Result<DiffListingPage, DigestError> {
        let url = self.request_url(query);
        tracing::debug!(%url, "requesting diff listing");

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DigestError::Cancelled),
            result = request => result.map_err(|error| map_reqwest_error(&error))?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DigestError::Cancelled),
            result = response.text() => result.map_err(|error| map_reqwest_error(&error))?,
        };

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        let payload: ApiDiffListing =
            serde_json::from_str(&body).map_err(|error| DigestError::Decode {
                message: format!("invalid diff listing payload: {error}"),
            })?;
        Ok(payload.into_page(query.page))
    }
}
