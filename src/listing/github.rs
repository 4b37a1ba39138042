//! Octocrab-backed gateway that builds diff pages from the GitHub REST API.

use async_trait::async_trait;
use http::Uri;
use octocrab::{Octocrab, Page};
use tokio_util::sync::CancellationToken;

use crate::error::DigestError;

use super::error_mapping::map_octocrab_error;
use super::models::{ApiPullRequest, DiffItem, DiffListingPage};
use super::token::PersonalAccessToken;
use super::{DiffListingGateway, DiffListingQuery, MAX_PER_PAGE};

/// Base URL of the public GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Lists closed pull requests, keeps the merged ones, and downloads each diff.
pub struct OctocrabDiffListingGateway {
    client: Octocrab,
}

impl OctocrabDiffListingGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the API base URL, authenticated when a
    /// token is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when the base URI cannot be
    /// parsed or Octocrab fails to construct a client.
    pub fn for_api(
        token: Option<&PersonalAccessToken>,
        api_base: &str,
    ) -> Result<Self, DigestError> {
        let base_uri: Uri = api_base
            .parse::<Uri>()
            .map_err(|error| DigestError::Configuration {
                message: format!("invalid GitHub API URL '{api_base}': {error}"),
            })?;

        let mut builder = Octocrab::builder()
            .base_uri(base_uri)
            .map_err(|error| DigestError::Configuration {
                message: format!("build client failed: {error}"),
            })?;
        if let Some(pat) = token {
            builder = builder.personal_token(pat.value());
        }

        let client = builder.build().map_err(|error| DigestError::Configuration {
            message: format!("build client failed: {error}"),
        })?;
        Ok(Self::new(client))
    }

    async fn fetch_page(&self, query: &DiffListingQuery) -> Result<DiffListingPage, DigestError> {
        validate_pagination(query)?;
        validate_path_segment("owner", &query.owner)?;
        validate_path_segment("repo", &query.repo)?;

        let page_str = query.page.to_string();
        let per_page_str = query.per_page.to_string();
        let params = [
            ("state", "closed"),
            ("sort", "updated"),
            ("direction", "desc"),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];
        let route = format!(
            "/repos/{owner}/{repo}/pulls",
            owner = query.owner,
            repo = query.repo
        );

        let page: Page<ApiPullRequest> = self
            .client
            .get(route, Some(&params))
            .await
            .map_err(|error| map_octocrab_error("list pulls", &error))?;

        let has_next = page.next.is_some();
        let mut diffs: Vec<DiffItem> = Vec::new();
        for pull_request in page.items.into_iter().filter(ApiPullRequest::is_merged) {
            let diff = self
                .client
                .pulls(query.owner.as_str(), query.repo.as_str())
                .get_diff(pull_request.number)
                .await
                .map_err(|error| map_octocrab_error("fetch diff", &error))?;
            diffs.push(pull_request.into_item(diff));
        }

        Ok(DiffListingPage {
            diffs,
            current_page: query.page,
            next_page: has_next.then(|| query.page.saturating_add(1)),
        })
    }
}

#[async_trait]
impl DiffListingGateway for OctocrabDiffListingGateway {
    async fn list_diffs(
        &self,
        query: &DiffListingQuery,
        cancel: CancellationToken,
    ) -> Result<DiffListingPage, DigestError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DigestError::Cancelled),
            result = self.fetch_page(query) => result,
        }
    }
}

fn validate_pagination(query: &DiffListingQuery) -> Result<(), DigestError> {
    if query.page == 0 {
        return Err(DigestError::Validation {
            message: "page must be at least 1".to_owned(),
        });
    }
    if query.per_page == 0 || query.per_page > MAX_PER_PAGE {
        return Err(DigestError::Validation {
            message: format!("per_page must be between 1 and {MAX_PER_PAGE}"),
        });
    }
    Ok(())
}

/// GitHub account and repository names are limited to ASCII letters, digits,
/// `-`, `_` and `.`; anything else would change the request path.
fn validate_path_segment(field: &str, value: &str) -> Result<(), DigestError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if value.is_empty() || value == "." || value == ".." || !value.chars().all(allowed) {
        return Err(DigestError::Validation {
            message: format!("{field} '{value}' is not a valid GitHub name"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::OctocrabDiffListingGateway;
    use crate::error::DigestError;
    use crate::listing::{DiffListingGateway, DiffListingQuery, PersonalAccessToken};

    const PULLS_PATH: &str = "/repos/owner/repo/pulls";

    fn query(page: u32, per_page: u8) -> DiffListingQuery {
        DiffListingQuery {
            owner: "owner".to_owned(),
            repo: "repo".to_owned(),
            page,
            per_page,
        }
    }

    fn gateway_for(server: &MockServer) -> OctocrabDiffListingGateway {
        let token = PersonalAccessToken::new("valid-token").expect("token should be valid");
        OctocrabDiffListingGateway::for_api(Some(&token), &server.uri())
            .expect("should create gateway")
    }

    #[tokio::test]
    async fn list_diffs_keeps_merged_pull_requests_with_their_diffs() {
        let server = MockServer::start().await;
        let next_url = format!(
            "{uri}{PULLS_PATH}?state=closed&page=3&per_page=2",
            uri = server.uri()
        );
        let response = ResponseTemplate::new(200)
            .set_body_json(serde_json::json!([
                {
                    "number": 7,
                    "title": "Add retry support",
                    "body": "Retries transient failures.",
                    "html_url": "https://github.com/owner/repo/pull/7",
                    "merged_at": "2025-01-02T00:00:00Z"
                },
                {
                    "number": 8,
                    "title": "Abandoned experiment",
                    "body": null,
                    "html_url": "https://github.com/owner/repo/pull/8",
                    "merged_at": null
                }
            ]))
            .insert_header("Link", format!("<{next_url}>; rel=\"next\""));

        Mock::given(method("GET"))
            .and(path(PULLS_PATH))
            .and(query_param("state", "closed"))
            .and(query_param("sort", "updated"))
            .and(query_param("direction", "desc"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "2"))
            .respond_with(response)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{PULLS_PATH}/7")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("--- a/src/retry.rs\n+++ b/src/retry.rs\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = gateway_for(&server)
            .list_diffs(&query(2, 2), CancellationToken::new())
            .await
            .expect("listing should succeed");

        assert_eq!(page.current_page, 2);
        assert_eq!(page.next_page, Some(3));
        let [item] = page.diffs.as_slice() else {
            panic!("expected exactly one merged item, got {:?}", page.diffs);
        };
        assert_eq!(item.id, "7");
        assert_eq!(item.description, "Add retry support\n\nRetries transient failures.");
        assert_eq!(item.diff, "--- a/src/retry.rs\n+++ b/src/retry.rs\n");
        assert_eq!(item.url, "https://github.com/owner/repo/pull/7");
    }

    #[tokio::test]
    async fn list_diffs_reports_end_of_listing_without_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PULLS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let page = gateway_for(&server)
            .list_diffs(&query(1, 10), CancellationToken::new())
            .await
            .expect("listing should succeed");

        assert!(page.diffs.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn list_diffs_maps_github_errors_to_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PULLS_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest/pulls/pulls#list-pull-requests"
            })))
            .mount(&server)
            .await;

        let error = gateway_for(&server)
            .list_diffs(&query(1, 10), CancellationToken::new())
            .await
            .expect_err("listing should fail");

        assert_eq!(
            error,
            DigestError::Server {
                status: 404,
                message: "Not Found".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn list_diffs_rejects_invalid_pagination() {
        let server = MockServer::start().await;

        let error = gateway_for(&server)
            .list_diffs(&query(1, 0), CancellationToken::new())
            .await
            .expect_err("per_page of zero should be rejected");

        assert!(matches!(error, DigestError::Validation { .. }));
    }

    #[rstest]
    #[case::slash_in_owner("open/ai", "repo")]
    #[case::query_in_repo("owner", "a?b")]
    #[case::space_in_repo("owner", "a b")]
    #[case::parent_segment("..", "repo")]
    #[case::fragment_in_owner("own#er", "repo")]
    #[tokio::test]
    async fn list_diffs_rejects_names_that_would_alter_the_route(
        #[case] owner: &str,
        #[case] repo: &str,
    ) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;
        let unsafe_query = DiffListingQuery {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            ..query(1, 10)
        };

        let error = gateway_for(&server)
            .list_diffs(&unsafe_query, CancellationToken::new())
            .await
            .expect_err("unsafe names should be rejected");

        assert!(
            matches!(error, DigestError::Validation { .. }),
            "expected validation error, got {error:?}"
        );
    }

    #[tokio::test]
    async fn list_diffs_accepts_dotted_and_dashed_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/my-org/repo.rs_v2/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let named = DiffListingQuery {
            owner: "my-org".to_owned(),
            repo: "repo.rs_v2".to_owned(),
            ..query(1, 10)
        };

        let page = gateway_for(&server)
            .list_diffs(&named, CancellationToken::new())
            .await
            .expect("listing should succeed");

        assert!(page.diffs.is_empty());
    }

    #[tokio::test]
    async fn anonymous_clients_are_supported() {
        assert!(OctocrabDiffListingGateway::for_api(None, "https://api.github.com").is_ok());
    }
}
