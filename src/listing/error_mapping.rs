//! Error mapping helpers for the listing gateways.

use http::StatusCode;

use crate::error::DigestError;

use super::models::ApiErrorBody;

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> DigestError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return DigestError::Server {
            status: source.status_code.as_u16(),
            message: source.message.clone(),
        };
    }

    if is_network_error(error) {
        return DigestError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    DigestError::Decode {
        message: format!("{operation} failed: {error}"),
    }
}

pub(super) fn map_reqwest_error(error: &reqwest::Error) -> DigestError {
    if error.is_decode() {
        return DigestError::Decode {
            message: error.to_string(),
        };
    }
    DigestError::Network {
        message: error.to_string(),
    }
}

/// Picks the server-provided `error` field when the body carries one,
/// otherwise the generic status message.
pub(super) fn map_http_error(status: StatusCode, body: &str) -> DigestError {
    let server_message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty());

    match server_message {
        Some(message) => DigestError::Server {
            status: status.as_u16(),
            message,
        },
        None => DigestError::http_status(status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use rstest::rstest;

    use super::map_http_error;
    use crate::error::DigestError;

    #[rstest]
    #[case::server_message(StatusCode::NOT_FOUND, r#"{"error":"Not Found"}"#, "Not Found")]
    #[case::html_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", "HTTP error! status: 502")]
    #[case::empty_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":""}"#, "HTTP error! status: 500")]
    #[case::no_error_field(StatusCode::FORBIDDEN, r#"{"message":"nope"}"#, "HTTP error! status: 403")]
    fn http_errors_prefer_the_server_message(
        #[case] status: StatusCode,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let error = map_http_error(status, body);

        assert_eq!(error.to_string(), expected);
        assert!(matches!(error, DigestError::Server { status: code, .. } if code == status.as_u16()));
    }
}
