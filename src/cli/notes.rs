//! Batch release note generation.

use std::io::Write;
use std::sync::Arc;

use diff_digest::persistence::KeyValueStore;
use diff_digest::{
    DiffDigestConfig, DigestError, DigestSession, NoteGenerator, OpenAiReleaseNotesService,
    ReleaseNoteCard, ReleaseNotesService,
};

use super::output::{io_error, write_batch_report};

/// Builds the release notes service from configuration.
///
/// # Errors
///
/// Returns [`DigestError::Configuration`] when no API key is configured or
/// the HTTP client cannot be built.
pub fn build_service(
    config: &DiffDigestConfig,
) -> Result<Arc<dyn ReleaseNotesService>, DigestError> {
    let notes_config = config.release_notes_config();
    if notes_config.api_key.is_none() {
        return Err(DigestError::Configuration {
            message: concat!(
                "AI API key is required (use --ai-api-key, ",
                "DIFF_DIGEST_AI_API_KEY, or OPENAI_API_KEY)"
            )
            .to_owned(),
        });
    }
    Ok(Arc::new(OpenAiReleaseNotesService::new(notes_config)?))
}

/// Registers a card for every loaded pull request and runs the batch.
///
/// # Errors
///
/// Returns [`DigestError::Generation`] when any item failed; the per-item
/// outcome is written first.
pub async fn run<W: Write>(
    session: &mut DigestSession,
    store: &Arc<dyn KeyValueStore>,
    service: &Arc<dyn ReleaseNotesService>,
    writer: &mut W,
) -> Result<(), DigestError> {
    if session.diffs().is_empty() {
        writeln!(writer, "No pull requests loaded; fetch a repository first.")
            .map_err(|e| io_error(&e))?;
        return Ok(());
    }

    let items = session.diffs().to_vec();
    for item in items {
        let id = item.id.clone();
        let card: Arc<dyn NoteGenerator> = Arc::new(ReleaseNoteCard::new(
            item,
            Arc::clone(service),
            Arc::clone(store),
        ));
        session.register_diff_card(id, Some(card));
    }

    let report = session.handle_batch_generate_click().await;
    write_batch_report(writer, &report)?;

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(DigestError::Generation {
            message: format!(
                "{} of {} pull requests failed",
                report.failed.len(),
                report.attempted()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use diff_digest::notes::load_notes;
    use diff_digest::persistence::KeyValueStore;
    use diff_digest::{DiffDigestConfig, DiffItem, DigestError, ReleaseNotes, ReleaseNotesService};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{build_service, run};
    use crate::cli::test_utils::{LISTING_PATH, listing_body, output_text, session_for};

    /// Answers every item except the ones listed in `failing`.
    struct ScriptedService {
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl ReleaseNotesService for ScriptedService {
        async fn generate(&self, item: &DiffItem) -> Result<ReleaseNotes, DigestError> {
            if self.failing.contains(&item.id.as_str()) {
                return Err(DigestError::Generation {
                    message: "provider unavailable".to_owned(),
                });
            }
            Ok(ReleaseNotes {
                developer: format!("Developer notes for {}", item.id),
                marketing: format!("Marketing notes for {}", item.id),
            })
        }
    }

    fn service(failing: Vec<&'static str>) -> Arc<dyn ReleaseNotesService> {
        Arc::new(ScriptedService { failing })
    }

    #[test]
    fn build_service_requires_an_api_key() {
        let _guard = env_lock::lock_env([("OPENAI_API_KEY", None::<&str>)]);
        let result = build_service(&DiffDigestConfig::default());

        assert!(
            matches!(result, Err(DigestError::Configuration { .. })),
            "missing key should be a configuration error"
        );
    }

    #[tokio::test]
    async fn batch_caches_notes_and_reports_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(listing_body(&["1", "2", "3"], 1, None)),
            )
            .mount(&server)
            .await;
        let (mut session, store) = session_for(&server.uri());
        session.handle_fetch_click().await.expect("fetch should succeed");
        let store_handle: Arc<dyn KeyValueStore> = store.clone();

        let mut buffer = Vec::new();
        let error = run(
            &mut session,
            &store_handle,
            &service(vec!["2"]),
            &mut buffer,
        )
        .await
        .expect_err("one failure should fail the run");

        assert!(matches!(error, DigestError::Generation { .. }));
        let output = output_text(buffer);
        assert!(
            output.contains("Generated release notes for 2 of 3 pull requests."),
            "{output}"
        );
        assert!(output.contains("#2 failed"), "{output}");
        assert!(load_notes(store.as_ref(), "1").expect("read").is_some());
        assert!(load_notes(store.as_ref(), "2").expect("read").is_none());
        assert!(load_notes(store.as_ref(), "3").expect("read").is_some());
        assert_eq!(session.registered_ids(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn empty_session_skips_generation() {
        let server = MockServer::start().await;
        let (mut session, store) = session_for(&server.uri());
        let store_handle: Arc<dyn KeyValueStore> = store;

        let mut buffer = Vec::new();
        run(
            &mut session,
            &store_handle,
            &service(Vec::new()),
            &mut buffer,
        )
        .await
        .expect("empty run should succeed");

        assert!(output_text(buffer).contains("No pull requests loaded"));
    }
}
