//! Shared fixtures for CLI handler tests.

use std::sync::Arc;

use diff_digest::persistence::{KeyValueStore, MemoryKeyValueStore};
use diff_digest::telemetry::NoopTelemetrySink;
use diff_digest::{DiffListingGateway, DigestSession, HttpDiffListingGateway, SessionSettings};
use serde_json::{Value, json};

/// Path the mock listing endpoint is mounted on.
pub const LISTING_PATH: &str = "/api/sample-diffs";

/// Builds an HTTP listing gateway for `endpoint`.
pub fn gateway_for(endpoint: &str) -> Arc<dyn DiffListingGateway> {
    Arc::new(HttpDiffListingGateway::new(endpoint).expect("endpoint should parse"))
}

/// Builds a session for `openai/openai-node` against the mock server.
pub fn session_for(server_uri: &str) -> (DigestSession, Arc<MemoryKeyValueStore>) {
    let store = Arc::new(MemoryKeyValueStore::new());
    let store_handle: Arc<dyn KeyValueStore> = store.clone();
    let mut session = DigestSession::new(
        gateway_for(&format!("{server_uri}{LISTING_PATH}")),
        store_handle,
        Arc::new(NoopTelemetrySink),
        SessionSettings::default(),
    );
    session.set_owner("openai");
    session.set_repo("openai-node");
    (session, store)
}

/// Listing payload with one diff per id.
pub fn listing_body(ids: &[&str], current_page: u32, next_page: Option<u32>) -> Value {
    let diffs: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "description": format!("Change {id}\n\nDetails"),
                "diff": format!("--- a/src/lib{id}.rs\n+++ b/src/lib{id}.rs\n"),
                "url": format!("https://github.com/openai/openai-node/pull/{id}"),
            })
        })
        .collect();
    json!({
        "diffs": diffs,
        "currentPage": current_page,
        "nextPage": next_page,
    })
}

/// Decodes captured writer output.
pub fn output_text(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).expect("output should be valid UTF-8")
}
