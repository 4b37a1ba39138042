//! Scenario state and session construction for the diff session BDD tests.

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use diff_digest::persistence::{KeyValueStore, MemoryKeyValueStore};
use diff_digest::telemetry::NoopTelemetrySink;
use diff_digest::{DigestError, DigestSession, HttpDiffListingGateway, SessionSettings};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::runtime::{Builder, Runtime};
use wiremock::MockServer;

/// Path the mock listing endpoint is mounted on.
pub(crate) const LISTING_PATH: &str = "/api/sample-diffs";

/// Single-threaded runtime shared by the steps of one scenario.
#[derive(Clone)]
pub(crate) struct ScenarioRuntime(Rc<Runtime>);

impl ScenarioRuntime {
    fn start() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|error| panic!("failed to build scenario runtime: {error}"));
        Self(Rc::new(runtime))
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}

#[derive(ScenarioState, Default)]
pub(crate) struct SessionState {
    pub(crate) runtime: Slot<ScenarioRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) temp_dir: Slot<TempDir>,
    pub(crate) store: Slot<Arc<dyn KeyValueStore>>,
    pub(crate) session: Slot<DigestSession>,
    pub(crate) error: Slot<DigestError>,
}

/// Returns the scenario runtime, starting it and the mock listing server on
/// first use.
pub(crate) fn scenario_runtime(session_state: &SessionState) -> ScenarioRuntime {
    let runtime = session_state.runtime.get().unwrap_or_else(|| {
        let started = ScenarioRuntime::start();
        session_state.runtime.set(started.clone());
        started
    });
    if session_state.server.with_ref(|_| ()).is_none() {
        session_state.server.set(runtime.block_on(MockServer::start()));
    }
    runtime
}

/// Returns the scenario's session store, creating an in-memory one on first
/// use.
pub(crate) fn session_store(session_state: &SessionState) -> Arc<dyn KeyValueStore> {
    if let Some(store) = session_state.store.get() {
        return store;
    }
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    session_state.store.set(Arc::clone(&store));
    store
}

fn restore_session(session_state: &SessionState) -> DigestSession {
    let endpoint = session_state
        .server
        .with_ref(|server| format!("{}{LISTING_PATH}", server.uri()))
        .unwrap_or_else(|| panic!("mock server not initialised"));
    let gateway = HttpDiffListingGateway::new(&endpoint)
        .unwrap_or_else(|error| panic!("invalid listing endpoint: {error}"));

    DigestSession::restore(
        Arc::new(gateway),
        session_store(session_state),
        Arc::new(NoopTelemetrySink),
        SessionSettings::default(),
    )
    .unwrap_or_else(|error| panic!("failed to restore session: {error}"))
}

/// Drops the active session and restores a fresh one from the store.
pub(crate) fn restart_session(session_state: &SessionState) {
    drop(session_state.session.take());
    scenario_runtime(session_state);
    session_state.session.set(restore_session(session_state));
}

/// Runs `action` against the scenario's session, restoring it from the
/// store when none is active, and records any returned error.
pub(crate) fn run_on_session<F>(session_state: &SessionState, action: F)
where
    F: AsyncFnOnce(&mut DigestSession) -> Result<(), DigestError>,
{
    let runtime = scenario_runtime(session_state);
    let mut session = session_state
        .session
        .take()
        .unwrap_or_else(|| restore_session(session_state));

    let outcome = runtime.block_on(action(&mut session));
    session_state.session.set(session);

    match outcome {
        Ok(()) => drop(session_state.error.take()),
        Err(error) => session_state.error.set(error),
    }
}

/// Listing payload with one Rust diff per id.
pub(crate) fn listing_body(first_id: u32, count: u32, page: u32, next_page: Option<u32>) -> Value {
    let diffs: Vec<Value> = (first_id..first_id + count)
        .map(|id| {
            json!({
                "id": id.to_string(),
                "description": format!("Change {id}"),
                "diff": format!("--- a/src/lib{id}.rs\n+++ b/src/lib{id}.rs\n@@ -1 +1 @@\n"),
                "url": format!("https://github.com/openai/openai-node/pull/{id}"),
            })
        })
        .collect();
    json!({
        "diffs": diffs,
        "currentPage": page,
        "nextPage": next_page,
    })
}
