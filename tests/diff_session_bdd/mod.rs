//! Support modules for the diff session BDD tests.

pub(crate) mod state;

pub(crate) use state::{
    LISTING_PATH, SessionState, listing_body, restart_session, run_on_session, scenario_runtime,
    session_store,
};
