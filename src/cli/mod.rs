//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`clear`]: Wipe persisted session state
//! - [`listing`]: Fetch, resume, and load more diffs
//! - [`migrations`]: Database schema migrations
//! - [`notes`]: Batch release note generation
//! - [`report`]: Digest rendering
//!
//! Output formatting utilities are in [`output`]; subscriber setup is in
//! [`logging`].

use std::io::Write;
use std::sync::Arc;

use diff_digest::listing::DEFAULT_GITHUB_API_URL;
use diff_digest::persistence::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use diff_digest::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use diff_digest::{
    DiffDigestConfig, DiffListingGateway, DigestError, DigestSession, HttpDiffListingGateway,
    OctocrabDiffListingGateway, OperationMode,
};

pub mod clear;
pub mod listing;
pub mod logging;
pub mod migrations;
pub mod notes;
pub mod output;
pub mod report;

#[cfg(test)]
pub mod test_utils;

/// Collaborators shared by every session-backed operation.
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn DiffListingGateway>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl SessionContext {
    /// Opens the session store and listing gateway described by `config`.
    ///
    /// A configured `database_url` selects the `SQLite` store (migrated on
    /// open); otherwise the session lives in memory. A configured
    /// `listing_url` selects the HTTP listing endpoint; otherwise GitHub is
    /// queried directly.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when the database cannot be
    /// opened and [`DigestError::Configuration`] for unusable URLs or tokens.
    pub fn open(config: &DiffDigestConfig) -> Result<Self, DigestError> {
        let telemetry: Arc<dyn TelemetrySink> = Arc::new(StderrJsonlTelemetrySink);
        let store: Arc<dyn KeyValueStore> = match config.database_url.as_deref() {
            Some(database_url) => Arc::new(SqliteKeyValueStore::open(
                database_url,
                telemetry.as_ref(),
            )?),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        let gateway = build_gateway(config)?;
        Ok(Self::new(store, gateway, telemetry))
    }

    /// Assembles a context from explicit collaborators.
    #[must_use]
    pub const fn new(
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn DiffListingGateway>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            store,
            gateway,
            telemetry,
        }
    }

    /// The session store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Restores the stored session and applies the configured inputs.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when the store cannot be read.
    pub fn restore_session(&self, config: &DiffDigestConfig) -> Result<DigestSession, DigestError> {
        let mut session = DigestSession::restore(
            Arc::clone(&self.gateway),
            Arc::clone(&self.store),
            Arc::clone(&self.telemetry),
            config.session_settings(),
        )?;
        apply_inputs(&mut session, config);
        Ok(session)
    }
}

/// Copies the query inputs present in `config` into the session.
pub fn apply_inputs(session: &mut DigestSession, config: &DiffDigestConfig) {
    if let Some(owner) = config.owner.as_deref() {
        session.set_owner(owner);
    }
    if let Some(repo) = config.repo.as_deref() {
        session.set_repo(repo);
    }
    if let Some(page) = config.page {
        session.set_page(page);
    }
    if let Some(per_page) = config.per_page {
        session.set_per_page(per_page);
    }
}

fn build_gateway(config: &DiffDigestConfig) -> Result<Arc<dyn DiffListingGateway>, DigestError> {
    if let Some(listing_url) = config.listing_url.as_deref() {
        return Ok(Arc::new(HttpDiffListingGateway::new(listing_url)?));
    }
    let token = config.resolve_token()?;
    Ok(Arc::new(OctocrabDiffListingGateway::for_api(
        token.as_ref(),
        DEFAULT_GITHUB_API_URL,
    )?))
}

/// Runs the handler for `mode` against a restored session.
///
/// # Errors
///
/// Propagates the handler's error.
pub async fn dispatch<W: Write>(
    mode: OperationMode,
    config: &DiffDigestConfig,
    context: &SessionContext,
    session: &mut DigestSession,
    writer: &mut W,
) -> Result<(), DigestError> {
    match mode {
        OperationMode::Clear => clear::run(session, writer),
        OperationMode::MigrateDatabase => migrations::run(config, writer),
        OperationMode::Fetch => listing::fetch(session, writer).await,
        OperationMode::LoadMore => listing::load_more(session, writer).await,
        OperationMode::Resume => listing::resume(session, writer).await,
        OperationMode::GenerateNotes => {
            let service = notes::build_service(config)?;
            notes::run(session, context.store(), &service, writer).await
        }
        OperationMode::Report => {
            report::run(session, context.store().as_ref(), config.template_path(), writer)
        }
    }
}
