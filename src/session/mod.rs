//! Digest session controller.
//!
//! [`DigestSession`] owns every piece of user-visible state: query
//! parameters, the loaded diffs, pagination cursors and the loading/error
//! flags. All mutation goes through its `&mut self` methods, and each change
//! is mirrored to the key-value store as a single versioned
//! [`SessionSnapshot`].
//!
//! A fetch is one listing request raced against a deadline. When the deadline
//! wins, the request's [`CancellationToken`] is cancelled so the gateway can
//! release the connection, and the session records `Request timed out`.

mod registry;
mod state;

pub use registry::{BatchReport, CardRegistry, NoteGenerator};
pub use state::{
    DEFAULT_PAGE, DEFAULT_PER_PAGE, PageState, SESSION_KEY, SNAPSHOT_VERSION, SessionFlags,
    SessionSnapshot, clamp_page, clamp_per_page, parse_page_input, parse_per_page_input,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DigestError;
use crate::listing::{DiffItem, DiffListingGateway, DiffListingPage, DiffListingQuery};
use crate::persistence::{DIFF_PREFIX, KeyValueStore, PERSISTED_PREFIX};
use crate::stats::PrStats;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Default deadline for one listing request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of consecutive automatic re-fetches.
pub const DEFAULT_AUTO_FETCH_RETRY_LIMIT: u32 = 3;

/// Tunables for a [`DigestSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Deadline for one listing request.
    pub timeout: Duration,
    /// Maximum consecutive automatic re-fetches of an empty list.
    pub auto_fetch_retry_limit: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            auto_fetch_retry_limit: DEFAULT_AUTO_FETCH_RETRY_LIMIT,
        }
    }
}

/// State controller for fetching, paginating and persisting merged pull
/// request diffs.
pub struct DigestSession {
    gateway: Arc<dyn DiffListingGateway>,
    store: Arc<dyn KeyValueStore>,
    telemetry: Arc<dyn TelemetrySink>,
    settings: SessionSettings,
    page: PageState,
    flags: SessionFlags,
    diffs: Vec<DiffItem>,
    cards: CardRegistry,
}

impl std::fmt::Debug for DigestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestSession")
            .field("settings", &self.settings)
            .field("page", &self.page)
            .field("flags", &self.flags)
            .field("diffs", &self.diffs.len())
            .field("cards", &self.cards)
            .finish_non_exhaustive()
    }
}

impl DigestSession {
    /// Creates a session with default state.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn DiffListingGateway>,
        store: Arc<dyn KeyValueStore>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            telemetry,
            settings,
            page: PageState::default(),
            flags: SessionFlags::default(),
            diffs: Vec::new(),
            cards: CardRegistry::default(),
        }
    }

    /// Creates a session from the stored snapshot, or with default state
    /// when none is usable.
    ///
    /// `is_loading` and `is_batch_generating` are always restored as
    /// `false`: nothing can be in flight in a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when the store cannot be read.
    pub fn restore(
        gateway: Arc<dyn DiffListingGateway>,
        store: Arc<dyn KeyValueStore>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: SessionSettings,
    ) -> Result<Self, DigestError> {
        let mut session = Self::new(gateway, store, telemetry, settings);
        if let Some(snapshot) = SessionSnapshot::load(session.store.as_ref())? {
            tracing::debug!(diffs = snapshot.diffs.len(), "restored session snapshot");
            session.page = snapshot.page;
            session.flags = SessionFlags {
                is_loading: false,
                is_batch_generating: false,
                ..snapshot.flags
            };
            session.diffs = snapshot.diffs;
        }
        Ok(session)
    }

    /// Loaded diffs in display order.
    #[must_use]
    pub fn diffs(&self) -> &[DiffItem] {
        &self.diffs
    }

    /// Query parameters and pagination cursors.
    #[must_use]
    pub const fn page_state(&self) -> &PageState {
        &self.page
    }

    /// Loading and error flags.
    #[must_use]
    pub const fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    /// Error from the last failed operation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.flags.error.as_deref()
    }

    /// Ids with a registered note generator, in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<String> {
        self.cards.ids()
    }

    /// Number of automatic re-fetches since the counter last reset.
    #[must_use]
    pub const fn auto_fetch_attempts(&self) -> u32 {
        self.flags.auto_fetch_attempts
    }

    /// Stats panel figures for the loaded diffs.
    #[must_use]
    pub fn stats(&self) -> PrStats {
        PrStats::from_diffs(&self.diffs, None)
    }

    /// Sets the repository owner.
    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.page.owner = owner.into();
        self.persist();
    }

    /// Sets the repository name.
    pub fn set_repo(&mut self, repo: impl Into<String>) {
        self.page.repo = repo.into();
        self.persist();
    }

    /// Sets the page used by the next fetch; values below 1 become 1.
    pub fn set_page(&mut self, page: u32) {
        self.page.page = clamp_page(page);
        self.persist();
    }

    /// Sets the page size, clamped to `1..=100` with 0 meaning the default.
    pub fn set_per_page(&mut self, per_page: u32) {
        self.page.per_page = clamp_per_page(per_page);
        self.persist();
    }

    /// Fetches `page_num` and merges it into the loaded diffs.
    ///
    /// Page 1 replaces the list; later pages append. On failure the list is
    /// cleared when `page_num` is 1 and left untouched otherwise. In every
    /// case the error text is recorded in [`SessionFlags::error`] and
    /// `is_loading` is cleared before returning.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Validation`] without any request when owner or
    /// repo is blank, [`DigestError::Timeout`] when the deadline passes, and
    /// the gateway's error otherwise.
    pub async fn fetch_diffs(&mut self, page_num: u32) -> Result<(), DigestError> {
        if !self.page.has_repository() {
            let error = DigestError::missing_repository();
            self.flags.error = Some(error.to_string());
            self.persist();
            return Err(error);
        }

        self.flags.is_loading = true;
        self.flags.error = None;
        self.persist();

        let query = DiffListingQuery {
            owner: self.page.owner.trim().to_owned(),
            repo: self.page.repo.trim().to_owned(),
            page: page_num,
            per_page: self.page.per_page,
        };
        tracing::info!(
            owner = %query.owner,
            repo = %query.repo,
            page = page_num,
            per_page = query.per_page,
            "fetching diffs"
        );

        let started = Instant::now();
        let outcome = self.request_page(&query).await;
        let result = match outcome {
            Ok(listing) => {
                self.record_fetch(page_num, listing.diffs.len(), started.elapsed());
                self.apply_listing(page_num, listing);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(page = page_num, %error, "diff fetch failed");
                if page_num == 1 {
                    self.diffs.clear();
                }
                self.flags.error = Some(error.to_string());
                Err(error)
            }
        };

        self.flags.is_loading = false;
        self.persist();
        result
    }

    async fn request_page(&self, query: &DiffListingQuery) -> Result<DiffListingPage, DigestError> {
        let cancel = CancellationToken::new();
        let request = self.gateway.list_diffs(query, cancel.clone());

        tokio::select! {
            result = request => result,
            () = tokio::time::sleep(self.settings.timeout) => {
                cancel.cancel();
                Err(DigestError::Timeout)
            }
        }
    }

    fn apply_listing(&mut self, page_num: u32, listing: DiffListingPage) {
        let DiffListingPage {
            diffs,
            current_page,
            next_page,
        } = listing;

        if !diffs.is_empty() {
            self.flags.auto_fetch_attempts = 0;
        }
        if page_num == 1 {
            self.diffs = diffs;
        } else {
            self.diffs.extend(diffs);
        }
        self.page.current_page = current_page;
        self.page.next_page = next_page;
        self.flags.initial_fetch_done = true;
    }

    fn record_fetch(&self, page: u32, received: usize, elapsed: Duration) {
        let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(page, received, latency_ms, "fetched diffs");
        self.telemetry.record(TelemetryEvent::DiffsFetched {
            page,
            received,
            latency_ms,
        });
    }

    /// Starts over: clears the loaded diffs and fetches the chosen page.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`Self::fetch_diffs`].
    pub async fn handle_fetch_click(&mut self) -> Result<(), DigestError> {
        self.diffs.clear();
        self.flags.auto_fetch_attempts = 0;
        self.persist();
        self.fetch_diffs(self.page.page).await
    }

    /// Fetches the next page when one exists and nothing is loading.
    ///
    /// Returns `false` when there was nothing to load.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`Self::fetch_diffs`].
    pub async fn load_more(&mut self) -> Result<bool, DigestError> {
        let Some(next_page) = self.page.next_page else {
            return Ok(false);
        };
        if self.flags.is_loading {
            return Ok(false);
        }
        self.flags.auto_fetch_attempts = 0;
        self.fetch_diffs(next_page).await?;
        Ok(true)
    }

    /// Re-fetches the current page when an earlier fetch succeeded but the
    /// list is now empty.
    ///
    /// At most [`SessionSettings::auto_fetch_retry_limit`] consecutive
    /// attempts are made; the counter resets on user fetches, on any fetch
    /// that returns diffs, and on [`Self::clear_all_state`]. Returns `true`
    /// when a fetch was attempted.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`Self::fetch_diffs`].
    pub async fn auto_fetch_if_needed(&mut self) -> Result<bool, DigestError> {
        let needed = self.flags.initial_fetch_done
            && self.diffs.is_empty()
            && !self.flags.is_loading
            && self.page.current_page > 0
            && self.page.has_repository();
        if !needed {
            return Ok(false);
        }

        if self.flags.auto_fetch_attempts >= self.settings.auto_fetch_retry_limit {
            tracing::debug!(
                attempts = self.flags.auto_fetch_attempts,
                "automatic re-fetch limit reached"
            );
            return Ok(false);
        }

        self.flags.auto_fetch_attempts += 1;
        tracing::info!(
            attempt = self.flags.auto_fetch_attempts,
            page = self.page.current_page,
            "re-fetching empty diff list"
        );
        self.fetch_diffs(self.page.current_page).await?;
        Ok(true)
    }

    /// Registers the note generator for `id`; `None` is ignored.
    pub fn register_diff_card(
        &mut self,
        id: impl Into<String>,
        handle: Option<Arc<dyn NoteGenerator>>,
    ) {
        self.cards.register(id, handle);
    }

    /// Removes the note generator for `id`.
    pub fn unregister_diff_card(&mut self, id: &str) {
        self.cards.unregister(id);
    }

    /// Generates notes for every registered item, one at a time.
    ///
    /// The batch works on the registrations present when it starts, in
    /// registration order. A failing item is logged and recorded in the
    /// report; the remaining items still run.
    pub async fn handle_batch_generate_click(&mut self) -> BatchReport {
        let handles = self.cards.snapshot();
        self.flags.is_batch_generating = true;
        self.persist();

        let mut report = BatchReport::default();
        for (id, handle) in handles {
            match handle.generate_notes().await {
                Ok(()) => report.generated.push(id),
                Err(error) => {
                    tracing::error!(id = %id, %error, "release note generation failed");
                    report.failed.push((id, error.to_string()));
                }
            }
        }

        self.flags.is_batch_generating = false;
        self.persist();
        self.telemetry.record(TelemetryEvent::BatchGenerationCompleted {
            generated: report.generated.len(),
            failed: report.failed.len(),
        });
        report
    }

    /// Resets every piece of state to its default, drops registered
    /// generators and purges every `persisted-` and `diff-` key.
    ///
    /// Returns the number of purged keys.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when the purge fails; in-memory
    /// state is reset regardless.
    pub fn clear_all_state(&mut self) -> Result<usize, DigestError> {
        self.page = PageState::default();
        self.flags = SessionFlags::default();
        self.diffs.clear();
        self.cards.clear();

        let removed = self
            .store
            .remove_prefixed(&[PERSISTED_PREFIX, DIFF_PREFIX])?;
        tracing::info!(removed, "cleared session state");
        Ok(removed)
    }

    fn persist(&self) {
        let snapshot =
            SessionSnapshot::new(self.page.clone(), self.flags.clone(), self.diffs.clone());
        if let Err(error) = snapshot.save(self.store.as_ref()) {
            tracing::warn!(%error, "failed to persist session snapshot");
        }
    }
}
