//! Session state records and their persisted snapshot.

use serde::{Deserialize, Serialize};

use crate::listing::{DiffItem, MAX_PER_PAGE};
use crate::persistence::{KeyValueStore, PersistenceError};

/// Page requested when none has been chosen.
pub const DEFAULT_PAGE: u32 = 1;

/// Items per page when none has been chosen or the input is unusable.
pub const DEFAULT_PER_PAGE: u8 = 10;

/// Key under which the session snapshot is stored.
pub const SESSION_KEY: &str = "persisted-session";

/// Version tag written with every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Query parameters and pagination cursors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageState {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Items requested per page, within `1..=100`.
    pub per_page: u8,
    /// Page requested by the next "fetch" action.
    pub page: u32,
    /// Page most recently reported by the listing endpoint.
    pub current_page: u32,
    /// Next page to load, or `None` at the end of the listing.
    pub next_page: Option<u32>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            per_page: DEFAULT_PER_PAGE,
            page: DEFAULT_PAGE,
            current_page: DEFAULT_PAGE,
            next_page: None,
        }
    }
}

impl PageState {
    /// Returns `true` when both owner and repo are non-blank.
    #[must_use]
    pub fn has_repository(&self) -> bool {
        !self.owner.trim().is_empty() && !self.repo.trim().is_empty()
    }

    fn normalised(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = clamp_per_page(u32::from(self.per_page));
        self
    }
}

/// Loading and error flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionFlags {
    /// A listing request is in flight.
    pub is_loading: bool,
    /// Batch release note generation is running.
    pub is_batch_generating: bool,
    /// At least one listing request has succeeded.
    pub initial_fetch_done: bool,
    /// Human-readable error from the last failed operation.
    pub error: Option<String>,
    /// Consecutive automatic re-fetches of an empty list.
    pub auto_fetch_attempts: u32,
}

/// Versioned record of the whole session, written in a single store call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Query parameters and cursors.
    pub page: PageState,
    /// Loading and error flags.
    pub flags: SessionFlags,
    /// Loaded diffs in display order.
    pub diffs: Vec<DiffItem>,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u32,
}

impl SessionSnapshot {
    /// Builds a snapshot tagged with the current version.
    #[must_use]
    pub const fn new(page: PageState, flags: SessionFlags, diffs: Vec<DiffItem>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            page,
            flags,
            diffs,
        }
    }

    /// Reads the stored snapshot.
    ///
    /// Snapshots that cannot be decoded or carry another version are logged
    /// and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be read.
    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, PersistenceError> {
        let Some(raw) = store.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<VersionProbe>(&raw) {
            Ok(probe) if probe.version == SNAPSHOT_VERSION => {}
            Ok(probe) => {
                tracing::warn!(
                    found = probe.version,
                    expected = SNAPSHOT_VERSION,
                    "discarding session snapshot with unsupported version"
                );
                return Ok(None);
            }
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable session snapshot");
                return Ok(None);
            }
        }

        match serde_json::from_str::<Self>(&raw) {
            Ok(snapshot) => Ok(Some(Self {
                page: snapshot.page.normalised(),
                ..snapshot
            })),
            Err(error) => {
                tracing::warn!(%error, "discarding malformed session snapshot");
                Ok(None)
            }
        }
    }

    /// Writes the snapshot under [`SESSION_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when serialisation or the write fails.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), PersistenceError> {
        let serialised =
            serde_json::to_string(self).map_err(|error| PersistenceError::InvalidValue {
                key: SESSION_KEY.to_owned(),
                message: error.to_string(),
            })?;
        store.set(SESSION_KEY, &serialised)
    }
}

/// Clamps a page number to at least 1.
#[must_use]
pub fn clamp_page(page: u32) -> u32 {
    page.max(1)
}

/// Clamps an items-per-page value to `1..=100`; zero falls back to 10.
#[must_use]
pub fn clamp_per_page(per_page: u32) -> u8 {
    if per_page == 0 {
        return DEFAULT_PER_PAGE;
    }
    u8::try_from(per_page.min(u32::from(MAX_PER_PAGE))).unwrap_or(MAX_PER_PAGE)
}

/// Parses raw page input; unparsable or zero input becomes 1.
#[must_use]
pub fn parse_page_input(raw: &str) -> u32 {
    match parse_leading_integer(raw) {
        Some(value) if value != 0 => u32::try_from(value.max(1)).unwrap_or(u32::MAX),
        _ => DEFAULT_PAGE,
    }
}

/// Parses raw items-per-page input; unparsable or zero input becomes 10 and
/// everything else is clamped to `1..=100`.
#[must_use]
pub fn parse_per_page_input(raw: &str) -> u8 {
    match parse_leading_integer(raw) {
        Some(value) if value != 0 => {
            let clamped = value.clamp(1, i64::from(MAX_PER_PAGE));
            u8::try_from(clamped).unwrap_or(MAX_PER_PAGE)
        }
        _ => DEFAULT_PER_PAGE,
    }
}

/// Reads an optional sign and the leading run of digits, ignoring any
/// trailing text (`"12abc"` reads as 12).
fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = trimmed.strip_prefix('-').map_or_else(
        || (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        |rest| (true, rest),
    );
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
