//! Per-pull-request release note capability.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DigestError;
use crate::listing::DiffItem;
use crate::persistence::{DIFF_PREFIX, KeyValueStore, PersistenceError};
use crate::session::NoteGenerator;

use super::{ReleaseNotes, ReleaseNotesService};

/// Store key holding the generated notes for pull request `id`.
#[must_use]
pub fn notes_key(id: &str) -> String {
    format!("{DIFF_PREFIX}{id}-notes")
}

/// Pairs a loaded pull request with the service that writes its notes.
#[derive(Clone)]
pub struct ReleaseNoteCard {
    item: DiffItem,
    service: Arc<dyn ReleaseNotesService>,
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for ReleaseNoteCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseNoteCard")
            .field("id", &self.item.id)
            .finish_non_exhaustive()
    }
}

impl ReleaseNoteCard {
    /// Creates a card for `item`.
    #[must_use]
    pub fn new(
        item: DiffItem,
        service: Arc<dyn ReleaseNotesService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            item,
            service,
            store,
        }
    }

    /// The pull request this card generates notes for.
    #[must_use]
    pub const fn item(&self) -> &DiffItem {
        &self.item
    }

    /// Returns previously generated notes, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Persistence`] when the store cannot be read or
    /// holds an undecodable value.
    pub fn cached_notes(&self) -> Result<Option<ReleaseNotes>, DigestError> {
        load_notes(self.store.as_ref(), &self.item.id)
    }
}

/// Reads the notes stored for pull request `id`, if any.
///
/// # Errors
///
/// Returns [`DigestError::Persistence`] when the store cannot be read or
/// holds an undecodable value.
pub fn load_notes(
    store: &dyn KeyValueStore,
    id: &str,
) -> Result<Option<ReleaseNotes>, DigestError> {
    let key = notes_key(id);
    let Some(raw) = store.get(&key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw).map(Some).map_err(|error| {
        DigestError::Persistence(PersistenceError::InvalidValue {
            key,
            message: error.to_string(),
        })
    })
}

#[async_trait]
impl NoteGenerator for ReleaseNoteCard {
    async fn generate_notes(&self) -> Result<(), DigestError> {
        let notes = self.service.generate(&self.item).await?;
        let key = notes_key(&self.item.id);
        let serialised = serde_json::to_string(&notes).map_err(|error| {
            DigestError::Persistence(PersistenceError::InvalidValue {
                key: key.clone(),
                message: error.to_string(),
            })
        })?;
        self.store.set(&key, &serialised)?;
        tracing::info!(id = %self.item.id, "stored release notes");
        Ok(())
    }
}
