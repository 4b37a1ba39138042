//! Registry of per-item release note capabilities.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::DigestError;

/// Capability exposed by each displayed pull request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    /// Generates and stores release notes for one pull request.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] when generation or storage fails.
    async fn generate_notes(&self) -> Result<(), DigestError>;
}

/// Ordered mapping from item id to its [`NoteGenerator`].
///
/// The first registration of an id fixes its position; registering the same
/// id again swaps the handle in place.
#[derive(Default, Clone)]
pub struct CardRegistry {
    handles: IndexMap<String, Arc<dyn NoteGenerator>>,
}

impl fmt::Debug for CardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardRegistry")
            .field("ids", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CardRegistry {
    /// Registers `handle` under `id`. Returns `false` when `handle` is `None`
    /// and nothing was stored.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        handle: Option<Arc<dyn NoteGenerator>>,
    ) -> bool {
        let Some(generator) = handle else {
            return false;
        };
        self.handles.insert(id.into(), generator);
        true
    }

    /// Removes `id`, keeping the order of the remaining entries.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.handles.shift_remove(id).is_some()
    }

    /// Registered ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.handles.keys().cloned().collect()
    }

    /// Copies the current entries so a batch is unaffected by later changes.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn NoteGenerator>)> {
        self.handles
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drops every handle.
    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

/// Per-item outcome of a batch generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Ids whose notes were generated, in processing order.
    pub generated: Vec<String>,
    /// Ids whose generation failed, with the error text.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// Total number of items attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.generated.len() + self.failed.len()
    }
}
