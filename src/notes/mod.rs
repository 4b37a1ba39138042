//! Release note generation for individual pull requests.
//!
//! Each loaded pull request is paired with a [`ReleaseNoteCard`], which is the
//! capability the session's batch generation drives. Cards ask a
//! [`ReleaseNotesService`] for dual-tone notes and cache the result in the
//! session store under `diff-<id>-notes`.

mod card;
mod model;
mod openai;

pub use card::{ReleaseNoteCard, load_notes, notes_key};
pub use model::ReleaseNotes;
pub use openai::{
    DEFAULT_AI_BASE_URL, DEFAULT_AI_MODEL, DEFAULT_AI_TIMEOUT_SECS, OpenAiReleaseNotesConfig,
    OpenAiReleaseNotesService,
};

use async_trait::async_trait;

use crate::error::DigestError;
use crate::listing::DiffItem;

/// Provider that turns a pull request diff into release notes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseNotesService: Send + Sync {
    /// Generates notes for `item`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] when the provider call fails or its answer
    /// cannot be parsed.
    async fn generate(&self, item: &DiffItem) -> Result<ReleaseNotes, DigestError>;
}
