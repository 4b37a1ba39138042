//! Diff Digest library crate.
//!
//! The library fetches merged pull request diffs page by page, keeps the
//! listing session in a local key-value store so it survives restarts, ranks
//! the languages the diffs touch, and drafts developer and marketing release
//! notes for each pull request.

pub mod config;
pub mod error;
pub mod listing;
pub mod notes;
pub mod persistence;
pub mod report;
pub mod session;
pub mod stats;
pub mod telemetry;

pub use config::{DiffDigestConfig, OperationMode};
pub use error::DigestError;
pub use listing::{
    DiffItem, DiffListingGateway, DiffListingPage, DiffListingQuery, HttpDiffListingGateway,
    OctocrabDiffListingGateway, PersonalAccessToken,
};
pub use notes::{OpenAiReleaseNotesService, ReleaseNoteCard, ReleaseNotes, ReleaseNotesService};
pub use session::{BatchReport, DigestSession, NoteGenerator, SessionSettings};
pub use stats::{LanguageCount, PrStats};
