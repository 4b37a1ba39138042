//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.diff-digest.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `DIFF_DIGEST_OWNER`, `DIFF_DIGEST_TOKEN`,
//!    and so on, plus the legacy `GITHUB_TOKEN` and `OPENAI_API_KEY`
//! 4. **Command-line arguments** – `--owner`/`-o`, `--repo`/`-r`, ...
//!
//! # Configuration File
//!
//! ```toml
//! owner = "openai"
//! repo = "openai-node"
//! per_page = 10
//! database_url = "diff-digest.sqlite"
//! ai_model = "gpt-4o-mini"
//! ```

use std::env;
use std::time::Duration;

use camino::Utf8Path;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::error::DigestError;
use crate::listing::PersonalAccessToken;
use crate::notes::{
    DEFAULT_AI_BASE_URL, DEFAULT_AI_MODEL, DEFAULT_AI_TIMEOUT_SECS, OpenAiReleaseNotesConfig,
};
use crate::session::{DEFAULT_AUTO_FETCH_RETRY_LIMIT, SessionSettings};

/// Default listing deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Operation selected by the action flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Wipe persisted session state and cached notes.
    Clear,
    /// Run database migrations and exit.
    MigrateDatabase,
    /// Fetch the next page of the restored session.
    LoadMore,
    /// Generate release notes for every loaded pull request.
    GenerateNotes,
    /// Render the digest for the restored session.
    Report,
    /// Show the restored session, re-fetching it when it is empty.
    Resume,
    /// Start a fresh listing for the configured repository.
    Fetch,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `DIFF_DIGEST_OWNER` or `--owner`: Repository owner
/// - `DIFF_DIGEST_REPO` or `--repo`: Repository name
/// - `DIFF_DIGEST_TOKEN`, `GITHUB_TOKEN`, or `--token`: GitHub token
/// - `DIFF_DIGEST_LISTING_URL` or `--listing-url`: Diff listing endpoint
/// - `DIFF_DIGEST_DATABASE_URL` or `--database-url`: Session store path
/// - `DIFF_DIGEST_AI_API_KEY`, `OPENAI_API_KEY`, or `--ai-api-key`
///
/// # Example
///
/// ```no_run
/// use diff_digest::DiffDigestConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = DiffDigestConfig::load().expect("failed to load configuration");
/// let mode = config.operation_mode();
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "DIFF_DIGEST",
    discovery(
        dotfile_name = ".diff-digest.toml",
        config_file_name = "diff-digest.toml",
        app_name = "diff-digest"
    )
)]
pub struct DiffDigestConfig {
    /// Repository owner (e.g., "openai").
    ///
    /// Can be provided via:
    /// - CLI: `--owner <OWNER>` or `-o <OWNER>`
    /// - Environment: `DIFF_DIGEST_OWNER`
    /// - Config file: `owner = "..."`
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "openai-node").
    ///
    /// Can be provided via:
    /// - CLI: `--repo <REPO>` or `-r <REPO>`
    /// - Environment: `DIFF_DIGEST_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Page to request first. Clamped to at least 1.
    #[ortho_config(cli_short = 'p')]
    pub page: Option<u32>,

    /// Items per page. Clamped to `1..=100`; zero selects the default.
    #[ortho_config(cli_short = 'n')]
    pub per_page: Option<u32>,

    /// Diff listing endpoint. When unset, GitHub is queried directly.
    #[ortho_config(cli_short = 'l')]
    pub listing_url: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `DIFF_DIGEST_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Listing request deadline in milliseconds.
    #[ortho_config()]
    pub timeout_ms: u64,

    /// Local `SQLite` database path for the session store.
    ///
    /// When unset the session lives in memory for a single run.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Base URL of the OpenAI-compatible chat completions API.
    #[ortho_config()]
    pub ai_base_url: Option<String>,

    /// Model used for release note generation.
    #[ortho_config()]
    pub ai_model: Option<String>,

    /// API key for release note generation.
    ///
    /// Can be provided via:
    /// - CLI: `--ai-api-key <KEY>`
    /// - Environment: `DIFF_DIGEST_AI_API_KEY` or `OPENAI_API_KEY`
    /// - Config file: `ai_api_key = "..."`
    #[ortho_config()]
    pub ai_api_key: Option<String>,

    /// Release note request timeout in seconds.
    #[ortho_config()]
    pub ai_timeout_seconds: u64,

    /// Maximum consecutive automatic re-fetches of an empty list.
    #[ortho_config()]
    pub auto_fetch_retry_limit: u32,

    /// Path to a custom digest template.
    #[ortho_config()]
    pub template: Option<String>,

    /// Loads the next page of the restored session.
    #[ortho_config(cli_short = 'm')]
    pub load_more: bool,

    /// Generates release notes for every loaded pull request.
    #[ortho_config(cli_short = 'g')]
    pub generate_notes: bool,

    /// Fetches the first requested page again, reusing the owner, repo, and
    /// paging inputs saved by the previous run unless new ones are given.
    #[ortho_config(cli_short = 'f')]
    pub fetch: bool,

    /// Clears all persisted state.
    #[ortho_config()]
    pub clear: bool,

    /// Renders the digest for the restored session.
    #[ortho_config()]
    pub report: bool,

    /// Runs database migrations and exits.
    ///
    /// Can be provided via:
    /// - CLI: `--migrate-db`
    /// - Environment: `DIFF_DIGEST_MIGRATE_DB`
    /// - Config file: `migrate_db = true`
    #[ortho_config()]
    pub migrate_db: bool,
}

impl Default for DiffDigestConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            page: None,
            per_page: None,
            listing_url: None,
            token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            database_url: None,
            ai_base_url: None,
            ai_model: None,
            ai_api_key: None,
            ai_timeout_seconds: DEFAULT_AI_TIMEOUT_SECS,
            auto_fetch_retry_limit: DEFAULT_AUTO_FETCH_RETRY_LIMIT,
            template: None,
            load_more: false,
            generate_notes: false,
            fetch: false,
            clear: false,
            report: false,
            migrate_db: false,
        }
    }
}

impl DiffDigestConfig {
    /// Determines the operation from the action flags.
    ///
    /// Explicit flags win in the order clear, migrate, load more, generate
    /// notes, report. After those, `--fetch` or any listing input (owner,
    /// repo, page, per page) starts a fresh fetch; missing inputs are taken
    /// from the stored session. With none of these the stored session is
    /// resumed.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.clear {
            OperationMode::Clear
        } else if self.migrate_db {
            OperationMode::MigrateDatabase
        } else if self.load_more {
            OperationMode::LoadMore
        } else if self.generate_notes {
            OperationMode::GenerateNotes
        } else if self.report {
            OperationMode::Report
        } else if self.fetch
            || self.owner.is_some()
            || self.repo.is_some()
            || self.page.is_some()
            || self.per_page.is_some()
        {
            OperationMode::Fetch
        } else {
            OperationMode::Resume
        }
    }

    /// Resolves the GitHub token from configuration or the legacy
    /// `GITHUB_TOKEN` environment variable. Returns `None` for anonymous
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when a configured token is
    /// blank.
    pub fn resolve_token(&self) -> Result<Option<PersonalAccessToken>, DigestError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .map(PersonalAccessToken::new)
            .transpose()
    }

    /// Resolves the AI API key from configuration or `OPENAI_API_KEY`.
    #[must_use]
    pub fn resolve_ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Session tunables derived from this configuration.
    #[must_use]
    pub const fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            auto_fetch_retry_limit: self.auto_fetch_retry_limit,
        }
    }

    /// Release note client settings derived from this configuration.
    #[must_use]
    pub fn release_notes_config(&self) -> OpenAiReleaseNotesConfig {
        OpenAiReleaseNotesConfig {
            base_url: self
                .ai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_owned()),
            model: self
                .ai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_owned()),
            api_key: self.resolve_ai_api_key(),
            timeout: Duration::from_secs(self.ai_timeout_seconds),
        }
    }

    /// Custom template path, if configured.
    #[must_use]
    pub fn template_path(&self) -> Option<&Utf8Path> {
        self.template.as_deref().map(Utf8Path::new)
    }
}

#[cfg(test)]
mod tests;
