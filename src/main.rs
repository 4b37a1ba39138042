//! Diff Digest CLI entrypoint.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use diff_digest::{DiffDigestConfig, DigestError, OperationMode};
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DigestError> {
    cli::logging::init()?;
    let config = load_config()?;
    let mode = config.operation_mode();
    tracing::debug!(?mode, "resolved operation mode");

    let mut stdout = io::stdout();

    if mode == OperationMode::MigrateDatabase {
        return cli::migrations::run(&config, &mut stdout);
    }

    let context = cli::SessionContext::open(&config)?;
    let mut session = context.restore_session(&config)?;
    cli::dispatch(mode, &config, &context, &mut session, &mut stdout).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`DigestError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<DiffDigestConfig, DigestError> {
    DiffDigestConfig::load().map_err(|error| DigestError::Configuration {
        message: error.to_string(),
    })
}
