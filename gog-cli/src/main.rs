//! gog CLI
//!
//! Command-line interface for gog authentication settings.
//!
//! # Usage
//!
//! ```bash
//! # Show where secrets are stored and why
//! gog auth keyring
//!
//! # Store secrets in the encrypted file backend
//! gog auth keyring file
//!
//! # Mint an access token from a token broker
//! gog auth remote-token --endpoint https://broker.example.com/token \
//!     --email me@example.com --scope https://mail.google.com/
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gog_core::{ConfigBackendResolver, ConfigStore, FileConfigStore, ProcessEnv};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod context;
mod error;
mod keyring;
mod remote_token;

use context::{CommandContext, OutputMode};
use error::{CommandError, EXIT_FAILURE};
use keyring::KeyringArgs;
use remote_token::RemoteTokenArgs;

#[derive(Parser)]
#[command(name = "gog")]
#[command(about = "Google account tooling from the command line")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a single JSON object on stdout
    #[arg(long, global = true, conflicts_with = "plain")]
    json: bool,

    /// Emit stable tab-separated output without hints or notes
    #[arg(long, global = true)]
    plain: bool,

    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication settings and tokens
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Show or set the keyring backend (auto|keychain|file)
    Keyring(KeyringArgs),

    /// Fetch an access token from a remote token endpoint
    RemoteToken(RemoteTokenArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gog: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Usage errors exit 2; everything else exits 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CommandError>()
        .map(CommandError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut ctx = CommandContext::new(OutputMode::from_flags(cli.json, cli.plain));

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Keyring(args) => {
                let store = match cli.config {
                    Some(path) => FileConfigStore::new(path),
                    None => FileConfigStore::at_default_path()
                        .context("Failed to locate config file")?,
                };
                debug!("Using config file {:?}", store.path());

                let resolver = ConfigBackendResolver::new(&store, &ProcessEnv);
                args.run(&mut ctx, &store, &resolver)?;
            }
            AuthCommands::RemoteToken(args) => {
                args.run(&mut ctx).await?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_USAGE;
    use gog_core::ConfigError;

    #[test]
    fn test_usage_error_exits_2() {
        let err = anyhow::Error::from(CommandError::usage("missing backend after \"set\""));
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
    }

    #[test]
    fn test_other_errors_exit_1() {
        let core = anyhow::Error::from(CommandError::from(ConfigError::ConfigDirUnavailable));
        assert_eq!(exit_code_for(&core), EXIT_FAILURE);

        let contextual: anyhow::Error = Err::<(), _>(ConfigError::ConfigDirUnavailable)
            .context("Failed to locate config file")
            .unwrap_err();
        assert_eq!(exit_code_for(&contextual), EXIT_FAILURE);
    }

    #[test]
    fn test_cli_rejects_json_with_plain() {
        let result = Cli::try_parse_from(["gog", "--json", "--plain", "auth", "keyring"]);
        assert!(result.is_err());
    }
}
