//! Command errors and their process exit codes.

use std::io;

use gog_core::{ConfigError, GogError, RemoteTokenError, ResolveError};
use thiserror::Error;

/// Exit code for invalid invocations.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Error returned by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad argument shape or value.
    #[error("{message}")]
    Usage { message: String },

    /// Error from the core library, surfaced verbatim.
    #[error(transparent)]
    Core(#[from] GogError),

    /// Error fetching a remote token.
    #[error(transparent)]
    RemoteToken(#[from] RemoteTokenError),

    /// Writing to stdout/stderr failed.
    #[error("write output: {0}")]
    Output(#[from] io::Error),

    /// Encoding JSON output failed.
    #[error("encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CommandError {
    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage { .. } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::Core(e.into())
    }
}

impl From<ResolveError> for CommandError {
    fn from(e: ResolveError) -> Self {
        Self::Core(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CommandError::usage("bad").exit_code(), EXIT_USAGE);

        let core: CommandError = ConfigError::ConfigDirUnavailable.into();
        assert_eq!(core.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_core_errors_are_verbatim() {
        let err: CommandError = RemoteTokenError::EmptyAccessToken.into();
        assert_eq!(err.to_string(), "remote token: endpoint returned empty access token");
    }
}
