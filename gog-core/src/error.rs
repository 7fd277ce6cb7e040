//! Top-level error types for gog.

use thiserror::Error;

use crate::config::ConfigError;
use crate::keyring_backend::{ParseBackendError, ResolveError};

/// Top-level error type encompassing all gog core errors.
#[derive(Debug, Error)]
pub enum GogError {
    /// Error reading or writing the config file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error resolving the effective keyring backend.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An unknown keyring backend literal.
    #[error(transparent)]
    InvalidBackend(#[from] ParseBackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parse_error_keeps_message() {
        let err: GogError = "vault".parse::<crate::KeyringBackend>().unwrap_err().into();
        assert!(err.to_string().contains("\"vault\""));
    }

    #[test]
    fn test_config_error_is_verbatim() {
        let err: GogError = ConfigError::ConfigDirUnavailable.into();
        assert_eq!(err.to_string(), "configuration directory not available");
    }
}
