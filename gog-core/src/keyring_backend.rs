//! Keyring backend preference and its resolution.
//!
//! This module defines:
//! - [`KeyringBackend`] - Where secrets are kept (`auto`, `keychain`, `file`)
//! - [`BackendSource`] - Where the effective choice came from
//! - [`BackendInfo`] - The effective backend plus its source
//! - [`EnvSource`] - Read-only view of environment variables
//! - [`BackendResolver`] - Trait for resolving the effective backend
//! - [`ConfigBackendResolver`] - Resolver applying `env > config > default`

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, ConfigStore};

/// Environment variable that overrides the persisted backend.
pub const KEYRING_BACKEND_ENV: &str = "GOG_KEYRING_BACKEND";

/// Error returned when a backend literal is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid keyring backend: {value:?} (expected auto, keychain, or file)")]
pub struct ParseBackendError {
    /// The rejected input, as given.
    pub value: String,
}

/// Destination for persisted secrets.
///
/// Parsing trims surrounding whitespace, ignores case and accepts `default`
/// as an alias for [`KeyringBackend::Auto`]. Display and serialization always
/// use the canonical lower-case literal.
///
/// # Examples
///
/// ```
/// use gog_core::KeyringBackend;
///
/// assert_eq!(" Default ".parse::<KeyringBackend>().unwrap(), KeyringBackend::Auto);
/// assert_eq!("FILE".parse::<KeyringBackend>().unwrap().as_str(), "file");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyringBackend {
    /// Pick the OS keychain when available, otherwise the encrypted file.
    #[default]
    Auto,
    /// OS keychain (Keychain, Secret Service, Credential Manager).
    Keychain,
    /// Encrypted on-disk file.
    File,
}

impl KeyringBackend {
    /// Canonical literal for this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Keychain => "keychain",
            Self::File => "file",
        }
    }
}

impl fmt::Display for KeyringBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyringBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "default" => Ok(Self::Auto),
            "keychain" => Ok(Self::Keychain),
            "file" => Ok(Self::File),
            _ => Err(ParseBackendError {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for KeyringBackend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeyringBackend {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where the effective backend choice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSource {
    /// The `GOG_KEYRING_BACKEND` environment variable.
    Env,
    /// The persisted config file.
    Config,
    /// Built-in default.
    Default,
}

impl BackendSource {
    /// Canonical tag for this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for BackendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently effective backend and where it came from.
///
/// `value` is the canonical literal for a recognised backend. An unknown
/// literal in `GOG_KEYRING_BACKEND` still takes precedence and is carried
/// verbatim (trimmed); [`BackendInfo::backend`] returns `None` for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Effective backend literal.
    pub value: String,

    /// Source of the effective value.
    pub source: BackendSource,
}

impl BackendInfo {
    fn known(backend: KeyringBackend, source: BackendSource) -> Self {
        Self {
            value: backend.as_str().to_string(),
            source,
        }
    }

    /// The effective backend, or `None` when the value is not a known literal.
    pub fn backend(&self) -> Option<KeyringBackend> {
        self.value.parse().ok()
    }
}

/// Error type for backend resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Reading the persisted config failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Read-only access to environment variables.
///
/// Lets callers resolve against a fixed map in tests instead of mutating the
/// process environment.
pub trait EnvSource: Send + Sync {
    /// Look up a variable. `None` when unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Look up a variable, treating empty or whitespace-only values as unset.
    /// The returned value is trimmed.
    fn non_empty_var(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolves the effective keyring backend.
pub trait BackendResolver {
    /// Determine the effective backend and its source.
    fn resolve(&self) -> Result<BackendInfo, ResolveError>;
}

/// Resolver that applies `env > config > default` precedence.
///
/// # Example
///
/// ```rust,ignore
/// use gog_core::{ConfigBackendResolver, BackendResolver, FileConfigStore, ProcessEnv};
///
/// let store = FileConfigStore::at_default_path()?;
/// let info = ConfigBackendResolver::new(&store, &ProcessEnv).resolve()?;
/// println!("{} ({})", info.value, info.source);
/// ```
pub struct ConfigBackendResolver<'a> {
    store: &'a dyn ConfigStore,
    env: &'a dyn EnvSource,
}

impl<'a> ConfigBackendResolver<'a> {
    /// Create a resolver reading from the given store and environment.
    pub fn new(store: &'a dyn ConfigStore, env: &'a dyn EnvSource) -> Self {
        Self { store, env }
    }
}

impl BackendResolver for ConfigBackendResolver<'_> {
    fn resolve(&self) -> Result<BackendInfo, ResolveError> {
        // A non-empty env value wins even when it is not a known literal.
        if let Some(raw) = self.env.non_empty_var(KEYRING_BACKEND_ENV) {
            debug!("Keyring backend {} taken from {}", raw, KEYRING_BACKEND_ENV);
            return Ok(match raw.parse::<KeyringBackend>() {
                Ok(backend) => BackendInfo::known(backend, BackendSource::Env),
                Err(_) => {
                    warn!("Unrecognised {} value {:?}", KEYRING_BACKEND_ENV, raw);
                    BackendInfo {
                        value: raw,
                        source: BackendSource::Env,
                    }
                }
            });
        }

        let config = self.store.read()?;
        if let Some(backend) = config.keyring_backend {
            debug!("Keyring backend {} taken from config", backend);
            return Ok(BackendInfo::known(backend, BackendSource::Config));
        }

        Ok(BackendInfo::known(
            KeyringBackend::default(),
            BackendSource::Default,
        ))
    }
}
