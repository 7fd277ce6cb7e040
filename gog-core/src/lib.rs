//! # gog core
//!
//! Core library behind the `gog` authentication commands.
//!
//! This crate provides:
//! - Keyring backend preference types and `env > config > default` resolution
//! - A JSON file-backed config store with atomic writes
//! - Bearer token types and a [`TokenSource`] trait
//! - A [`RemoteTokenSource`] that mints tokens from an HTTP endpoint
//!   (with the `remote-token` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gog_core::{BackendResolver, ConfigBackendResolver, FileConfigStore, ProcessEnv};
//!
//! let store = FileConfigStore::at_default_path()?;
//! let info = ConfigBackendResolver::new(&store, &ProcessEnv).resolve()?;
//! println!("keyring backend: {} (from {})", info.value, info.source);
//! ```

pub mod config;
pub mod error;
pub mod keyring_backend;
pub mod token;

#[cfg(feature = "remote-token")]
pub mod remote_token;

// Re-export commonly used types at crate root
pub use config::{
    Config,
    ConfigError,
    ConfigStore,
    FileConfigStore,
};

pub use keyring_backend::{
    BackendInfo,
    BackendResolver,
    BackendSource,
    ConfigBackendResolver,
    EnvSource,
    KEYRING_BACKEND_ENV,
    KeyringBackend,
    ParseBackendError,
    ProcessEnv,
    ResolveError,
};

pub use token::{
    Secret,
    Token,
    TokenSource,
};

pub use error::GogError;

#[cfg(feature = "remote-token")]
pub use remote_token::{
    DEFAULT_HTTP_TIMEOUT,
    RemoteTokenError,
    RemoteTokenSource,
};
