//! Persistent user configuration.
//!
//! The config lives in a single JSON file in the platform configuration
//! directory (`~/.config/gogcli/config.json` on Linux, honouring
//! `XDG_CONFIG_HOME`). Only `keyring_backend` is interpreted here; every other
//! key is carried through untouched so read-modify-write cycles never drop
//! settings owned by other commands.
//!
//! # Example
//!
//! ```rust,ignore
//! use gog_core::{ConfigStore, FileConfigStore, KeyringBackend};
//!
//! let store = FileConfigStore::at_default_path()?;
//! let mut config = store.read()?;
//! config.keyring_backend = Some(KeyringBackend::File);
//! store.write(&config)?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::keyring_backend::KeyringBackend;

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "gogcli";

/// File name of the config file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Error type for config store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the config file failed.
    #[error("write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON or holds an illegal value.
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the config failed.
    #[error("encode config: {0}")]
    Encode(#[from] serde_json::Error),

    /// No home/config directory could be determined.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// The persisted user configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Preferred keyring backend; `None` when never set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring_backend: Option<KeyringBackend>,

    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reads and writes the persisted [`Config`].
///
/// Writes must be atomic: after `write` returns, readers observe either the
/// complete new config or, on error, the previous one.
pub trait ConfigStore: Send + Sync {
    /// Location of the backing config file.
    fn path(&self) -> &Path;

    /// Load the current config. A missing file yields [`Config::default`].
    fn read(&self) -> Result<Config, ConfigError>;

    /// Persist the config, replacing what was stored.
    fn write(&self, config: &Config) -> Result<(), ConfigError>;
}

/// JSON file-backed config store.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = directories::ProjectDirs::from("", "", APP_DIR_NAME)
            .ok_or(ConfigError::ConfigDirUnavailable)?;

        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Create a store at the default config file path.
    pub fn at_default_path() -> Result<Self, ConfigError> {
        Ok(Self::new(Self::default_path()?))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CONFIG_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, source: io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Config, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", self.path);
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
            }
        }

        let mut contents = serde_json::to_string_pretty(config)?;
        contents.push('\n');

        // Sibling temp file + rename: readers never see a partial file.
        let temp_path = self.temp_path();
        fs::write(&temp_path, contents).map_err(|e| self.write_err(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.write_err(e))?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.write_err(e));
        }

        debug!("Wrote config to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileConfigStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        (FileConfigStore::new(path), temp_dir)
    }

    #[test]
    fn test_read_missing_file_is_default() {
        let (store, _temp) = test_store();
        assert_eq!(store.read().unwrap(), Config::default());
    }

    #[test]
    fn test_write_creates_parent_and_round_trips() {
        let (store, _temp) = test_store();
        let config = Config {
            keyring_backend: Some(KeyringBackend::Keychain),
            ..Config::default()
        };

        store.write(&config).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.read().unwrap(), config);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_written_file_layout() {
        let (store, _temp) = test_store();
        let config = Config {
            keyring_backend: Some(KeyringBackend::File),
            ..Config::default()
        };
        store.write(&config).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains(r#""keyring_backend": "file""#), "{contents}");
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let (store, _temp) = test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{"default_account": "me@example.com", "keyring_backend": "auto"}"#,
        )
        .unwrap();

        let mut config = store.read().unwrap();
        assert_eq!(config.keyring_backend, Some(KeyringBackend::Auto));
        config.keyring_backend = Some(KeyringBackend::File);
        store.write(&config).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["default_account"], "me@example.com");
        assert_eq!(value["keyring_backend"], "file");
    }

    #[test]
    fn test_illegal_backend_is_parse_error() {
        let (store, _temp) = test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"keyring_backend": "vault"}"#).unwrap();

        assert!(matches!(store.read(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_empty_file_is_default() {
        let (store, _temp) = test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "  \n").unwrap();

        assert_eq!(store.read().unwrap(), Config::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = test_store();
        store.write(&Config::default()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
