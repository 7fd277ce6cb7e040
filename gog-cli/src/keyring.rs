//! `gog auth keyring`: inspect or change the keyring backend preference.
//!
//! ```bash
//! gog auth keyring                 # show path, effective backend and its source
//! gog auth keyring file            # persist a backend
//! gog auth keyring set keychain    # older spelling of the above
//! ```

use std::io::Write;

use clap::Args;
use gog_core::{BackendResolver, BackendSource, ConfigStore, KEYRING_BACKEND_ENV, KeyringBackend};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::CommandContext;
use crate::error::CommandError;

/// Arguments for `gog auth keyring`.
#[derive(Debug, Clone, Default, Args)]
pub struct KeyringArgs {
    /// Keyring backend: auto|keychain|file
    pub backend: Option<String>,

    /// (compat) Use: gog auth keyring set <backend>
    #[arg(hide = true)]
    pub backend2: Option<String>,
}

/// What an invocation asks for, after argument validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyringAction {
    Inspect,
    Set(KeyringBackend),
}

#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    keyring_backend: &'a str,
    source: BackendSource,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct SetOutput<'a> {
    written: bool,
    path: &'a str,
    keyring_backend: KeyringBackend,
}

impl KeyringArgs {
    fn action(&self) -> Result<KeyringAction, CommandError> {
        let raw = self.backend.as_deref().unwrap_or_default();
        let raw2 = self.backend2.as_deref().unwrap_or_default();
        let first = raw.trim().to_lowercase();
        let second_given = !raw2.trim().is_empty();

        let raw_backend = if first == "set" {
            if !second_given {
                return Err(CommandError::usage("missing backend after \"set\""));
            }
            raw2
        } else if second_given {
            return Err(CommandError::usage(format!(
                "too many args: {:?} {:?}",
                raw, raw2
            )));
        } else if first.is_empty() {
            return Ok(KeyringAction::Inspect);
        } else {
            raw
        };

        raw_backend
            .parse::<KeyringBackend>()
            .map(KeyringAction::Set)
            .map_err(|_| {
                CommandError::usage(format!(
                    "invalid backend: {:?} (expected auto, keychain, or file)",
                    raw_backend
                ))
            })
    }

    /// Run the command.
    ///
    /// Arguments are validated before the config is touched, so a rejected
    /// invocation never modifies it.
    pub fn run(
        &self,
        ctx: &mut CommandContext,
        store: &dyn ConfigStore,
        resolver: &dyn BackendResolver,
    ) -> Result<(), CommandError> {
        match self.action()? {
            KeyringAction::Inspect => inspect(ctx, store, resolver),
            KeyringAction::Set(backend) => set(ctx, store, backend),
        }
    }
}

fn inspect(
    ctx: &mut CommandContext,
    store: &dyn ConfigStore,
    resolver: &dyn BackendResolver,
) -> Result<(), CommandError> {
    let path = store.path().display().to_string();
    let info = resolver.resolve()?;
    debug!("Effective keyring backend {} from {}", info.value, info.source);

    if ctx.mode.is_json() {
        return ctx.write_json(&InspectOutput {
            keyring_backend: &info.value,
            source: info.source,
            path: &path,
        });
    }

    let Some(ui) = ctx.ui.as_mut() else {
        return Ok(());
    };
    writeln!(ui.out(), "path\t{}", path)?;
    writeln!(ui.out(), "keyring_backend\t{}", info.value)?;
    writeln!(ui.out(), "source\t{}", info.source)?;
    writeln!(ui.err(), "Hint: gog auth keyring <auto|keychain|file>")?;
    Ok(())
}

fn set(
    ctx: &mut CommandContext,
    store: &dyn ConfigStore,
    backend: KeyringBackend,
) -> Result<(), CommandError> {
    let mut config = store.read()?;
    config.keyring_backend = Some(backend);
    store.write(&config)?;

    let path = store.path().display().to_string();
    info!("Keyring backend set to {} in {}", backend, path);

    // The env var still wins at resolution time.
    if !ctx.mode.is_json() && !ctx.mode.is_plain() {
        if let Some(value) = ctx.env.non_empty_var(KEYRING_BACKEND_ENV) {
            if let Some(ui) = ctx.ui.as_mut() {
                writeln!(
                    ui.err(),
                    "NOTE: {}={} overrides config.json",
                    KEYRING_BACKEND_ENV,
                    value
                )?;
            }
        }
    }

    if ctx.mode.is_json() {
        return ctx.write_json(&SetOutput {
            written: true,
            path: &path,
            keyring_backend: backend,
        });
    }

    let Some(ui) = ctx.ui.as_mut() else {
        return Ok(());
    };
    writeln!(ui.out(), "written\ttrue")?;
    writeln!(ui.out(), "path\t{}", path)?;
    writeln!(ui.out(), "keyring_backend\t{}", backend)?;
    Ok(())
}
