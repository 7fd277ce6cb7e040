//! Ambient state handed to every command: output mode, UI sinks and the
//! environment.

use std::io::{self, Write};

use gog_core::{EnvSource, ProcessEnv};
use serde::Serialize;

use crate::error::CommandError;

/// A boxed output stream.
pub type Sink = Box<dyn Write + Send>;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-oriented text, with hints and notes on stderr.
    #[default]
    Text,
    /// A single JSON object on stdout.
    Json,
    /// Stable tab-separated text without decorations.
    Plain,
}

impl OutputMode {
    /// Pick a mode from the global `--json`/`--plain` flags.
    pub fn from_flags(json: bool, plain: bool) -> Self {
        if json {
            Self::Json
        } else if plain {
            Self::Plain
        } else {
            Self::Text
        }
    }

    /// Whether output is a single JSON document on stdout.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    /// Whether hints and notes are suppressed for stable parsing.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }
}

/// Text output sinks.
pub struct Ui {
    out: Sink,
    err: Sink,
}

impl Ui {
    /// UI writing to the given sinks.
    pub fn new(out: Sink, err: Sink) -> Self {
        Self { out, err }
    }

    /// UI bound to the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Sink for primary text output.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    /// Sink for hints, notes and warnings.
    pub fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }
}

/// Per-invocation context.
///
/// `ui` is optional: without it text output is dropped but commands still
/// run to completion. JSON output always goes to `stdout`.
pub struct CommandContext {
    pub mode: OutputMode,
    pub ui: Option<Ui>,
    pub stdout: Sink,
    pub env: Box<dyn EnvSource>,
}

impl CommandContext {
    /// Context for a real process: stdio sinks and the process environment.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            ui: Some(Ui::stdio()),
            stdout: Box::new(io::stdout()),
            env: Box::new(ProcessEnv),
        }
    }

    /// Write `value` as one indented JSON object followed by a newline.
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> Result<(), CommandError> {
        serde_json::to_writer_pretty(&mut self.stdout, value)?;
        writeln!(self.stdout)?;
        self.stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// In-memory sink whose contents can be read back after the command ran.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Captured stdout, UI out and UI err for one test invocation.
    pub struct Captured {
        pub stdout: SharedBuffer,
        pub out: SharedBuffer,
        pub err: SharedBuffer,
    }

    pub fn capture_context(mode: OutputMode, env: &[(&str, &str)]) -> (CommandContext, Captured) {
        let captured = Captured {
            stdout: SharedBuffer::default(),
            out: SharedBuffer::default(),
            err: SharedBuffer::default(),
        };
        let env: std::collections::HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let ctx = CommandContext {
            mode,
            ui: Some(Ui::new(
                Box::new(captured.out.clone()),
                Box::new(captured.err.clone()),
            )),
            stdout: Box::new(captured.stdout.clone()),
            env: Box::new(env),
        };

        (ctx, captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Text);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(false, true), OutputMode::Plain);
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Text.is_plain());
    }

    #[test]
    fn test_write_json_appends_newline() {
        let (mut ctx, captured) = testing::capture_context(OutputMode::Json, &[]);
        ctx.write_json(&serde_json::json!({"written": true})).unwrap();

        let stdout = captured.stdout.contents();
        assert!(stdout.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(value["written"], true);
    }
}
