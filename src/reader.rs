use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of command lines for the read loop.
pub trait LineReader {
    /// Shows `prompt` and waits for one line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Remembers `line` for later recall.
    fn record_history(&mut self, line: &str);
}

/// Interactive line editor with history, backed by `rustyline`.
///
/// When created with a history file, the file is loaded on startup and
/// written back when the editor is dropped.
pub struct Editor {
    rl: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl Editor {
    pub fn new(history_file: Option<PathBuf>) -> Result<Self> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = &history_file {
            if path.exists() {
                if let Err(e) = rl.load_history(path) {
                    warn!(path = %path.display(), error = %e, "could not load history");
                }
            }
        }
        Ok(Self { rl, history_file })
    }
}

impl LineReader for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.rl.readline(prompt) {
                Ok(line) => return Ok(Some(line)),
                // Ctrl-C abandons the current line only.
                Err(ReadlineError::Interrupted) => {
                    debug!("line interrupted");
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn record_history(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if let Err(e) = self.rl.add_history_entry(line) {
            warn!(error = %e, "could not record history entry");
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(e) = self.rl.save_history(path) {
                warn!(path = %path.display(), error = %e, "could not save history");
            }
        }
    }
}
