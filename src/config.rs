use std::env;
use std::path::PathBuf;

/// Name used in prompts and as the prefix of every diagnostic.
pub const SHELL_NAME: &str = "scs";

/// Appended to the working directory to form the prompt.
pub const PROMPT_SUFFIX: &str = "$ ";

/// Audit log location, relative to the directory the shell starts in.
pub const AUDIT_LOG_FILE: &str = ".scs_history";

/// Line editor history file, kept in the user's home directory.
pub const HISTORY_FILE: &str = ".scs_readline_history";

/// Startup settings of the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where one line per submitted command is appended.
    pub audit_log: PathBuf,
    /// Line editor history loaded on startup and saved on exit, if any.
    pub history_file: Option<PathBuf>,
}

impl Default for Config {
    /// `.scs_history` in the current directory and `~/.scs_readline_history`
    /// (no history file when `HOME` is unset).
    fn default() -> Self {
        Self {
            audit_log: PathBuf::from(AUDIT_LOG_FILE),
            history_file: env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE)),
        }
    }
}
