use thiserror::Error;

/// Failures a command can report back to the shell.
///
/// None of them is fatal: the dispatcher writes them to the error stream and
/// the read loop keeps going.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A builtin was invoked with missing or malformed arguments.
    #[error("{command}: {message}")]
    Usage {
        command: &'static str,
        message: String,
    },

    /// An operating system call failed.
    #[error("{context}: {errno}")]
    Os { context: String, errno: nix::Error },

    /// The embedded interpreter rejected or failed to run a chunk.
    #[error("{0}")]
    Script(String),
}

impl ShellError {
    pub fn usage(command: &'static str, message: impl Into<String>) -> Self {
        ShellError::Usage {
            command,
            message: message.into(),
        }
    }

    pub fn os(context: impl Into<String>, errno: nix::Error) -> Self {
        ShellError::Os {
            context: context.into(),
            errno,
        }
    }
}
