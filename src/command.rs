use crate::script::ScriptEngine;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Tells the read loop whether to keep prompting after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Terminate,
}

/// Everything a builtin may touch while it runs.
///
/// The dispatcher lends out its output stream and interpreter for the duration
/// of one command. Failures are returned, and the dispatcher reports them.
pub struct Context<'a> {
    /// Regular output of the command.
    pub stdout: &'a mut dyn Write,
    /// Embedded interpreter used by the scripting builtin.
    pub scripts: &'a mut dyn ScriptEngine,
    /// Names of all registered builtins, in registration order.
    pub builtins: &'a [&'static str],
}

/// A builtin operation as stored in the registry.
///
/// Receives the full argument vector (the command name included) and returns
/// the continuation signal for the read loop.
pub type BuiltinFn = fn(&[String], &mut Context<'_>) -> Result<Signal>;
