//! scs, a small interactive command shell.
//!
//! A line is split into words on whitespace, the first word is looked up in a
//! fixed table of builtins (`cd`, `help`, `glob`, `status`, `~`, `exit`), and
//! anything else is started as an external program that the shell waits for.
//!
//! The main entry points are [`Dispatcher`], which runs one argument vector,
//! and [`Repl`], which drives the prompt/read/dispatch cycle on top of a
//! [`LineReader`]. Every collaborator (line reader, interpreter, launcher,
//! audit log, output streams) is owned explicitly and can be replaced.

pub mod audit;
pub mod builtin;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod glob;
pub mod io_adapters;
pub mod launcher;
pub mod lexer;
pub mod reader;
pub mod repl;
pub mod script;

#[cfg(test)]
pub(crate) mod test_support;

pub use audit::{Actor, AuditLog};
pub use builtin::Registry;
pub use command::{ExitCode, Signal};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::ShellError;
pub use launcher::{Disposition, ForkLauncher, Launcher};
pub use lexer::tokenize;
pub use reader::{Editor, LineReader};
pub use repl::{LoopState, Repl};
pub use script::{LuaEngine, ScriptEngine};
