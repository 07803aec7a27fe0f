use crate::command::{BuiltinFn, Context, Signal};
use crate::error::ShellError;
use crate::glob;
use anyhow::{Context as _, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::iter;
use std::os::unix::ffi::OsStrExt;

/// Version shown by `help`.
const VERSION: &str = "1.0";

/// Built-in commands known to the shell at compile time.
///
/// Most builtins are parsed using the [`argh`] crate (`FromArgs`) and all of
/// them run in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd" or "glob".
    fn name() -> &'static str;

    /// Builds the command from its arguments (the command name excluded).
    fn parse(args: &[&str]) -> Result<Self, EarlyExit>;

    /// Executes the command with the streams and interpreter lent by the dispatcher.
    fn execute(self, ctx: &mut Context<'_>) -> Result<Signal>;
}

/// Parses the argument vector for `T` and runs it.
///
/// `--help` output goes to the output stream, argument errors come back as
/// [`ShellError::Usage`].
fn run<T: BuiltinCommand>(argv: &[String], ctx: &mut Context<'_>) -> Result<Signal> {
    let args: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();
    match T::parse(&args) {
        Ok(cmd) => cmd.execute(ctx),
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => {
            ctx.stdout.write_all(output.as_bytes())?;
            Ok(Signal::Continue)
        }
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => Err(ShellError::usage(T::name(), output.trim_end()).into()),
    }
}

/// Parses `args` as operands of `T`, never as flags.
///
/// A lone `--help` still prints the usage text. Anything else is passed after
/// a `--` separator, so `cd -dir`, `glob -*` or `cd help` reach the command.
fn parse_operands<T: FromArgs>(name: &str, args: &[&str]) -> Result<T, EarlyExit> {
    if matches!(args, ["--help"]) {
        return T::from_args(&[name], args);
    }
    let operands: Vec<&str> = iter::once("--").chain(args.iter().copied()).collect();
    T::from_args(&[name], &operands)
}

/// Ordered table of builtin operations, keyed by command name.
///
/// Lookup is an exact, case-sensitive match. Names are kept in registration
/// order, which is also the order `help` lists them in.
#[derive(Clone)]
pub struct Registry {
    entries: Vec<(&'static str, BuiltinFn)>,
}

impl Registry {
    /// Creates a registry with no builtins at all.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds `op` under `name`, replacing any builtin already registered with that name.
    pub fn with(mut self, name: &'static str, op: BuiltinFn) -> Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = op,
            None => self.entries.push((name, op)),
        }
        self
    }

    fn register<T: BuiltinCommand>(self) -> Self {
        self.with(T::name(), run::<T>)
    }

    pub fn lookup(&self, name: &str) -> Option<BuiltinFn> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }
}

impl Default for Registry {
    /// The shell's builtins: `cd`, `help`, `glob`, `status`, `~` and `exit`.
    fn default() -> Self {
        Self::empty()
            .register::<Cd>()
            .register::<Help>()
            .register::<Glob>()
            .register::<Status>()
            .register::<Script>()
            .register::<Exit>()
    }
}

#[derive(FromArgs)]
/// Change the current working directory of the shell process.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory
    pub path: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        parse_operands(Self::name(), args)
    }

    fn execute(self, _ctx: &mut Context<'_>) -> Result<Signal> {
        let path = self
            .path
            .ok_or_else(|| ShellError::usage("cd", "expected a directory argument"))?;
        env::set_current_dir(&path).with_context(|| format!("cd: {}", path))?;
        Ok(Signal::Continue)
    }
}

#[derive(FromArgs)]
/// Show the shell banner and the list of builtins.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::name()], args)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<Signal> {
        writeln!(ctx.stdout, "scs v{}:", VERSION)?;
        writeln!(ctx.stdout, "----- simple command shell -----")?;
        writeln!(ctx.stdout)?;
        for name in ctx.builtins {
            writeln!(ctx.stdout, "{}", name)?;
        }
        writeln!(ctx.stdout)?;
        writeln!(ctx.stdout, "Anything else is run as an external program.")?;
        writeln!(ctx.stdout, "Try `<builtin> --help` for usage.")?;
        Ok(Signal::Continue)
    }
}

#[derive(FromArgs)]
/// Print every path matching a wildcard pattern, directories with a trailing slash.
pub struct Glob {
    #[argh(positional)]
    /// pattern using `*`, `?` and `[...]`
    pub pattern: Option<String>,
}

impl BuiltinCommand for Glob {
    fn name() -> &'static str {
        "glob"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        parse_operands(Self::name(), args)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<Signal> {
        let pattern = self
            .pattern
            .ok_or_else(|| ShellError::usage("glob", "expected a pattern to expand"))?;
        for path in glob::expand(&pattern).context("glob")? {
            ctx.stdout.write_all(path.as_bytes())?;
            ctx.stdout.write_all(b"\n")?;
        }
        Ok(Signal::Continue)
    }
}

#[derive(FromArgs)]
/// Print device id, inode number, mode and hard link count of a file.
pub struct Status {
    #[argh(positional)]
    /// file to inspect
    pub path: Option<String>,
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        parse_operands(Self::name(), args)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<Signal> {
        let path = self
            .path
            .ok_or_else(|| ShellError::usage("status", "expected a path argument"))?;
        let st = nix::sys::stat::stat(path.as_str())
            .map_err(|e| ShellError::os(format!("status: {}", path), e))?;

        writeln!(ctx.stdout, "dev id:{}\tinode:{}", st.st_dev, st.st_ino)?;
        writeln!(ctx.stdout, "mode:{}\t# of hard links: {}", st.st_mode, st.st_nlink)?;
        Ok(Signal::Continue)
    }
}

/// Run the remaining words as a chunk of the embedded interpreter.
///
/// Words are joined with single spaces and never parsed as flags, so
/// `~ print(-1)` reaches the interpreter untouched.
pub struct Script {
    pub source: Option<String>,
}

impl BuiltinCommand for Script {
    fn name() -> &'static str {
        "~"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        let source = if args.is_empty() {
            None
        } else {
            Some(args.join(" "))
        };
        Ok(Script { source })
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<Signal> {
        let source = self
            .source
            .ok_or_else(|| ShellError::usage("~", "expected at least one argument"))?;
        ctx.scripts.execute(&source).map_err(ShellError::Script)?;
        Ok(Signal::Continue)
    }
}

/// Leave the shell. Any arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn parse(_args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit)
    }

    fn execute(self, _ctx: &mut Context<'_>) -> Result<Signal> {
        Ok(Signal::Terminate)
    }
}
