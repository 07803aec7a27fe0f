use crate::builtin::Registry;
use crate::command::{Context, ExitCode, Signal};
use crate::config::SHELL_NAME;
use crate::launcher::{ForkLauncher, Launcher};
use crate::script::{LuaEngine, ScriptEngine};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Decides how an argument vector runs: as a builtin or as an external program.
///
/// The dispatcher owns every collaborator a command may need (builtin table,
/// embedded interpreter, launcher, output and error streams). Each of them can
/// be swapped out, which is how the tests drive it without touching the
/// terminal or spawning processes.
///
/// Example
/// ```
/// use scs::{Dispatcher, Signal};
/// let mut sh = Dispatcher::default();
/// assert_eq!(sh.dispatch(&[]), Signal::Continue);
/// assert_eq!(sh.dispatch(&["exit".to_string()]), Signal::Terminate);
/// ```
pub struct Dispatcher {
    registry: Registry,
    names: Vec<&'static str>,
    scripts: Box<dyn ScriptEngine>,
    launcher: Box<dyn Launcher>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    last_status: ExitCode,
}

impl Dispatcher {
    /// Create a dispatcher writing to the process's standard streams.
    pub fn new(
        registry: Registry,
        scripts: Box<dyn ScriptEngine>,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        let names = registry.names();
        Self {
            registry,
            names,
            scripts,
            launcher,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            last_status: 0,
        }
    }

    /// Redirect builtin output and diagnostics.
    ///
    /// External programs keep inheriting the process's own descriptors.
    pub fn with_streams(mut self, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Run one argument vector and tell the caller whether to keep going.
    ///
    /// An empty vector is a no-op. A name found in the registry runs the builtin
    /// and returns its signal; anything else goes to the launcher and always
    /// returns [`Signal::Continue`], whatever the child's exit status. Failures
    /// are reported on the error stream and never end the shell.
    pub fn dispatch(&mut self, args: &[String]) -> Signal {
        let Some(name) = args.first() else {
            return Signal::Continue;
        };

        if let Some(op) = self.registry.lookup(name) {
            debug!(builtin = %name, "running builtin");
            let result = {
                let mut ctx = Context {
                    stdout: self.stdout.as_mut(),
                    scripts: self.scripts.as_mut(),
                    builtins: &self.names,
                };
                op(args, &mut ctx)
            };
            let _ = self.stdout.flush();
            return match result {
                Ok(signal) => {
                    self.last_status = 0;
                    signal
                }
                Err(err) => {
                    self.last_status = 1;
                    self.report(&err);
                    Signal::Continue
                }
            };
        }

        debug!(command = %name, "launching external command");
        let _ = self.stdout.flush();
        match self.launcher.launch(args) {
            Ok(disposition) => self.last_status = disposition.code(),
            Err(err) => {
                self.last_status = 1;
                self.report(&err);
            }
        }
        Signal::Continue
    }

    /// Status of the most recent command: 0 or 1 for builtins, the child's
    /// conventional exit code for external programs.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    fn report(&mut self, err: &anyhow::Error) {
        let written =
            writeln!(self.stderr, "{}: {:#}", SHELL_NAME, err).and_then(|_| self.stderr.flush());
        if let Err(e) = written {
            warn!(error = %e, "could not write to the error stream");
        }
    }
}

impl Default for Dispatcher {
    /// The shell's builtins, a Lua interpreter and the fork/exec launcher.
    fn default() -> Self {
        Self::new(
            Registry::default(),
            Box::new(LuaEngine::new()),
            Box::new(ForkLauncher),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use crate::launcher::Disposition;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::env as stdenv;
    use std::fs;
    use std::rc::Rc;

    struct RecordingLauncher {
        calls: Rc<RefCell<Vec<Vec<String>>>>,
        outcome: Option<Disposition>,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&mut self, args: &[String]) -> anyhow::Result<Disposition> {
            self.calls.borrow_mut().push(args.to_vec());
            self.outcome.ok_or_else(|| anyhow!("fork: EAGAIN"))
        }
    }

    #[derive(Default)]
    struct NullEngine;

    impl ScriptEngine for NullEngine {
        fn execute(&mut self, source: &str) -> Result<(), String> {
            if source.contains("error") {
                Err(format!("bad chunk: {}", source))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        calls: Rc<RefCell<Vec<Vec<String>>>>,
        stdout: MemWriter,
        stderr: MemWriter,
    }

    fn harness(outcome: Option<Disposition>) -> Harness {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let launcher = RecordingLauncher {
            calls: calls.clone(),
            outcome,
        };
        let stdout = MemWriter::new();
        let stderr = MemWriter::new();
        let dispatcher = Dispatcher::new(
            Registry::default(),
            Box::new(NullEngine),
            Box::new(launcher),
        )
        .with_streams(Box::new(stdout.clone()), Box::new(stderr.clone()));
        Harness {
            dispatcher,
            calls,
            stdout,
            stderr,
        }
    }

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_vector_is_noop() {
        let mut h = harness(Some(Disposition::Exited(0)));
        assert_eq!(h.dispatcher.dispatch(&[]), Signal::Continue);
        assert!(h.calls.borrow().is_empty());
        assert!(h.stdout.contents().is_empty());
        assert!(h.stderr.contents().is_empty());
    }

    #[test]
    fn test_builtins_never_reach_launcher() {
        let mut h = harness(Some(Disposition::Exited(0)));
        for name in ["help", "glob", "status", "~", "exit"] {
            h.dispatcher.dispatch(&argv(&[name]));
        }
        assert!(h.calls.borrow().is_empty());
    }

    #[test]
    fn test_exit_terminates() {
        let mut h = harness(None);
        assert_eq!(h.dispatcher.dispatch(&argv(&["exit"])), Signal::Terminate);
        assert_eq!(
            h.dispatcher.dispatch(&argv(&["exit", "1", "2"])),
            Signal::Terminate
        );
    }

    #[test]
    fn test_unknown_name_is_launched_verbatim() {
        let mut h = harness(Some(Disposition::Exited(3)));
        let args = argv(&["ls", "-la", "/tmp"]);
        assert_eq!(h.dispatcher.dispatch(&args), Signal::Continue);
        assert_eq!(*h.calls.borrow(), vec![args]);
        assert_eq!(h.dispatcher.last_status(), 3);
    }

    #[test]
    fn test_matching_is_exact_and_case_sensitive() {
        let mut h = harness(Some(Disposition::Exited(0)));
        h.dispatcher.dispatch(&argv(&["EXIT"]));
        h.dispatcher.dispatch(&argv(&["ex"]));
        h.dispatcher.dispatch(&argv(&["sh_stat", "x"]));
        let launched: Vec<String> = h.calls.borrow().iter().map(|c| c[0].clone()).collect();
        assert_eq!(launched, vec!["EXIT", "ex", "sh_stat"]);
    }

    #[test]
    fn test_launch_failure_is_reported_and_continues() {
        let mut h = harness(None);
        assert_eq!(
            h.dispatcher.dispatch(&argv(&["whatever"])),
            Signal::Continue
        );
        assert_eq!(h.stderr.contents(), "scs: fork: EAGAIN\n");
        assert_eq!(h.dispatcher.last_status(), 1);
    }

    #[test]
    fn test_usage_error_goes_to_error_stream() {
        let mut h = harness(None);
        assert_eq!(h.dispatcher.dispatch(&argv(&["glob"])), Signal::Continue);
        assert!(h.stdout.contents().is_empty());
        assert_eq!(h.stderr.contents(), "scs: glob: expected a pattern to expand\n");
        assert_eq!(h.dispatcher.last_status(), 1);
    }

    #[test]
    fn test_script_error_goes_to_error_stream() {
        let mut h = harness(None);
        assert_eq!(
            h.dispatcher.dispatch(&argv(&["~", "error('x')"])),
            Signal::Continue
        );
        assert_eq!(h.stderr.contents(), "scs: bad chunk: error('x')\n");

        h.dispatcher.dispatch(&argv(&["~", "x", "=", "1"]));
        assert_eq!(h.dispatcher.last_status(), 0);
    }

    #[test]
    fn test_help_output_goes_to_output_stream() {
        let mut h = harness(None);
        assert_eq!(h.dispatcher.dispatch(&argv(&["help"])), Signal::Continue);
        assert!(h.stdout.contents().contains("\nglob\n"));
        assert!(h.stderr.contents().is_empty());
    }

    #[test]
    fn test_cd_changes_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("dispatch_cd").unwrap();
        let canonical = fs::canonicalize(&temp).unwrap();

        let mut h = harness(None);
        let signal = h
            .dispatcher
            .dispatch(&argv(&["cd", canonical.to_str().unwrap()]));
        let now = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        stdenv::set_current_dir(&orig).unwrap();

        assert_eq!(signal, Signal::Continue);
        assert_eq!(now, canonical);
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn test_cd_to_missing_directory_reports() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut h = harness(None);
        let signal = h.dispatcher.dispatch(&argv(&["cd", "/no/such/dir/for/scs"]));

        assert_eq!(signal, Signal::Continue);
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        let err = h.stderr.contents();
        assert!(err.starts_with("scs: cd: /no/such/dir/for/scs: "), "{}", err);
    }

    #[test]
    fn test_glob_relative_pattern() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("dispatch_glob").unwrap();
        fs::write(temp.join("a.txt"), "").unwrap();
        fs::write(temp.join("b.txt"), "").unwrap();
        fs::write(temp.join("notes.md"), "").unwrap();

        let mut h = harness(None);
        stdenv::set_current_dir(&temp).unwrap();
        let matched = h.dispatcher.dispatch(&argv(&["glob", "*.txt"]));
        let matched_out = h.stdout.contents();
        let none = h.dispatcher.dispatch(&argv(&["glob", "*.csv"]));
        let total_out = h.stdout.contents();
        stdenv::set_current_dir(&orig).unwrap();

        assert_eq!(matched, Signal::Continue);
        assert_eq!(matched_out, "a.txt\nb.txt\n");
        assert_eq!(none, Signal::Continue);
        assert_eq!(total_out, matched_out);
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn test_dash_prefixed_operands_are_not_flags() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("dispatch_dash").unwrap();
        fs::write(temp.join("-a.txt"), "").unwrap();
        fs::write(temp.join("b"), "").unwrap();
        fs::create_dir(temp.join("-dir")).unwrap();
        fs::create_dir(temp.join("help")).unwrap();

        let mut h = harness(None);
        stdenv::set_current_dir(&temp).unwrap();
        h.dispatcher.dispatch(&argv(&["glob", "-*"]));
        let globbed = h.stdout.contents();
        h.dispatcher.dispatch(&argv(&["status", "-a.txt"]));
        let status_out = h.stdout.contents()[globbed.len()..].to_string();
        h.dispatcher.dispatch(&argv(&["cd", "-dir"]));
        let in_dash_dir = stdenv::current_dir().unwrap();
        h.dispatcher.dispatch(&argv(&["cd", ".."]));
        h.dispatcher.dispatch(&argv(&["cd", "help"]));
        let in_help_dir = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).unwrap();

        assert_eq!(globbed, "-a.txt\n-dir/\n");
        assert!(status_out.starts_with("dev id:"), "{}", status_out);
        assert!(in_dash_dir.ends_with("-dir"));
        assert!(in_help_dir.ends_with("help"));
        assert!(h.stderr.contents().is_empty(), "{}", h.stderr.contents());
        let _ = fs::remove_dir_all(temp);
    }

    #[test]
    fn test_lone_help_flag_still_prints_usage() {
        let mut h = harness(None);
        assert_eq!(h.dispatcher.dispatch(&argv(&["cd", "--help"])), Signal::Continue);
        assert!(h.stdout.contents().starts_with("Usage: cd"), "{}", h.stdout.contents());
        assert_eq!(h.dispatcher.last_status(), 0);

        h.dispatcher.dispatch(&argv(&["cd", "-x", "-y"]));
        assert!(h.stderr.contents().starts_with("scs: cd: "), "{}", h.stderr.contents());
        assert_eq!(h.dispatcher.last_status(), 1);
    }

    #[test]
    fn test_real_launcher_true_and_missing_program() {
        let stderr = MemWriter::new();
        let mut dispatcher = Dispatcher::new(
            Registry::default(),
            Box::new(NullEngine),
            Box::new(ForkLauncher),
        )
        .with_streams(Box::new(MemWriter::new()), Box::new(stderr.clone()));

        assert_eq!(dispatcher.dispatch(&argv(&["true"])), Signal::Continue);
        assert_eq!(dispatcher.last_status(), 0);

        assert_eq!(
            dispatcher.dispatch(&argv(&["nonexistent-cmd-xyz"])),
            Signal::Continue
        );
        assert_eq!(dispatcher.last_status(), 1);
    }
}
