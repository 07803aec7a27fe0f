use crate::command::ExitCode;
use crate::config::SHELL_NAME;
use crate::error::ShellError;
use anyhow::{Result, anyhow};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::Signal as OsSignal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork, write};
use std::ffi::CString;
use tracing::{debug, info};

/// How an external command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The child called `exit` with this code.
    Exited(i32),
    /// The child was killed by a signal.
    Signaled(OsSignal),
}

impl Disposition {
    /// The status a POSIX shell would report in `$?`.
    pub fn code(self) -> ExitCode {
        match self {
            Disposition::Exited(code) => code,
            Disposition::Signaled(signal) => 128 + signal as i32,
        }
    }
}

/// Runs programs that are not builtins.
pub trait Launcher {
    /// Runs `args[0]` with `args` as its argument list and waits for it to finish.
    fn launch(&mut self, args: &[String]) -> Result<Disposition>;
}

/// Launches commands with `fork` + `execvp`, resolving names through `PATH`.
#[derive(Debug, Default)]
pub struct ForkLauncher;

impl Launcher for ForkLauncher {
    fn launch(&mut self, args: &[String]) -> Result<Disposition> {
        if args.is_empty() {
            return Err(anyhow!("nothing to launch"));
        }
        // Everything the child needs is allocated before forking.
        let argv = externalize(args)?;

        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, command = %args[0], "spawned child");
                wait_for(child)
            }
            Ok(ForkResult::Child) => exec_or_exit(&argv),
            Err(e) => Err(ShellError::os("fork", e).into()),
        }
    }
}

/// Converts the argument vector into C strings for `execvp`.
fn externalize(args: &[String]) -> Result<Vec<CString>> {
    args.iter()
        .map(|s| {
            CString::new(s.as_str()).map_err(|_| anyhow!("{}: argument contains a NUL byte", args[0]))
        })
        .collect()
}

/// Replaces the child image; on failure reports and exits with status 1.
///
/// Runs between `fork` and `exec`, so it only makes raw writes and never allocates.
fn exec_or_exit(argv: &[CString]) -> ! {
    let err = match execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    report_exec_failure(&argv[0], err);
    unsafe { libc::_exit(1) }
}

fn report_exec_failure(program: &CString, err: Errno) {
    let stderr = std::io::stderr();
    let _ = write(&stderr, SHELL_NAME.as_bytes());
    let _ = write(&stderr, b": ");
    let _ = write(&stderr, program.as_bytes());
    let _ = write(&stderr, b": ");
    let _ = write(&stderr, err.desc().as_bytes());
    let _ = write(&stderr, b"\n");
}

/// Blocks until `child` exits or is killed, reaping it.
///
/// Stop notifications are skipped and interrupted waits are retried.
fn wait_for(child: Pid) -> Result<Disposition> {
    loop {
        match waitpid(child, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(pid = %child, code, "child exited");
                return Ok(Disposition::Exited(code));
            }
            Ok(WaitStatus::Signaled(_, signal, core_dumped)) => {
                info!(pid = %child, ?signal, core_dumped, "child killed by signal");
                return Ok(Disposition::Signaled(signal));
            }
            Ok(status) => {
                debug!(pid = %child, ?status, "child changed state");
            }
            Err(Errno::EINTR) => {}
            Err(e) => return Err(ShellError::os(format!("waitpid {}", child), e).into()),
        }
    }
}
