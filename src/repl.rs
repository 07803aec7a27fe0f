use crate::audit::{Actor, AuditLog};
use crate::command::Signal;
use crate::config::{PROMPT_SUFFIX, SHELL_NAME};
use crate::dispatcher::Dispatcher;
use crate::lexer;
use crate::reader::LineReader;
use anyhow::Result;
use std::env;
use tracing::{debug, warn};

/// Where the read loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Halted,
}

/// The read-execute loop: prompt, read, audit, tokenize, dispatch.
///
/// The loop owns its collaborators for its whole lifetime; the audit log is
/// closed exactly once, when [`Repl::run`] returns.
pub struct Repl<R: LineReader> {
    reader: R,
    dispatcher: Dispatcher,
    audit: AuditLog,
    actor: Actor,
    state: LoopState,
}

impl<R: LineReader> Repl<R> {
    pub fn new(reader: R, dispatcher: Dispatcher, audit: AuditLog, actor: Actor) -> Self {
        Self {
            reader,
            dispatcher,
            audit,
            actor,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs cycles until the loop halts, then releases the audit log.
    ///
    /// Returns an error only when the line reader fails for a reason other
    /// than end of input.
    pub fn run(&mut self) -> Result<()> {
        let outcome = loop {
            match self.step() {
                Ok(LoopState::Running) => continue,
                Ok(LoopState::Halted) => break Ok(()),
                Err(e) => {
                    self.state = LoopState::Halted;
                    break Err(e);
                }
            }
        };
        if let Err(e) = self.audit.close() {
            warn!(error = %e, "could not close audit log");
        }
        outcome
    }

    /// Performs one cycle and returns the resulting state.
    ///
    /// End of input counts as `exit`. A halted loop stays halted.
    pub fn step(&mut self) -> Result<LoopState> {
        if self.state == LoopState::Halted {
            return Ok(LoopState::Halted);
        }

        let Some(line) = self.reader.read_line(&prompt())? else {
            debug!("end of input");
            self.state = LoopState::Halted;
            return Ok(self.state);
        };

        self.reader.record_history(&line);
        if let Err(e) = self.audit.append(&self.actor, &line) {
            warn!(error = %e, "could not write audit entry");
        }

        let args = lexer::tokenize(&line);
        if self.dispatcher.dispatch(&args) == Signal::Terminate {
            self.state = LoopState::Halted;
        }
        Ok(self.state)
    }
}

/// `<working directory>$ `, or `scs$ ` when the directory cannot be read.
pub fn prompt() -> String {
    match env::current_dir() {
        Ok(cwd) => format!("{}{}", cwd.display(), PROMPT_SUFFIX),
        Err(_) => format!("{}{}", SHELL_NAME, PROMPT_SUFFIX),
    }
}
