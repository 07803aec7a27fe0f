//! Append-only record of every line submitted to the shell.

use nix::unistd::{Uid, User, geteuid};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// The user a log entry is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: u32,
    pub name: String,
}

impl Actor {
    /// The effective user of this process.
    ///
    /// Falls back to the numeric uid as name when the password database has
    /// no entry for it.
    pub fn current() -> Self {
        Self::from_uid(geteuid())
    }

    fn from_uid(uid: Uid) -> Self {
        let name = match User::from_uid(uid) {
            Ok(Some(user)) => user.name,
            Ok(None) => uid.to_string(),
            Err(e) => {
                warn!(%uid, error = %e, "could not look up user name");
                uid.to_string()
            }
        };
        Self {
            uid: uid.as_raw(),
            name,
        }
    }
}

/// Append-mode log file, one line per entry.
///
/// A log that could not be opened (or whose writes fail) degrades to a no-op:
/// auditing never stops the shell.
pub struct AuditLog {
    file: Option<File>,
}

impl AuditLog {
    /// Opens (creating if needed) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "audit log disabled");
                None
            }
        };
        Self { file }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Writes `UID:<uid> Username:<name> Entry:<entry>` as one line.
    pub fn append(&mut self, actor: &Actor, entry: &str) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let line = format!("UID:{} Username:{} Entry:{}\n", actor.uid, actor.name, entry);
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Flushes and releases the file handle. Later appends are ignored.
    pub fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}
