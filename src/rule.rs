//! Build rules: what to build, from what, and how.
//!
//! A [`Rule`] is one buildable unit. It can report two digests of itself
//! and it can run its build action:
//!
//! * the identity hash binds only the declared structure (sources,
//!   targets, command) and never changes with file contents;
//! * the content hash additionally binds the current byte state of every
//!   declared source and target file, so it changes whenever anything
//!   the rule reads or writes has changed on disk.
//!
//! [`FileSetRule`] is the concrete implementation used by declarative
//! rule files and command helpers. Both hashes go through a canonical
//! JSON encoding (sorted object keys, strings only) so identical rule
//! state always produces identical bytes to digest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::hash::{self, Hash256};
use crate::logging;

/// How often a running command is polled for exit or cancellation.
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// One buildable unit.
///
/// Implementations are immutable once constructed and re-evaluated on
/// every invocation; nothing is cached in memory across invocations.
/// The `Display` impl provides a human-readable label for logging.
pub trait Rule: fmt::Display + Send + Sync {
    /// Digest of the declared structure only. Pure, no I/O, and
    /// invariant under permutation of the source and target lists.
    fn identity_hash(&self) -> Hash256;

    /// Digest binding the declared structure to the current bytes of
    /// every declared source and target file. A missing file folds in
    /// as a null marker; a file that exists but cannot be read is an
    /// error. Deterministic for identical filesystem state.
    fn content_hash(&self, cancel: &CancelFlag) -> Result<Hash256>;

    /// Execute the build action. On success the declared targets are
    /// expected to exist with fresh content; the rule itself does not
    /// verify that.
    fn run(&self, cancel: &CancelFlag) -> Result<()>;
}

/// A rule declared as source files, target files, and the command that
/// produces the latter from the former.
///
/// Paths are used exactly as declared, relative to the process working
/// directory; `dir` only affects where the command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSetRule {
    /// Files the command reads.
    pub sources: Vec<String>,
    /// Files the command writes.
    pub targets: Vec<String>,
    /// The command, first element being the executable.
    pub command: Vec<String>,
    /// Working directory for the command. Empty means the current
    /// process working directory.
    #[serde(default)]
    pub dir: PathBuf,
}

/// The shape canonically encoded for the identity hash. `dir` is
/// deliberately absent: where a command runs is not part of what it
/// builds.
#[derive(Debug, Serialize)]
struct IdentityRepr<'a> {
    command: &'a [String],
    sources: Vec<&'a str>,
    targets: Vec<&'a str>,
}

/// The shape canonically encoded for the content hash. Each declared
/// path maps to its file digest, or null when the file does not exist.
#[derive(Debug, Serialize)]
struct ContentRepr<'a> {
    command: &'a [String],
    sources: BTreeMap<&'a str, Option<Hash256>>,
    targets: BTreeMap<&'a str, Option<Hash256>>,
}

impl FileSetRule {
    /// Create a rule running in the current working directory.
    #[must_use]
    pub fn new(sources: Vec<String>, targets: Vec<String>, command: Vec<String>) -> Self {
        Self {
            sources,
            targets,
            command,
            dir: PathBuf::new(),
        }
    }

    /// Set the working directory the command runs in.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    fn identity_repr(&self) -> IdentityRepr<'_> {
        let mut sources: Vec<&str> = self.sources.iter().map(String::as_str).collect();
        let mut targets: Vec<&str> = self.targets.iter().map(String::as_str).collect();
        sources.sort_unstable();
        targets.sort_unstable();
        IdentityRepr {
            command: &self.command,
            sources,
            targets,
        }
    }

    fn hash_paths<'a>(
        &self,
        paths: &'a [String],
        cancel: &CancelFlag,
    ) -> Result<BTreeMap<&'a str, Option<Hash256>>> {
        let mut out = BTreeMap::new();
        for path in paths {
            let digest = hash::hash_file_if_exists(path.as_ref(), cancel)?;
            out.insert(path.as_str(), digest);
        }
        Ok(out)
    }
}

impl fmt::Display for FileSetRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSetRule[{}]", self.targets.join(" "))
    }
}

impl Rule for FileSetRule {
    fn identity_hash(&self) -> Hash256 {
        let repr = self.identity_repr();
        // Encoding lists of plain strings cannot fail; the fallback
        // keeps this method total without panicking.
        match serde_json::to_vec(&repr) {
            Ok(bytes) => Hash256::digest(&bytes),
            Err(_) => Hash256::digest(format!("{repr:?}").as_bytes()),
        }
    }

    fn content_hash(&self, cancel: &CancelFlag) -> Result<Hash256> {
        let repr = ContentRepr {
            command: &self.command,
            sources: self.hash_paths(&self.sources, cancel)?,
            targets: self.hash_paths(&self.targets, cancel)?,
        };
        let bytes = serde_json::to_vec(&repr).map_err(|source| Error::Serialize {
            what: "rule content state",
            source,
        })?;
        Ok(Hash256::digest(&bytes))
    }

    fn run(&self, cancel: &CancelFlag) -> Result<()> {
        cancel.check()?;
        let (program, args) = self.command.split_first().ok_or_else(|| Error::EmptyCommand {
            context: self.to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        if !self.dir.as_os_str().is_empty() {
            cmd.current_dir(&self.dir);
        }
        if logging::verbose() {
            log::info!("running {}: {}", self, self.command.join(" "));
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            rule: self.to_string(),
            source,
        })?;

        loop {
            if cancel.is_canceled() {
                // Best effort; the child may already have exited.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Canceled);
            }
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(Error::CommandFailed {
                        rule: self.to_string(),
                        status,
                    })
                }
                Ok(None) => thread::sleep(CHILD_POLL_INTERVAL),
                Err(source) => {
                    return Err(Error::Spawn {
                        rule: self.to_string(),
                        source,
                    })
                }
            }
        }
    }
}
