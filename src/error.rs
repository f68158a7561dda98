//! Library error types.
//!
//! Every failure carries the context needed to point at the offending
//! file, rule, or phase. Nothing here is retried; retry policy, if any,
//! belongs to the caller.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hashing, storing, or running rules.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared file exists but could not be opened or read.
    ///
    /// "File does not exist" is never reported through this variant
    /// during content hashing; a missing file folds into the content
    /// hash as a null marker instead.
    #[error("reading {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Canonical encoding of rule state failed before hashing.
    #[error("encoding {what}: {source}")]
    Serialize {
        /// What was being encoded.
        what: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The persistent hash store malfunctioned.
    #[error("hash store: {source}")]
    Storage {
        /// The underlying storage error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A rule's command could not be started.
    #[error("starting command for {rule}: {source}")]
    Spawn {
        /// Description of the rule whose command failed.
        rule: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// A rule's command ran but exited abnormally.
    #[error("command for {rule} failed: {status}")]
    CommandFailed {
        /// Description of the rule whose command failed.
        rule: String,
        /// The exit status of the subprocess.
        status: ExitStatus,
    },

    /// A rule declared no command tokens at all.
    #[error("empty command in rule {context}")]
    EmptyCommand {
        /// Where the offending rule came from.
        context: String,
    },

    /// A `.hashmake.json` file could not be decoded.
    #[error("parsing {}: {source}", path.display())]
    Parse {
        /// The rule file that failed to parse.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Directory traversal failed during rule discovery.
    #[error("walking {}: {source}", path.display())]
    Walk {
        /// The directory entry that failed.
        path: PathBuf,
        /// The underlying walkdir error.
        source: walkdir::Error,
    },

    /// The operation was canceled before it completed.
    #[error("operation canceled")]
    Canceled,
}

impl Error {
    /// Build a [`Error::Storage`] from a plain message.
    pub(crate) fn storage(msg: impl Into<String>) -> Self {
        Error::Storage {
            source: msg.into().into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage {
            source: Box::new(e),
        }
    }
}
