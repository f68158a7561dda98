//! Cancellation tokens and Ctrl+C handling.
//!
//! Every potentially blocking operation in the crate takes a
//! [`CancelFlag`] and aborts promptly once it is set. The flag is an
//! `Arc<AtomicBool>` so it can be cloned into worker threads and checked
//! without locks. A canceled invocation never records anything in the
//! hash store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + signal number.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation token.
///
/// Clones observe the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// A fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observed by all clones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return [`Error::Canceled`] if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Install a Ctrl+C handler that sets `flag` and notes the interrupt on
/// stderr. Call at most once per process.
pub fn install_ctrlc(flag: &CancelFlag) -> std::result::Result<(), ctrlc::Error> {
    let flag = flag.clone();
    ctrlc::set_handler(move || {
        eprintln!("Interrupted. Finishing up...");
        flag.cancel();
    })
}
