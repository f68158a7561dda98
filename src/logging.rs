//! Logging infrastructure.
//!
//! Structured logging via the `log` facade and `env_logger` backend.
//! The level comes from, in priority order:
//!
//! 1. The `RUST_LOG` environment variable, if set
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Default: info
//!
//! This module also owns the process-wide verbose flag consulted when a
//! rule's command runs (whether subprocess output is echoed) and when a
//! cache hit is logged.

use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use env_logger::Builder;
use log::LevelFilter;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set the process-wide verbose flag.
pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::SeqCst);
}

/// Whether verbose output was requested. When true, rule subprocesses
/// inherit stdout/stderr and cache hits emit a log line.
#[must_use]
pub fn verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Initialize the logging subsystem from CLI verbosity flags.
///
/// Call once at process start, before any logging. Also sets the
/// process-wide verbose flag.
///
/// # Panics
///
/// Panics if called more than once, as `env_logger` can only be
/// initialized once per process.
pub fn init_logging(verbose: u8, quiet: bool) {
    set_verbose(verbose > 0 && !quiet);

    let mut builder = Builder::new();
    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(|buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        writeln!(
            buf,
            "{level_style}{:<5}{level_style:#} {}",
            level,
            record.args()
        )
    });

    builder.init();
}

/// Map CLI flags to a log level. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
