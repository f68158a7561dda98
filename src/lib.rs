//! Hashmake - content-hash based incremental build skipper.
//!
//! Given a declarative build step (source files, target files, and the
//! command that produces the latter from the former), hashmake decides
//! whether the step's outputs are already correct and, if not, runs the
//! step and records the result. The decision is based on SHA-256 hashes
//! of the actual bytes of every declared file plus the command text,
//! never on modification times, so it is immune to clock skew and to
//! touching a file without changing it.
//!
//! The core pieces:
//!
//! * [`rule::Rule`] / [`rule::FileSetRule`]: one buildable unit and its
//!   identity and content hashes;
//! * [`store::HashStore`] / [`store::SqliteStore`]: the persistent set
//!   of previously-seen content hashes, with optional time-based
//!   eviction;
//! * [`engine::SkipEngine`]: the skip/run/record decision procedure.
//!
//! Host build tools embed the library; the `hashmake` binary wraps it
//! with rule-file discovery for standalone use.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod logging;
pub mod proto;
pub mod rule;
pub mod store;

pub use cancel::CancelFlag;
pub use engine::{Outcome, SkipEngine};
pub use error::{Error, Result};
pub use hash::Hash256;
pub use rule::{FileSetRule, Rule};
pub use store::{HashStore, SqliteStore};

use std::sync::Arc;

use cli::{Cli, Commands, ListArgs, RunArgs};

/// Process exit code for full success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code when at least one rule failed.
pub const EXIT_FAILURE: i32 = 1;

/// Run the CLI. Returns the process exit code.
///
/// Rule failures are reported and counted rather than aborting the
/// whole run: rules are independent, so one failing step should not
/// block the others. Cancellation stops the run at the next rule
/// boundary.
pub fn run_app(cli: Cli, cancel: &CancelFlag) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Run(args) => run_rules(&args, cancel),
        Commands::List(args) => list_rules(&args),
    }
}

fn run_rules(args: &RunArgs, cancel: &CancelFlag) -> anyhow::Result<i32> {
    let rules = config::load_tree(&args.path)?;
    if rules.is_empty() {
        log::warn!("no rules found under {}", args.path.display());
        return Ok(EXIT_SUCCESS);
    }
    log::debug!("discovered {} rule(s)", rules.len());

    let mut store = SqliteStore::open(&args.db)?;
    if let Some(keep) = args.keep {
        store = store.with_retention(keep);
    }
    let store: Arc<dyn HashStore> = Arc::new(store);

    let mut failed = 0usize;
    for rule in rules {
        if cancel.is_canceled() {
            return Ok(cancel::EXIT_CODE_INTERRUPTED);
        }
        let engine = SkipEngine::new(rule, store.clone());
        match engine.invoke(cancel) {
            Ok(Outcome::Satisfied) => log::debug!("{} satisfied", engine.rule()),
            Ok(Outcome::Rebuilt) => log::info!("{} rebuilt", engine.rule()),
            Err(Error::Canceled) => return Ok(cancel::EXIT_CODE_INTERRUPTED),
            Err(e) => {
                log::error!("{}: {e}", engine.rule());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        log::error!("{failed} rule(s) failed");
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn list_rules(args: &ListArgs) -> anyhow::Result<i32> {
    let rules = config::load_tree(&args.path)?;
    for rule in &rules {
        println!(
            "{}  {}  [{}]",
            rule.identity_hash(),
            rule,
            rule.command.join(" ")
        );
    }
    log::debug!("{} rule(s) under {}", rules.len(), args.path.display());
    Ok(EXIT_SUCCESS)
}
