//! The skip/run/record decision procedure.
//!
//! A [`SkipEngine`] binds one [`Rule`] to one [`HashStore`] and, per
//! invocation, walks a small state machine:
//!
//! ```text
//! Checking -> Satisfied                 (content hash already stored)
//! Checking -> Rebuilding -> Recorded    (run, then store the new hash)
//! any      -> Failed                    (error propagated to caller)
//! ```
//!
//! Nothing is ever recorded for a failed or canceled build, so the
//! store can never claim a broken output is up to date. The engine
//! holds no state between invocations.

use std::sync::Arc;

use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::hash::Hash256;
use crate::logging;
use crate::rule::Rule;
use crate::store::HashStore;

/// How an invocation ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The content hash was already in the store; the build was skipped.
    Satisfied,
    /// The build ran and its post-build content hash was recorded.
    Rebuilt,
}

/// Binds one rule to one hash store and decides whether to run it.
pub struct SkipEngine<R> {
    rule: R,
    store: Arc<dyn HashStore>,
}

impl<R: Rule> SkipEngine<R> {
    /// Create an engine for `rule` backed by `store`. The store is
    /// shared: many engines typically point at the same one.
    pub fn new(rule: R, store: Arc<dyn HashStore>) -> Self {
        Self { rule, store }
    }

    /// The rule this engine decides for.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// A stable identifier for deduplicating repeated invocations of
    /// structurally identical rules under the same logical task name.
    /// Derived from `name` plus the rule's identity hash; file contents
    /// never affect it.
    #[must_use]
    pub fn task_id(&self, name: &str) -> String {
        #[derive(Serialize)]
        struct IdRepr<'a> {
            name: &'a str,
            rule_hash: Hash256,
        }
        let repr = IdRepr {
            name,
            rule_hash: self.rule.identity_hash(),
        };
        match serde_json::to_vec(&repr) {
            Ok(bytes) => Hash256::digest(&bytes).to_hex(),
            Err(_) => Hash256::digest(name.as_bytes()).to_hex(),
        }
    }

    /// Run the decision procedure once.
    ///
    /// Computes the rule's current content hash, consults the store,
    /// and either skips or runs the rule and records the post-build
    /// hash. Any error, including cancellation, strictly prevents the
    /// recording step.
    pub fn invoke(&self, cancel: &CancelFlag) -> Result<Outcome> {
        let before = self.rule.content_hash(cancel)?;
        if self.store.has(cancel, &before)? {
            if logging::verbose() {
                log::info!("{} up to date", self.rule);
            }
            return Ok(Outcome::Satisfied);
        }

        log::debug!("{} out of date, rebuilding", self.rule);
        self.rule.run(cancel)?;

        cancel.check()?;
        let after = self.rule.content_hash(cancel)?;
        self.store.add(cancel, &after)?;
        log::debug!("{} recorded {}", self.rule, after);
        Ok(Outcome::Rebuilt)
    }
}
