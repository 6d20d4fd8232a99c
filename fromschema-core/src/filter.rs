//! Generate-then-check stage for constraints the compiler cannot build into
//! a strategy's structure.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use proptest::strategy::{NewTree, Strategy, ValueTree};
use proptest::test_runner::{Reason, TestRunner};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::compiler::ValueStrategy;
use crate::error::HEALTH_PREFIX;

/// Attempt and rejection counters of one residual filter.
#[derive(Debug)]
pub(crate) struct FilterStats {
    label: String,
    attempts: AtomicU64,
    rejections: AtomicU64,
}

impl FilterStats {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attempts: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
        }
    }

    fn record(&self, accepted: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if !accepted {
            self.rejections.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn report(&self) -> FilterReport {
        FilterReport {
            label: self.label.clone(),
            attempts: self.attempts.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of how often a residual filter rejected candidate values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub label: String,
    pub attempts: u64,
    pub rejections: u64,
}

impl FilterReport {
    /// Fraction of candidates rejected, or 0 before the first attempt.
    pub fn rejection_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.rejections as f64 / self.attempts as f64
        }
    }
}

pub(crate) type Check = Arc<dyn Fn(&JsonValue) -> bool>;

/// Draws from `source` until `check` accepts, giving up after `budget` draws.
pub(crate) struct ResidualFilter {
    source: ValueStrategy,
    check: Check,
    budget: u32,
    stats: Arc<FilterStats>,
}

impl ResidualFilter {
    pub(crate) fn new(
        source: ValueStrategy,
        check: Check,
        budget: u32,
        stats: Arc<FilterStats>,
    ) -> Self {
        Self {
            source,
            check,
            budget,
            stats,
        }
    }
}

impl fmt::Debug for ResidualFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResidualFilter")
            .field("label", &self.stats.label)
            .field("budget", &self.budget)
            .finish()
    }
}

impl Strategy for ResidualFilter {
    type Tree = ResidualFilterTree;
    type Value = JsonValue;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        for _ in 0..self.budget {
            let tree = self.source.new_tree(runner)?;
            let candidate = tree.current();
            let accepted = (self.check)(&candidate);
            self.stats.record(accepted);
            if accepted {
                return Ok(ResidualFilterTree {
                    source: tree,
                    check: self.check.clone(),
                    current: candidate,
                });
            }
        }
        let report = self.stats.report();
        log::debug!(
            "residual filter '{}' gave up after {} draws ({} of {} candidates rejected so far)",
            report.label,
            self.budget,
            report.rejections,
            report.attempts
        );
        Err(Reason::from(format!(
            "{HEALTH_PREFIX}: too many rejections by residual filter '{}'",
            report.label
        )))
    }
}

/// Shrinks the source tree, skipping over states the check rejects.
pub(crate) struct ResidualFilterTree {
    source: Box<dyn ValueTree<Value = JsonValue>>,
    check: Check,
    current: JsonValue,
}

impl ResidualFilterTree {
    fn accept_current(&mut self) -> bool {
        let candidate = self.source.current();
        if (self.check)(&candidate) {
            self.current = candidate;
            true
        } else {
            false
        }
    }
}

impl ValueTree for ResidualFilterTree {
    type Value = JsonValue;

    fn current(&self) -> JsonValue {
        self.current.clone()
    }

    fn simplify(&mut self) -> bool {
        while self.source.simplify() {
            if self.accept_current() {
                return true;
            }
        }
        false
    }

    fn complicate(&mut self) -> bool {
        while self.source.complicate() {
            if self.accept_current() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "../tests/internal/filter_unit_tests.rs"]
mod tests;
