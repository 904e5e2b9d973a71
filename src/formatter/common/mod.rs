//! Common helpers for formatter implementations.
//!
//! This module contains small helper types that are convenient when implementing synctest
//! formatters. They are intentionally formatter focused and are not meant to be general purpose
//! building blocks for unrelated code.

use std::time::Duration;

use crate::{
    formatter::{FmtRunOutcomes, FmtRunStart},
    outcome::TestOutcome,
};

pub mod color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCount(pub usize);

impl From<FmtRunStart> for TestCount {
    fn from(value: FmtRunStart) -> Self {
        TestCount(value.pending)
    }
}

/// Counts over a finished run plus the outcomes that went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub filtered_out: usize,
    pub duration: Duration,
    pub failures: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl From<FmtRunOutcomes> for RunSummary {
    fn from(value: FmtRunOutcomes) -> Self {
        let count = |f: fn(&TestOutcome) -> bool| value.outcomes.iter().filter(|o| f(o)).count();
        Self {
            passed: count(TestOutcome::passed),
            failed: count(TestOutcome::is_bad),
            skipped: count(TestOutcome::skipped),
            filtered_out: value.filtered_out,
            duration: value.duration,
            failures: value
                .outcomes
                .iter()
                .filter(|outcome| outcome.is_bad())
                .cloned()
                .collect(),
        }
    }
}
