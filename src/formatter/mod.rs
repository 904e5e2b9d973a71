//! Output formatting for synctest.
//!
//! A formatter receives events while the harness runs: once when the run
//! starts, once per test start and outcome, and once with all outcomes at the
//! end. Each event comes as a format transfer object (`Fmt*` structs below).
//!
//! Formatters pick the shape of data they want per event through associated
//! types. Every associated type must be constructible via [`From`] from the
//! matching transfer object, so a formatter that only needs the queue length
//! declares [`TestCount`](common::TestCount) and never sees the rest. A formatter
//! that does not care about an event uses `()` and keeps the default no-op.
//!
//! Formatting errors never abort a run. They are collected and returned in the
//! [`TestReport`](crate::TestReport).

use std::time::Duration;

use crate::outcome::TestOutcome;

pub mod common;
pub mod json;
pub mod no;
pub mod table;
pub mod terse;

/// Sent once after setup finished, before the first test runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtRunStart {
    /// Tests in the queue at that point. More may be registered while running.
    pub pending: usize,
}

/// Sent right before a test body is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmtTestStart {
    pub name: String,
}

/// Sent after each dequeued test that was not filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmtTestOutcome {
    pub outcome: TestOutcome,
}

/// Sent once after the queue is drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmtRunOutcomes {
    pub outcomes: Vec<TestOutcome>,
    pub filtered_out: usize,
    pub duration: Duration,
}

pub trait TestFormatter {
    type Error;

    type RunStart: From<FmtRunStart>;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type TestStart: From<FmtTestStart>;
    fn fmt_test_start(&mut self, data: Self::TestStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type TestOutcome: From<FmtTestOutcome>;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type RunOutcomes: From<FmtRunOutcomes>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

/// Formatter errors tagged with the formatter call that produced them.
pub type FmtErrors<E> = Vec<(&'static str, E)>;

pub(crate) trait PushOnError<E> {
    fn push_on_error(&mut self, res: (&'static str, Result<(), E>));
}

impl<E> PushOnError<E> for FmtErrors<E> {
    fn push_on_error(&mut self, (name, res): (&'static str, Result<(), E>)) {
        if let Err(err) = res {
            self.push((name, err));
        }
    }
}

macro_rules! named_fmt {
    ($formatter:ident.$method:ident($data:expr)) => {
        (
            stringify!($method),
            $formatter.$method(::std::convert::From::from($data)),
        )
    };
}

pub(crate) use named_fmt;
