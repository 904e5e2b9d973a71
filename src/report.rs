use std::{
    process::ExitCode,
    time::{Duration, Instant},
};

use crate::{
    formatter::{
        FmtErrors, FmtRunOutcomes, FmtRunStart, FmtTestOutcome, FmtTestStart, PushOnError,
        TestFormatter, named_fmt,
    },
    outcome::TestOutcome,
};

/// Everything a finished run produced.
#[derive(Debug)]
#[non_exhaustive]
pub struct TestReport<FmtError> {
    /// Outcomes in the order the tests were dequeued, which is registration order.
    pub outcomes: Vec<TestOutcome>,
    pub filtered_out: usize,
    pub duration: Duration,
    pub fmt_errors: FmtErrors<FmtError>,
}

impl<FmtError> TestReport<FmtError> {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_bad()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.skipped()).count()
    }

    /// `true` when no outcome failed or timed out.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::is_good)
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.is_success() {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }
}

/// Accumulates outcomes in order and forwards every event to a formatter.
///
/// Outcomes are immutable once recorded.
pub struct Reporter<Formatter: TestFormatter> {
    formatter: Formatter,
    outcomes: Vec<TestOutcome>,
    filtered_out: usize,
    fmt_errors: FmtErrors<Formatter::Error>,
    started: Instant,
}

impl<Formatter: TestFormatter> Reporter<Formatter> {
    pub fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            outcomes: Vec::new(),
            filtered_out: 0,
            fmt_errors: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn run_start(&mut self, pending: usize) {
        let formatter = &mut self.formatter;
        self.fmt_errors
            .push_on_error(named_fmt!(formatter.fmt_run_start(FmtRunStart { pending })));
    }

    pub fn test_start(&mut self, name: &str) {
        let formatter = &mut self.formatter;
        self.fmt_errors.push_on_error(named_fmt!(formatter.fmt_test_start(FmtTestStart {
            name: name.to_string()
        })));
    }

    pub fn record_filtered(&mut self) {
        self.filtered_out += 1;
    }

    pub fn record(&mut self, outcome: TestOutcome) {
        let formatter = &mut self.formatter;
        self.fmt_errors.push_on_error(named_fmt!(formatter.fmt_test_outcome(FmtTestOutcome {
            outcome: outcome.clone()
        })));
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn finish(mut self) -> TestReport<Formatter::Error> {
        let duration = self.started.elapsed();
        let formatter = &mut self.formatter;
        self.fmt_errors.push_on_error(named_fmt!(formatter.fmt_run_outcomes(FmtRunOutcomes {
            outcomes: self.outcomes.clone(),
            filtered_out: self.filtered_out,
            duration,
        })));

        TestReport {
            outcomes: self.outcomes,
            filtered_out: self.filtered_out,
            duration,
            fmt_errors: self.fmt_errors,
        }
    }
}
