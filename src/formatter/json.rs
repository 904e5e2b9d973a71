use std::io;

use serde::Serialize;

use crate::formatter::{FmtTestOutcome, TestFormatter, common::RunSummary};

/// Writes newline delimited JSON.
///
/// Every outcome becomes one `{"name", "outcome", "error", "duration_ms"}`
/// object, the run ends with a single summary object.
#[derive(Debug)]
pub struct JsonFormatter<W: io::Write> {
    target: W,
}

impl Default for JsonFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
        }
    }
}

impl<W: io::Write> JsonFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(self, target: WithTarget) -> JsonFormatter<WithTarget> {
        JsonFormatter { target }
    }

    fn write_line(&mut self, value: &impl Serialize) -> io::Result<()> {
        serde_json::to_writer(&mut self.target, value)?;
        writeln!(self.target)
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    passed: usize,
    failed: usize,
    skipped: usize,
    filtered_out: usize,
    duration_ms: u64,
}

impl<W: io::Write> TestFormatter for JsonFormatter<W> {
    type Error = io::Error;

    type RunStart = ();
    type TestStart = ();

    type TestOutcome = FmtTestOutcome;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        self.write_line(&data.outcome)
    }

    type RunOutcomes = RunSummary;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        self.write_line(&Summary {
            passed: data.passed,
            failed: data.failed,
            skipped: data.skipped,
            filtered_out: data.filtered_out,
            duration_ms: data.duration.as_millis() as u64,
        })
    }
}
