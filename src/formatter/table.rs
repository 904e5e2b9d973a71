use std::io;

use crate::formatter::{
    FmtTestOutcome, TestFormatter,
    common::{
        RunSummary,
        color::{ColorSetting, SupportsColor, colors::*, paint},
    },
};

const RESULT_WIDTH: usize = 8;

/// Renders one row per outcome: the result label, the test name, and the
/// error text on an indented row underneath if there is one.
///
/// ```text
/// RESULT  NAME
/// PASSED  Basic > Save > Can save a basic model
/// FAILED  A > b
///         x
/// ```
#[derive(Debug)]
pub struct TableFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for TableFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: ColorSetting::default(),
        }
    }
}

impl<W: io::Write> TableFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(self, target: WithTarget) -> TableFormatter<WithTarget> {
        TableFormatter {
            target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        Self {
            color_setting: color_setting.into(),
            ..self
        }
    }
}

impl<W: io::Write + SupportsColor> TableFormatter<W> {
    fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }
}

impl<W: io::Write + SupportsColor> TestFormatter for TableFormatter<W> {
    type Error = io::Error;

    type RunStart = ();
    fn fmt_run_start(&mut self, _: Self::RunStart) -> Result<(), Self::Error> {
        writeln!(self.target, "{:<RESULT_WIDTH$}NAME", "RESULT")
    }

    type TestStart = ();

    type TestOutcome = FmtTestOutcome;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let outcome = data.outcome;
        let label = outcome.label();
        let color = match outcome.is_bad() {
            true => RED,
            false if outcome.skipped() => YELLOW,
            false => GREEN,
        };
        let padding = " ".repeat(RESULT_WIDTH.saturating_sub(label.len()));
        writeln!(
            self.target,
            "{}{padding}{}",
            paint(self.use_color(), color, label),
            outcome.name
        )?;

        let error = outcome.error();
        for line in error.lines() {
            writeln!(self.target, "{:RESULT_WIDTH$}{line}", "")?;
        }
        Ok(())
    }

    type RunOutcomes = RunSummary;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        writeln!(self.target)?;
        writeln!(
            self.target,
            "{} tests: {} passed; {} failed; {} skipped; {} filtered out; finished in {:.2}s",
            data.total(),
            data.passed,
            data.failed,
            data.skipped,
            data.filtered_out,
            data.duration.as_secs_f64()
        )
    }
}
