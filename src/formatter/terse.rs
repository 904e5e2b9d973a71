use std::io;

use crate::formatter::{
    FmtTestOutcome, TestFormatter,
    common::{
        RunSummary, TestCount,
        color::{ColorSetting, SupportsColor, colors::*, paint},
    },
};

/// A compact formatter in the style of the built in Rust test harness.
///
/// Prints one character per test and the list of failures at the end.
#[derive(Debug)]
pub struct TerseFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
    pending: usize,
    progress: usize,
    last_ok: bool,
}

impl Default for TerseFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
            pending: 0,
            progress: 0,
            last_ok: false,
        }
    }
}

impl<W: io::Write> TerseFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> TerseFormatter<WithTarget> {
        TerseFormatter {
            target: with_target,
            color_setting: self.color_setting,
            pending: self.pending,
            progress: self.progress,
            last_ok: self.last_ok,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        TerseFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }
}

impl<W: io::Write + SupportsColor> TerseFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }
}

impl<W: io::Write + SupportsColor> TestFormatter for TerseFormatter<W> {
    type Error = io::Error;

    type RunStart = TestCount;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        self.pending = data.0;
        match data.0 {
            1 => writeln!(self.target, "\nrunning 1 test"),
            count => writeln!(self.target, "\nrunning {count} tests"),
        }
    }

    type TestStart = ();

    type TestOutcome = FmtTestOutcome;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let outcome = data.outcome;
        self.progress += 1;
        // tests registered while running grow the total
        self.pending = self.pending.max(self.progress);

        let write_res = match outcome.is_bad() {
            false if outcome.skipped() => write!(self.target, "s"),
            false => write!(self.target, "."),
            true => {
                if self.last_ok {
                    writeln!(self.target, " {}/{}", self.progress - 1, self.pending)?;
                }
                writeln!(self.target, "{} --- FAILED", outcome.name)
            }
        };

        self.last_ok = outcome.is_good();
        write_res
    }

    type RunOutcomes = RunSummary;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        if self.last_ok {
            writeln!(self.target)?;
        }

        if !data.failures.is_empty() {
            writeln!(self.target)?;
            writeln!(self.target, "failures:")?;
            writeln!(self.target)?;
            for failure in data.failures.iter() {
                writeln!(self.target, "---- {} ----", failure.name)?;
                writeln!(self.target, "Error: {}", failure.error())?;
                writeln!(self.target)?;
            }
            writeln!(self.target, "failures:")?;
            for failure in data.failures.iter() {
                writeln!(self.target, "    {}", failure.name)?;
            }
        }

        writeln!(self.target)?;
        let verdict = match data.failed {
            0 => paint(self.use_color(), GREEN, "ok"),
            _ => paint(self.use_color(), RED, "FAILED"),
        };
        writeln!(
            self.target,
            "test result: {verdict}. {} passed; {} failed; {} skipped; {} filtered out; finished in {:.2}s",
            data.passed,
            data.failed,
            data.skipped,
            data.filtered_out,
            data.duration.as_secs_f64()
        )?;
        writeln!(self.target)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        formatter::{FmtRunOutcomes, FmtRunStart},
        outcome::{TestFailure, TestOutcome, TestStatus},
    };

    #[test]
    fn prints_dots_and_failures() {
        let mut out = Vec::new();
        let mut formatter = TerseFormatter::default().with_target(&mut out);

        let outcomes = vec![
            TestOutcome::new("a", TestStatus::Passed, Duration::ZERO),
            TestOutcome::new("b", TestStatus::Skipped, Duration::ZERO),
            TestOutcome::new(
                "c",
                TestStatus::Failed(TestFailure::Error("x".into())),
                Duration::ZERO,
            ),
        ];

        formatter.fmt_run_start(FmtRunStart { pending: 3 }.into()).unwrap();
        for outcome in outcomes.iter().cloned() {
            formatter
                .fmt_test_outcome(FmtTestOutcome { outcome })
                .unwrap();
        }
        formatter
            .fmt_run_outcomes(
                FmtRunOutcomes {
                    outcomes,
                    filtered_out: 0,
                    duration: Duration::ZERO,
                }
                .into(),
            )
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nrunning 3 tests\n\
             .s 2/3\n\
             c --- FAILED\n\
             \n\
             failures:\n\
             \n\
             ---- c ----\n\
             Error: x\n\
             \n\
             failures:\n\
             \x20   c\n\
             \n\
             test result: FAILED. 1 passed; 1 failed; 1 skipped; 0 filtered out; finished in 0.00s\n\
             \n"
        );
    }
}
