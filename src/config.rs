//! Run level configuration.
//!
//! [`HarnessConfig`] is a [`clap::Args`] struct, so binaries can flatten it
//! into their own parser. Every option can also be set through a
//! `SYNCTEST_*` environment variable, command line arguments win.

use std::{num::ParseIntError, time::Duration};

use crate::{filter::DefaultFilter, formatter::common::color::ColorSetting, runner::SequentialRunner};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One row per test with the error underneath.
    #[default]
    Table,
    /// libtest style dots and a summary line.
    Terse,
    /// Newline delimited JSON.
    Json,
    /// No output, only the exit code.
    None,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, clap::Args)]
pub struct HarnessConfig {
    /// Only run tests whose name contains one of these patterns
    #[arg(value_name = "FILTER", env = "SYNCTEST_FILTER", value_delimiter = ',')]
    pub filters: Vec<String>,

    /// Match filter and skip patterns against whole test names
    #[arg(long, env = "SYNCTEST_EXACT")]
    pub exact: bool,

    /// Exclude tests whose name contains this pattern
    #[arg(long = "skip", value_name = "PATTERN", env = "SYNCTEST_SKIP", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Fail tests running longer than this many milliseconds
    #[arg(
        long = "test-timeout-ms",
        value_name = "MS",
        env = "SYNCTEST_TEST_TIMEOUT_MS",
        value_parser = parse_millis
    )]
    pub test_timeout: Option<Duration>,

    #[arg(long, value_enum, default_value_t, env = "SYNCTEST_FORMAT")]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t, env = "SYNCTEST_COLOR")]
    pub color: ColorSetting,
}

impl HarnessConfig {
    pub fn filter(&self) -> DefaultFilter {
        DefaultFilter::new()
            .with_exact(self.exact)
            .with_filter(self.filters.iter().cloned())
            .with_skip(self.skip.iter().cloned())
    }

    pub fn runner(&self) -> SequentialRunner {
        SequentialRunner::new().with_timeout(self.test_timeout)
    }
}

fn parse_millis(s: &str) -> Result<Duration, ParseIntError> {
    s.parse().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::filter::TestFilter;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        config: HarnessConfig,
    }

    fn parse(args: &[&str]) -> HarnessConfig {
        Cli::try_parse_from(std::iter::once("synctest").chain(args.iter().copied())).unwrap().config
    }

    #[test]
    fn parses_run_options() {
        let config = parse(&[
            "Basic",
            "--skip",
            "Delete,Update",
            "--test-timeout-ms",
            "1500",
            "--format",
            "json",
            "--color",
            "never",
        ]);

        assert_eq!(config.filters, ["Basic"]);
        assert_eq!(config.skip, ["Delete", "Update"]);
        assert_eq!(config.test_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.color, ColorSetting::Never);
        assert!(!config.exact);
    }

    #[test]
    fn builds_filter_from_patterns() {
        let filter = parse(&["Basic", "--skip", "Delete"]).filter();
        assert!(filter.include("Basic > Save > Can save a basic model"));
        assert!(!filter.include("Basic > Delete > can delete Post by PK"));
        assert!(!filter.include("observe > sanity checks"));
    }

    #[test]
    fn timeout_reaches_runner() {
        let runner = parse(&["--test-timeout-ms", "10"]).runner();
        assert_eq!(
            runner,
            SequentialRunner::new().with_timeout(Some(Duration::from_millis(10)))
        );
    }
}
