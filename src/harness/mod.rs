use std::io;

pub use test::TestHarness;

use crate::{filter::DefaultFilter, formatter::table::TableFormatter, runner::SequentialRunner};

/// A harness with the default strategies: name based filtering, sequential
/// execution without time limit, and the table formatter on stdout.
pub fn harness() -> TestHarness<DefaultFilter, TableFormatter<io::Stdout>> {
    TestHarness {
        filter: DefaultFilter::default(),
        runner: SequentialRunner::default(),
        formatter: TableFormatter::default(),
    }
}
