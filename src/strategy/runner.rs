//! Test execution for synctest.
//!
//! The [`SequentialRunner`] drains the [`Registry`] queue one test at a time.
//! It dequeues instead of iterating a snapshot, so a test registered while
//! another test is running is still picked up by the same run.
//!
//! Only one test body is in flight at any time. A body may suspend on
//! `.await`, but the runner does not start the next test before the current
//! one resolved. A failing or panicking test never aborts the run, the
//! failure is recorded and the loop moves on.
//!
//! Ordinary tests have no time limit. A hung test body stalls the whole run
//! unless a per test timeout is configured with
//! [`SequentialRunner::with_timeout`].

use std::{
    any::Any,
    borrow::Cow,
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::{
    filter::TestFilter,
    formatter::TestFormatter,
    outcome::{TestFailure, TestOutcome, TestStatus},
    registry::Registry,
    report::Reporter,
    test::{TestBody, TestCase, TestResult},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SequentialRunner {
    timeout: Option<Duration>,
}

impl SequentialRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how long a single test body may take.
    ///
    /// A test exceeding the limit is dropped at its next suspension point and
    /// recorded as [`TestStatus::TimedOut`].
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Drain `registry` until its queue is empty.
    pub async fn run<Filter, Formatter>(
        &self,
        registry: &Registry,
        filter: &Filter,
        reporter: &mut Reporter<Formatter>,
    ) where
        Filter: TestFilter,
        Formatter: TestFormatter,
    {
        while let Some(case) = registry.dequeue() {
            if !filter.include(&case.name) {
                debug!(test = %case.name, "filtered out");
                reporter.record_filtered();
                continue;
            }

            if !case.is_skipped() {
                reporter.test_start(&case.name);
            }
            let outcome = self.run_test(registry, case).await;
            reporter.record(outcome);
        }
    }

    /// Run a single test case and turn whatever it did into an outcome.
    pub async fn run_test(&self, registry: &Registry, case: TestCase) -> TestOutcome {
        let TestCase { name, body } = case;
        let handle = match body {
            TestBody::Run(handle) => handle,
            TestBody::Skipped => {
                debug!(test = %name, "skipped");
                return TestOutcome::new(name, TestStatus::Skipped, Duration::ZERO);
            }
        };

        let _current = CurrentTestGuard::set(registry, name.clone());
        debug!(test = %name, "running");

        let now = Instant::now();
        let test = AssertUnwindSafe(handle.call()).catch_unwind();
        let status = match self.timeout {
            None => Self::status(test.await),
            Some(after) => match tokio::time::timeout(after, test).await {
                Ok(result) => Self::status(result),
                Err(_) => TestStatus::TimedOut { after },
            },
        };
        let duration = now.elapsed();

        match &status {
            TestStatus::Passed => info!(test = %name, ?duration, "passed"),
            status => warn!(test = %name, ?duration, ?status, "failed"),
        }

        TestOutcome::new(name, status, duration)
    }

    fn status(result: Result<TestResult, Box<dyn Any + Send>>) -> TestStatus {
        match result {
            Ok(result) => result.into(),
            Err(err) => TestStatus::Failed(TestFailure::Panicked(payload_as_string(err))),
        }
    }
}

/// Convert a panic payload into a string.
///
/// This matches the common payload types produced by `panic!` (`&'static str` and `String`).
/// Other payload types are formatted as a generic placeholder.
pub fn payload_as_string(err: Box<dyn Any + Send + 'static>) -> String {
    err.downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|err| err.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

/// Publishes the running test name through [`Registry::test_name`] while alive.
struct CurrentTestGuard<'r>(&'r Registry);

impl<'r> CurrentTestGuard<'r> {
    fn set(registry: &'r Registry, name: Cow<'static, str>) -> Self {
        registry.set_current(Some(name));
        Self(registry)
    }
}

impl Drop for CurrentTestGuard<'_> {
    fn drop(&mut self) {
        self.0.set_current(None);
    }
}
