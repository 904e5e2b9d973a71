use std::{borrow::Cow, fmt::Display, time::Duration};

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::test::TestResult;

/// The recorded result of one dequeued test.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TestOutcome {
    pub name: Cow<'static, str>,
    pub status: TestStatus,
    pub duration: Duration,
}

impl TestOutcome {
    pub fn new(name: impl Into<Cow<'static, str>>, status: TestStatus, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status,
            duration,
        }
    }

    /// The short result label, `PASSED`, `FAILED` or `SKIPPED`.
    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    /// The failure message, empty for everything that did not fail.
    pub fn error(&self) -> String {
        match &self.status {
            TestStatus::Failed(failure) => failure.to_string(),
            TestStatus::TimedOut { after } => format!("timed out after {after:?}"),
            TestStatus::Passed | TestStatus::Skipped => String::new(),
        }
    }

    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }

    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn failed(&self) -> bool {
        self.status.failed()
    }

    pub fn timed_out(&self) -> bool {
        self.status.timed_out()
    }

    pub fn skipped(&self) -> bool {
        self.status.skipped()
    }
}

impl Serialize for TestOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TestOutcome", 4)?;
        s.serialize_field("name", self.name.as_ref())?;
        s.serialize_field("outcome", self.label())?;
        s.serialize_field("error", &self.error())?;
        s.serialize_field("duration_ms", &(self.duration.as_millis() as u64))?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestStatus {
    Passed,
    Failed(TestFailure),
    TimedOut { after: Duration },
    Skipped,
}

impl TestStatus {
    pub fn is_good(&self) -> bool {
        matches!(self, TestStatus::Passed | TestStatus::Skipped)
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, TestStatus::Failed(_) | TestStatus::TimedOut { .. })
    }

    pub fn passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self, TestStatus::Failed(_))
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, TestStatus::TimedOut { .. })
    }

    pub fn skipped(&self) -> bool {
        matches!(self, TestStatus::Skipped)
    }

    /// A timed out test reports as `FAILED`, the distinction lives in the error text.
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed(_) | TestStatus::TimedOut { .. } => "FAILED",
            TestStatus::Skipped => "SKIPPED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestFailure {
    Error(String),
    Panicked(String),
}

impl Display for TestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestFailure::Error(msg) => f.write_str(msg),
            TestFailure::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

impl From<TestResult> for TestStatus {
    fn from(value: TestResult) -> Self {
        match value.0 {
            Ok(_) => TestStatus::Passed,
            Err(err) => TestStatus::Failed(TestFailure::Error(err)),
        }
    }
}
