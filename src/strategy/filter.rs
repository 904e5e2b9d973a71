//! Test filtering for synctest.
//!
//! A filter decides which dequeued tests take part in the run. Tests that do
//! not match are dropped without running and without producing an outcome,
//! they only show up in the filtered out count of the report.
//!
//! This is different to skipping: a skipped test was registered with
//! [`Registry::test_skip`](crate::registry::Registry::test_skip) and still shows
//! up in the report as skipped.
//!
//! Since the runner drains the registry queue instead of looking at a fixed
//! list, filters decide one test name at a time.
//!
//! Implement [`TestFilter`] to define a filter strategy for synctest.

/// A strategy for selecting which tests are included in a test run.
pub trait TestFilter {
    /// Return whether the test with the fully qualified `name` should run.
    fn include(&self, name: &str) -> bool;
}

impl<F> TestFilter for F
where
    F: Fn(&str) -> bool,
{
    fn include(&self, name: &str) -> bool {
        self(name)
    }
}

/// A [`TestFilter`] that does not filter out any tests.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct NoFilter;

impl NoFilter {
    pub fn new() -> Self {
        Self
    }
}

impl TestFilter for NoFilter {
    fn include(&self, _: &str) -> bool {
        true
    }
}

/// The default name based filter.
///
/// A test is included if it matches any of the `filter` patterns (or there are
/// none) and matches none of the `skip` patterns. Patterns match as substrings,
/// or as whole names when `exact` is set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DefaultFilter {
    exact: bool,
    filter: Vec<String>,
    skip: Vec<String>,
}

impl DefaultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(self, exact: bool) -> Self {
        Self { exact, ..self }
    }

    pub fn with_filter(self, filter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            filter: filter.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_skip(self, skip: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            skip: skip.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    fn matches(&self, name: &str, pattern: &str) -> bool {
        match self.exact {
            true => name == pattern,
            false => name.contains(pattern),
        }
    }
}

impl TestFilter for DefaultFilter {
    fn include(&self, name: &str) -> bool {
        let in_filter =
            self.filter.is_empty() || self.filter.iter().any(|filter| self.matches(name, filter));
        in_filter && !self.skip.iter().any(|skip| self.matches(name, skip))
    }
}
