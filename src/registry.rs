//! Test registration for synctest.
//!
//! A [`Registry`] collects tests into a FIFO queue. Tests are grouped by nested
//! suites, registered with [`Registry::describe`], and every test registered
//! inside a suite gets the full suite path as its name prefix.
//!
//! Registration never executes a test body. The queue is drained later by the
//! [`SequentialRunner`](crate::runner::SequentialRunner), which may happen while
//! registration is still going on, since the runner dequeues instead of taking
//! a snapshot.
//!
//! A registry is a small stateful instance created fresh for each run.
//! Clones share the same state, which allows moving a registry into `'static`
//! async bodies. All state lives in [`RefCell`]s and is only touched from the
//! single control flow driving the harness, so registries are not `Send`.

use std::{
    borrow::Cow,
    cell::{Cell, RefCell},
    collections::VecDeque,
    future::Future,
    rc::Rc,
};

use tracing::debug;

use crate::test::{TestBody, TestCase, TestFnHandle, TestResult};

/// Separator between suite names and the test name in a fully qualified test name.
pub const NAME_SEPARATOR: &str = " > ";

#[derive(Debug, Default)]
struct RegistryState {
    suite_path: RefCell<Vec<String>>,
    pending: RefCell<VecDeque<TestCase>>,
    current: RefCell<Option<Cow<'static, str>>>,
    registered: Cell<usize>,
}

/// Collects suites and tests for a single harness run.
#[derive(Debug, Clone, Default)]
pub struct Registry(Rc<RegistryState>);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite.
    ///
    /// `name` is pushed onto the suite path, then `body` is awaited, then the
    /// name is popped again. The pop is done by a drop guard, so the suite path
    /// is restored when the body returns an error, panics or gets cancelled.
    ///
    /// Whatever `body` resolves to is handed back to the caller, a body returning
    /// `Result` therefore propagates its error out of `describe`.
    pub async fn describe<F, Fut>(&self, name: impl Into<String>, body: F) -> Fut::Output
    where
        F: FnOnce(Registry) -> Fut,
        Fut: Future,
    {
        let _guard = SuitePathGuard::push(&self.0, name.into());
        body(self.clone()).await
    }

    /// Register a test under the current suite path.
    ///
    /// The body is stored and only executed once the runner dequeues it.
    pub fn test<F, Fut>(&self, name: impl AsRef<str>, body: F)
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future + 'static,
        Fut::Output: Into<TestResult>,
    {
        self.push(TestCase::new(
            self.qualify(name.as_ref()),
            TestBody::Run(TestFnHandle::new(body)),
        ));
    }

    /// Disabled variant of [`test`](Self::test).
    ///
    /// The body is dropped without being called. A skipped placeholder is
    /// queued instead so the test shows up as skipped in the report.
    pub fn test_skip<F>(&self, name: impl AsRef<str>, body: F) {
        drop(body);
        self.push(TestCase::new(self.qualify(name.as_ref()), TestBody::Skipped));
    }

    /// Disabled variant of [`describe`](Self::describe).
    ///
    /// The body is never invoked and the suite path is left untouched.
    /// One skipped placeholder named after the suite is queued.
    pub fn describe_skip<F>(&self, name: impl AsRef<str>, body: F) {
        drop(body);
        self.push(TestCase::new(self.qualify(name.as_ref()), TestBody::Skipped));
    }

    /// The name of the test that is currently running.
    ///
    /// Outside of a running test this is the current suite path.
    pub fn test_name(&self) -> String {
        match self.0.current.borrow().as_ref() {
            Some(name) => name.to_string(),
            None => self.0.suite_path.borrow().join(NAME_SEPARATOR),
        }
    }

    pub fn suite_path(&self) -> Vec<String> {
        self.0.suite_path.borrow().clone()
    }

    /// Number of tests waiting in the queue.
    pub fn pending(&self) -> usize {
        self.0.pending.borrow().len()
    }

    /// Number of tests registered over the lifetime of this registry, skipped ones included.
    pub fn registered(&self) -> usize {
        self.0.registered.get()
    }

    pub fn is_empty(&self) -> bool {
        self.0.pending.borrow().is_empty()
    }

    pub(crate) fn dequeue(&self) -> Option<TestCase> {
        self.0.pending.borrow_mut().pop_front()
    }

    pub(crate) fn set_current(&self, name: Option<Cow<'static, str>>) {
        *self.0.current.borrow_mut() = name;
    }

    fn qualify(&self, name: &str) -> String {
        let path = self.0.suite_path.borrow();
        path.iter()
            .map(String::as_str)
            .chain([name])
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR)
    }

    fn push(&self, case: TestCase) {
        debug!(test = %case.name, skipped = case.is_skipped(), "registered test");
        self.0.registered.set(self.0.registered.get() + 1);
        self.0.pending.borrow_mut().push_back(case);
    }
}

/// Restores the suite path to its length before the push when dropped.
struct SuitePathGuard<'r> {
    state: &'r RegistryState,
    depth: usize,
}

impl<'r> SuitePathGuard<'r> {
    fn push(state: &'r RegistryState, name: String) -> Self {
        let mut path = state.suite_path.borrow_mut();
        let depth = path.len();
        path.push(name);
        Self { state, depth }
    }
}

impl Drop for SuitePathGuard<'_> {
    fn drop(&mut self) {
        self.state.suite_path.borrow_mut().truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::AssertUnwindSafe;

    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    use super::*;

    fn drain_names(registry: &Registry) -> Vec<String> {
        std::iter::from_fn(|| registry.dequeue())
            .map(|case| case.name.into_owned())
            .collect()
    }

    #[tokio::test]
    async fn nested_suites_qualify_names() {
        let registry = Registry::new();
        registry.test("top", || async {});
        registry
            .describe("A", |s| async move {
                s.describe("B", |s| async move { s.test("c", || async {}) })
                    .await;
                s.test("d", || async {});
            })
            .await;

        assert_eq!(drain_names(&registry), ["top", "A > B > c", "A > d"]);
        assert!(registry.suite_path().is_empty());
    }

    #[tokio::test]
    async fn registration_does_not_execute_body() {
        let registry = Registry::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        registry.test("lazy", move || async move { flag.set(true) });

        assert!(!ran.get());
        assert_eq!(registry.pending(), 1);
    }

    #[tokio::test]
    async fn failing_suite_restores_path() {
        let registry = Registry::new();
        let res: Result<(), &str> = registry
            .describe("outer", |s| async move {
                s.describe("inner", |_| async { Err::<(), _>("boom") })
                    .await?;
                Ok(())
            })
            .await;

        assert_eq!(res, Err("boom"));
        assert!(registry.suite_path().is_empty());
    }

    #[tokio::test]
    async fn panicking_suite_restores_path() {
        let registry = Registry::new();
        let res = AssertUnwindSafe(registry.describe("outer", |_| async {
            if true {
                panic!("boom")
            }
        }))
        .catch_unwind()
        .await;

        assert!(res.is_err());
        assert!(registry.suite_path().is_empty());
    }

    #[tokio::test]
    async fn skip_variants_register_placeholders() {
        let registry = Registry::new();
        registry
            .describe("A", |s| async move {
                s.test_skip("skipped test", || async {
                    if true {
                        panic!("never runs")
                    }
                });
                s.describe_skip("skipped suite", |_: Registry| async {
                    if true {
                        panic!("never runs")
                    }
                });
                assert_eq!(s.suite_path(), ["A"]);
            })
            .await;

        let cases: Vec<_> = std::iter::from_fn(|| registry.dequeue()).collect();
        assert_eq!(cases.len(), 2);
        assert!(cases.iter().all(TestCase::is_skipped));
        assert_eq!(cases[0].name, "A > skipped test");
        assert_eq!(cases[1].name, "A > skipped suite");
    }

    #[tokio::test]
    async fn test_name_follows_current_test() {
        let registry = Registry::new();
        registry
            .describe("A", |s| async move { assert_eq!(s.test_name(), "A") })
            .await;

        registry.set_current(Some("A > b".into()));
        assert_eq!(registry.test_name(), "A > b");
        registry.set_current(None);
        assert_eq!(registry.test_name(), "");
    }
}
