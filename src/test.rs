use std::{borrow::Cow, fmt::Debug, fmt::Display, future::Future};

use futures::future::{FutureExt, LocalBoxFuture};

/// A registered test waiting in the [`Registry`](crate::registry::Registry) queue.
///
/// A test case is consumed when the runner dequeues it. The body runs at most once.
#[derive(Debug)]
#[non_exhaustive]
pub struct TestCase {
    pub name: Cow<'static, str>,
    pub body: TestBody,
}

impl TestCase {
    pub fn new(name: impl Into<Cow<'static, str>>, body: TestBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.body, TestBody::Skipped)
    }
}

/// What the runner does with a dequeued [`TestCase`].
#[non_exhaustive]
pub enum TestBody {
    Run(TestFnHandle),
    Skipped,
}

impl Debug for TestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run(handle) => f.debug_tuple("Run").field(handle).finish(),
            Self::Skipped => write!(f, "Skipped"),
        }
    }
}

/// A boxed async test closure.
///
/// Futures produced by the handle are not required to be `Send`, test bodies
/// are driven on the single task that runs the harness.
pub struct TestFnHandle(Box<dyn FnOnce() -> LocalBoxFuture<'static, TestResult>>);

impl Debug for TestFnHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestFnHandle(...)")
    }
}

impl TestFnHandle {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future + 'static,
        Fut::Output: Into<TestResult>,
    {
        Self(Box::new(move || f().map(Into::into).boxed_local()))
    }

    pub fn call(self) -> LocalBoxFuture<'static, TestResult> {
        (self.0)()
    }
}

/// The value a test body resolves to.
///
/// Bodies may return `()` or any `Result<(), E>` where `E: Display`,
/// the error message text becomes the failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult(pub Result<(), String>);

impl From<()> for TestResult {
    fn from(_: ()) -> Self {
        Self(Ok(()))
    }
}

impl<E: Display> From<Result<(), E>> for TestResult {
    fn from(v: Result<(), E>) -> Self {
        TestResult(v.map_err(|e| e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_maps_unit_to_ok() {
        let handle = TestFnHandle::new(|| async {});
        assert_eq!(handle.call().await, TestResult(Ok(())));
    }

    #[tokio::test]
    async fn handle_uses_display_text_of_errors() {
        let handle = TestFnHandle::new(|| async { Err::<(), _>("x") });
        assert_eq!(handle.call().await, TestResult(Err("x".to_string())));
    }
}
