//! Collecting asynchronous change notifications inside tests.
//!
//! Both collectors race a [`Subscription`] against a timer:
//!
//! - [`ObserveCollector`] resolves as soon as `count` matching events arrived and
//!   fails with [`CollectError::TimedOut`] if the timer wins.
//! - [`SnapshotCollector`] keeps every item until the window elapsed and then
//!   resolves with all of them. It never fails.
//!
//! The deadline is fixed when the collector is constructed, not when it is
//! first awaited. Creating a collector before a mutation and awaiting it after
//! the mutation therefore measures the whole span. Events arriving in between
//! are buffered by the subscription.
//!
//! Each collector owns its subscription and unsubscribes exactly once, on
//! success as well as on timeout. Dropping an unfinished collector releases
//! the subscription through its drop guard.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::subscription::Subscription;

/// How long an [`ObserveCollector`] waits by default.
pub const DEFAULT_OBSERVE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a [`SnapshotCollector`] collects by default.
pub const DEFAULT_SNAPSHOT_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CollectError {
    #[error("observe() timed out after {timeout:?} ({received} of {expected} events received)")]
    TimedOut {
        timeout: Duration,
        expected: usize,
        received: usize,
    },

    #[error("subscription closed after {received} of {expected} events")]
    Closed { expected: usize, received: usize },
}

type EventFilter<T> = Box<dyn Fn(&T) -> bool>;

/// Waits for a fixed number of events.
pub struct ObserveCollector<T> {
    subscription: Subscription<T>,
    filter: Option<EventFilter<T>>,
    count: usize,
    timeout: Duration,
    started: Instant,
}

impl<T> ObserveCollector<T> {
    /// Start collecting from `subscription`, waiting for one event for up to five seconds.
    pub fn new(subscription: Subscription<T>) -> Self {
        Self {
            subscription,
            filter: None,
            count: 1,
            timeout: DEFAULT_OBSERVE_TIMEOUT,
            started: Instant::now(),
        }
    }

    pub fn with_count(self, count: usize) -> Self {
        Self { count, ..self }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Only count events for which `filter` returns `true`, others are discarded.
    pub fn with_filter(self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            filter: Some(Box::new(filter)),
            ..self
        }
    }

    /// Resolve with the first `count` matching events in emission order.
    pub async fn collect(self) -> Result<Vec<T>, CollectError> {
        let Self {
            mut subscription,
            filter,
            count,
            timeout,
            started,
        } = self;
        let deadline = started + timeout;
        let mut events = Vec::with_capacity(count);

        let res = loop {
            if events.len() >= count {
                break Ok(events);
            }

            tokio::select! {
                biased;

                event = subscription.next() => match event {
                    Some(event) => {
                        if filter.as_ref().is_none_or(|filter| filter(&event)) {
                            events.push(event);
                        }
                    }
                    None => {
                        break Err(CollectError::Closed {
                            expected: count,
                            received: events.len(),
                        });
                    }
                },
                _ = sleep_until(deadline) => {
                    break Err(CollectError::TimedOut {
                        timeout,
                        expected: count,
                        received: events.len(),
                    });
                }
            }
        };

        subscription.unsubscribe();
        debug!(ok = res.is_ok(), expected = count, "observe collector resolved");
        res
    }
}

/// Collects every item for a fixed time window.
pub struct SnapshotCollector<T> {
    subscription: Subscription<T>,
    window: Duration,
    started: Instant,
}

impl<T> SnapshotCollector<T> {
    /// Start collecting from `subscription` for three seconds.
    pub fn new(subscription: Subscription<T>) -> Self {
        Self {
            subscription,
            window: DEFAULT_SNAPSHOT_WINDOW,
            started: Instant::now(),
        }
    }

    pub fn with_window(self, window: Duration) -> Self {
        Self { window, ..self }
    }

    /// Resolve with everything received until the window elapsed.
    pub async fn collect(self) -> Vec<T> {
        let Self {
            mut subscription,
            window,
            started,
        } = self;
        let deadline = started + window;
        let mut snapshots = Vec::new();
        let mut open = true;

        loop {
            tokio::select! {
                biased;

                _ = sleep_until(deadline) => break,
                snapshot = subscription.next(), if open => match snapshot {
                    Some(snapshot) => snapshots.push(snapshot),
                    None => open = false,
                },
            }
        }

        subscription.unsubscribe();
        debug!(received = snapshots.len(), "snapshot collector resolved");
        snapshots
    }
}
