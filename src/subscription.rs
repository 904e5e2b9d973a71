use std::fmt::Debug;

use tokio::sync::mpsc;

/// A live subscription to a change notification source.
///
/// Items arrive through an unbounded channel. Cancelling the subscription
/// calls the source's unsubscribe hook exactly once. This happens on an explicit
/// [`unsubscribe`](Self::unsubscribe) or when the subscription is dropped,
/// whichever comes first.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl<T> Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

impl<T> Subscription<T> {
    pub fn new(receiver: mpsc::UnboundedReceiver<T>, unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            receiver,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Create a connected sender and subscription, mostly useful for tests and adapters.
    pub fn channel(unsubscribe: impl FnOnce() + 'static) -> (mpsc::UnboundedSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, unsubscribe))
    }

    /// Wait for the next item, `None` once the source closed.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            self.receiver.close();
            unsubscribe();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
