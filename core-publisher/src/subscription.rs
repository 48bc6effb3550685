//! Consumer-side tokens and the pull-based [`Subscription`] stream.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use core_async::sync::mpsc;
use futures::stream::{FusedStream, Stream};

use crate::observer::{Completion, Observer};
use crate::subscriber::CancelTarget;

/// Owning cancellation token for a subscription.
///
/// Cancels when dropped. `cancel` is idempotent and a no-op once the
/// subscription has terminated.
#[must_use = "dropping an AnyCancellable cancels the subscription"]
pub struct AnyCancellable {
    target: Arc<dyn CancelTarget>,
}

impl AnyCancellable {
    pub(crate) fn new(target: Arc<dyn CancelTarget>) -> Self {
        Self { target }
    }

    pub fn cancel(&self) {
        self.target.cancel();
    }

    /// Whether the consumer cancelled this subscription.
    pub fn is_cancelled(&self) -> bool {
        self.target.is_cancelled()
    }

    /// Whether the subscription has terminated or been cancelled.
    pub fn is_closed(&self) -> bool {
        self.target.is_closed()
    }

    pub(crate) fn request_next(&self) {
        self.target.request_next();
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        self.target.cancel();
    }
}

impl fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCancellable")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Non-owning cancellation handle passed to [`Observer::on_subscribe`].
///
/// Holding it does not keep the subscription alive.
#[derive(Clone)]
pub struct SubscriptionHandle {
    target: Weak<dyn CancelTarget>,
}

impl SubscriptionHandle {
    pub(crate) fn new(target: Weak<dyn CancelTarget>) -> Self {
        Self { target }
    }

    pub fn cancel(&self) {
        if let Some(target) = self.target.upgrade() {
            target.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.target
            .upgrade()
            .map_or(true, |target| target.is_closed())
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(crate) enum Signal<T, E> {
    Next(T),
    Done(Completion<E>),
}

/// Observer that forwards into the channel read by a [`Subscription`].
pub(crate) struct ChannelObserver<T, E> {
    tx: mpsc::UnboundedSender<Signal<T, E>>,
}

impl<T, E> ChannelObserver<T, E> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Signal<T, E>>) -> Self {
        Self { tx }
    }
}

impl<T, E> Observer<T, E> for ChannelObserver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn on_next(&mut self, value: T) {
        // The receiver is gone only after the consumer dropped the stream.
        let _ = self.tx.send(Signal::Next(value));
    }

    fn on_completion(&mut self, completion: Completion<E>) {
        let _ = self.tx.send(Signal::Done(completion));
    }
}

/// A running subscription read as a stream.
///
/// Yields each value as `Ok`, a failure as a final `Err`, and ends after the
/// terminal signal. Ends early (without draining buffered values) once
/// cancelled; dropping the stream cancels the subscription.
///
/// Polling an empty buffer grants one unit of demand to producers parked in
/// [`Subscriber::wait_for_demand`](crate::Subscriber::wait_for_demand), so a
/// paced producer runs at most one value ahead of the reader. Producers that
/// never wait buffer everything they send.
pub struct Subscription<T, E> {
    rx: mpsc::UnboundedReceiver<Signal<T, E>>,
    cancellable: AnyCancellable,
    finished: bool,
}

impl<T, E> Subscription<T, E> {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Signal<T, E>>,
        cancellable: AnyCancellable,
    ) -> Self {
        Self {
            rx,
            cancellable,
            finished: false,
        }
    }

    pub fn cancel(&self) {
        self.cancellable.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellable.is_cancelled()
    }
}

impl<T, E> Stream for Subscription<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if this.cancellable.is_cancelled() {
            this.finished = true;
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Signal::Next(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Signal::Done(Completion::Failure(error)))) => {
                this.finished = true;
                Poll::Ready(Some(Err(error)))
            }
            // Abandoned subscriptions drop the sender without a terminal signal.
            Poll::Ready(Some(Signal::Done(Completion::Finished))) | Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => {
                this.cancellable.request_next();
                Poll::Pending
            }
        }
    }
}

impl<T, E> FusedStream for Subscription<T, E> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<T, E> fmt::Debug for Subscription<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("finished", &self.finished)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
