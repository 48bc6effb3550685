//! The publisher factory and its consumer surfaces.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use core_async::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::cancellable::Cancellable;
use crate::error::Abandoned;
use crate::observer::{ClosureObserver, CollectObserver, Completion, FirstObserver, Observer};
use crate::subscriber::{CancelTarget, Shared, Subscriber};
use crate::subscription::{AnyCancellable, ChannelObserver, Subscription, SubscriptionHandle};

type Work<T, E> = dyn Fn(Subscriber<T, E>) -> Cancellable + Send + Sync + 'static;

/// A cold description of how to produce a stream of `T` that ends in either
/// completion or an `E`.
///
/// Nothing runs until someone subscribes. Every subscription calls the work
/// function once with a fresh [`Subscriber`], so two subscriptions never
/// share state beyond what the work itself touches.
///
/// # Example
///
/// ```
/// use core_publisher::{Cancellable, Publisher};
///
/// # core_async::runtime::block_on(async {
/// let numbers = Publisher::<u32, String>::create(|subscriber| {
///     for n in 1..=3 {
///         subscriber.send(n);
///     }
///     subscriber.complete();
///     Cancellable::empty()
/// });
///
/// assert_eq!(numbers.collect().await, Ok(vec![1, 2, 3]));
/// assert_eq!(numbers.first().await, Ok(Some(1)));
/// # });
/// ```
pub struct Publisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    work: Arc<Work<T, E>>,
    label: &'static str,
}

impl<T, E> Publisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wraps `work` into a publisher.
    ///
    /// `work` receives the subscriber handle, may send any number of values,
    /// must eventually call exactly one of `complete` / `fail` (now or later
    /// from a callback), and returns the hook that releases what it acquired.
    /// Errors must already be in `E`; the bridge does not translate.
    pub fn create<F>(work: F) -> Self
    where
        F: Fn(Subscriber<T, E>) -> Cancellable + Send + Sync + 'static,
    {
        Self {
            work: Arc::new(work),
            label: "publisher",
        }
    }

    /// Sets the name used for this publisher in log output.
    pub fn named(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Subscribes `observer`, running the work now.
    pub fn sink<O>(&self, observer: O) -> AnyCancellable
    where
        O: Observer<T, E>,
    {
        self.attach(Box::new(observer), false)
    }

    fn attach(&self, observer: Box<dyn Observer<T, E>>, paced: bool) -> AnyCancellable {
        let shared = Arc::new(Shared::new(self.label, observer, paced));
        let target: Arc<dyn CancelTarget> = shared.clone();

        shared.notify_subscribed(SubscriptionHandle::new(Arc::downgrade(&target)));
        if target.is_closed() {
            debug!(
                publisher = self.label,
                subscription = shared.id(),
                "cancelled before the work started"
            );
            return AnyCancellable::new(target);
        }

        debug!(
            publisher = self.label,
            subscription = shared.id(),
            "subscribed"
        );

        let subscriber = Subscriber::new(Arc::clone(&shared));
        let work = Arc::clone(&self.work);

        match panic::catch_unwind(AssertUnwindSafe(move || work(subscriber))) {
            Ok(cancellable) => shared.install(cancellable),
            Err(payload) => {
                error!(
                    publisher = self.label,
                    subscription = shared.id(),
                    panic = %panic_message(payload.as_ref()),
                    "work function panicked instead of failing"
                );
                shared.close_without_terminal("work function panicked");
            }
        }

        AnyCancellable::new(target)
    }

    /// Subscribes with a value closure and a completion closure.
    pub fn sink_with<V, C>(&self, on_value: V, on_completion: C) -> AnyCancellable
    where
        V: FnMut(T) + Send + 'static,
        C: FnOnce(Completion<E>) + Send + 'static,
    {
        self.sink(ClosureObserver::new(on_value, on_completion))
    }

    /// Subscribes and returns the subscription as a [`Stream`](futures::Stream).
    ///
    /// Work that sends from inside this call buffers everything it sends
    /// before the stream is returned. Work running elsewhere can pace itself
    /// to the reader with [`Subscriber::wait_for_demand`].
    pub fn subscribe(&self) -> Subscription<T, E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancellable = self.attach(Box::new(ChannelObserver::new(tx)), true);
        Subscription::new(rx, cancellable)
    }
}

impl<T, E> Publisher<T, E>
where
    T: Send + 'static,
    E: From<Abandoned> + Send + 'static,
{
    /// Waits for the first outcome of a new subscription.
    ///
    /// Resolves to the first value, the failure, or `Ok(None)` when the
    /// stream completes without a value. The subscription is cancelled while
    /// the first value is delivered, so cooperative work stops after it.
    /// A subscription that closes without a terminal signal resolves to
    /// [`Abandoned`].
    pub async fn first(&self) -> Result<Option<T>, E> {
        let (tx, rx) = oneshot::channel();
        let _subscription = self.sink(FirstObserver::new(tx));
        rx.await.unwrap_or_else(|_| Err(self.abandoned()))
    }

    /// Waits for a new subscription to terminate, gathering every value.
    ///
    /// Values received before a failure are discarded. A subscription that
    /// closes without a terminal signal resolves to [`Abandoned`].
    pub async fn collect(&self) -> Result<Vec<T>, E> {
        let (tx, rx) = oneshot::channel();
        let _subscription = self.sink(CollectObserver::new(tx));
        rx.await.unwrap_or_else(|_| Err(self.abandoned()))
    }

    fn abandoned(&self) -> E {
        E::from(Abandoned {
            publisher: self.label,
        })
    }
}

impl<T, E> Clone for Publisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            work: Arc::clone(&self.work),
            label: self.label,
        }
    }
}

impl<T, E> fmt::Debug for Publisher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
