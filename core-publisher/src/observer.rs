//! Push-side consumer interface.

use std::mem;

use core_async::sync::oneshot;

use crate::subscription::SubscriptionHandle;

/// Terminal signal of a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<E> {
    Finished,
    Failure(E),
}

impl<E> Completion<E> {
    pub fn is_failure(&self) -> bool {
        matches!(self, Completion::Failure(_))
    }

    pub fn into_result(self) -> Result<(), E> {
        match self {
            Completion::Finished => Ok(()),
            Completion::Failure(error) => Err(error),
        }
    }
}

/// Receives the values and the terminal signal of one subscription.
///
/// Calls are never concurrent: values arrive in the order they were sent and
/// `on_completion` arrives after all of them, at most once.
pub trait Observer<T, E>: Send + 'static {
    /// Called once before the work starts.
    ///
    /// The handle may be kept to cancel later, including from inside
    /// [`on_next`](Observer::on_next).
    fn on_subscribe(&mut self, handle: SubscriptionHandle) {
        let _ = handle;
    }

    fn on_next(&mut self, value: T);

    fn on_completion(&mut self, completion: Completion<E>);
}

/// Observer assembled from two closures.
pub(crate) struct ClosureObserver<V, C> {
    on_value: V,
    on_completion: Option<C>,
}

impl<V, C> ClosureObserver<V, C> {
    pub(crate) fn new(on_value: V, on_completion: C) -> Self {
        Self {
            on_value,
            on_completion: Some(on_completion),
        }
    }
}

impl<T, E, V, C> Observer<T, E> for ClosureObserver<V, C>
where
    V: FnMut(T) + Send + 'static,
    C: FnOnce(Completion<E>) + Send + 'static,
{
    fn on_next(&mut self, value: T) {
        (self.on_value)(value);
    }

    fn on_completion(&mut self, completion: Completion<E>) {
        if let Some(on_completion) = self.on_completion.take() {
            on_completion(completion);
        }
    }
}

/// Resolves with the first value, or the terminal signal if none arrives,
/// then cancels the rest of the work.
pub(crate) struct FirstObserver<T, E> {
    tx: Option<oneshot::Sender<Result<Option<T>, E>>>,
    handle: Option<SubscriptionHandle>,
}

impl<T, E> FirstObserver<T, E> {
    pub(crate) fn new(tx: oneshot::Sender<Result<Option<T>, E>>) -> Self {
        Self {
            tx: Some(tx),
            handle: None,
        }
    }
}

impl<T, E> Observer<T, E> for FirstObserver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn on_subscribe(&mut self, handle: SubscriptionHandle) {
        self.handle = Some(handle);
    }

    fn on_next(&mut self, value: T) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ok(Some(value)));
        }
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }

    fn on_completion(&mut self, completion: Completion<E>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(completion.into_result().map(|()| None));
        }
    }
}

/// Gathers every value and resolves once the terminal signal arrives.
pub(crate) struct CollectObserver<T, E> {
    values: Vec<T>,
    tx: Option<oneshot::Sender<Result<Vec<T>, E>>>,
}

impl<T, E> CollectObserver<T, E> {
    pub(crate) fn new(tx: oneshot::Sender<Result<Vec<T>, E>>) -> Self {
        Self {
            values: Vec::new(),
            tx: Some(tx),
        }
    }
}

impl<T, E> Observer<T, E> for CollectObserver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn on_next(&mut self, value: T) {
        self.values.push(value);
    }

    fn on_completion(&mut self, completion: Completion<E>) {
        if let Some(tx) = self.tx.take() {
            let values = mem::take(&mut self.values);
            let _ = tx.send(completion.into_result().map(|()| values));
        }
    }
}
