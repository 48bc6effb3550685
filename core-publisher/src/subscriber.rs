//! Producer-side handle and the per-subscription state behind it.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{debug, warn};

use crate::cancellable::Cancellable;
use crate::observer::{Completion, Observer};
use crate::subscription::SubscriptionHandle;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased view of a subscription used by consumer-side tokens.
pub(crate) trait CancelTarget: Send + Sync {
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
    fn is_closed(&self) -> bool;
    /// The consumer is waiting for the next value.
    fn request_next(&self);
}

struct State<T, E> {
    observer: Option<Box<dyn Observer<T, E>>>,
}

enum Release {
    /// The work has not returned its hook yet.
    Pending,
    Installed(Cancellable),
    Done,
}

/// Pacing for a consumer that pulls one value at a time.
///
/// `requested` is set while the consumer waits on an empty buffer and
/// cleared by the next delivered value.
struct Demand {
    requested: Mutex<bool>,
    ready: Condvar,
}

impl Demand {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State of one subscription, shared by every [`Subscriber`] clone and by the
/// consumer's cancellation tokens.
pub(crate) struct Shared<T, E> {
    label: &'static str,
    id: u64,
    state: Mutex<State<T, E>>,
    /// Set once by the first of: terminal signal, cancel, abandonment.
    closed: AtomicBool,
    cancelled: AtomicBool,
    producers: AtomicUsize,
    release: Mutex<Release>,
    demand: Option<Demand>,
}

impl<T, E> Shared<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// `paced` consumers hand out demand through
    /// [`CancelTarget::request_next`]; others accept values as fast as they
    /// come.
    pub(crate) fn new(
        label: &'static str,
        observer: Box<dyn Observer<T, E>>,
        paced: bool,
    ) -> Self {
        Self {
            label,
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(State {
                observer: Some(observer),
            }),
            closed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            producers: AtomicUsize::new(0),
            release: Mutex::new(Release::Pending),
            demand: paced.then(|| Demand {
                requested: Mutex::new(false),
                ready: Condvar::new(),
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock_state(&self) -> Option<MutexGuard<'_, State<T, E>>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn lock_release(&self) -> MutexGuard<'_, Release> {
        self.release.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notify_subscribed(&self, handle: SubscriptionHandle) {
        let mut state = self.lock_state();
        if let Some(observer) = state.observer.as_mut() {
            observer.on_subscribe(handle);
        }
    }

    fn deliver(&self, value: T) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        let mut state = self.lock_state();
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        let Some(observer) = state.observer.as_mut() else {
            return false;
        };
        observer.on_next(value);
        if let Some(demand) = &self.demand {
            *demand.lock() = false;
        }

        // The observer may have cancelled from inside `on_next`.
        if self.closed.load(Ordering::Acquire) {
            let observer = state.observer.take();
            drop(state);
            drop(observer);
            return false;
        }

        true
    }

    fn wait_for_demand(&self) -> bool {
        let Some(demand) = &self.demand else {
            return !self.closed.load(Ordering::Acquire);
        };

        let mut requested = demand.lock();
        loop {
            if self.closed.load(Ordering::Acquire) {
                return false;
            }
            if *requested {
                return true;
            }
            requested = demand
                .ready
                .wait(requested)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wakes producers parked in `wait_for_demand` after `closed` was set.
    fn wake_producers(&self) {
        if let Some(demand) = &self.demand {
            let _requested = demand.lock();
            demand.ready.notify_all();
        }
    }

    fn terminate(&self, completion: Completion<E>) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        let observer = {
            let mut state = self.lock_state();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            state.observer.take()
        };

        debug!(
            publisher = self.label,
            subscription = self.id,
            failed = completion.is_failure(),
            "subscription terminated"
        );

        self.wake_producers();
        if let Some(mut observer) = observer {
            observer.on_completion(completion);
        }

        self.run_release();
    }

    /// Closes the subscription without a terminal signal.
    pub(crate) fn close_without_terminal(&self, reason: &'static str) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        warn!(
            publisher = self.label,
            subscription = self.id,
            reason,
            "subscription closed without a terminal signal"
        );

        self.wake_producers();
        let observer = self.lock_state().observer.take();
        drop(observer);
        self.run_release();
    }

    /// Stores the work's release hook, or runs it at once if the
    /// subscription already ended while the work was still running.
    pub(crate) fn install(&self, cancellable: Cancellable) {
        let run_now = {
            let mut slot = self.lock_release();
            match *slot {
                Release::Done => Some(cancellable),
                _ => {
                    *slot = Release::Installed(cancellable);
                    None
                }
            }
        };

        if let Some(cancellable) = run_now {
            cancellable.cancel();
        }
    }

    fn run_release(&self) {
        let installed = match mem::replace(&mut *self.lock_release(), Release::Done) {
            Release::Installed(cancellable) => Some(cancellable),
            Release::Pending | Release::Done => None,
        };

        if let Some(cancellable) = installed {
            cancellable.cancel();
        }
    }
}

impl<T, E> CancelTarget for Shared<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn cancel(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancelled.store(true, Ordering::Release);

        debug!(
            publisher = self.label,
            subscription = self.id,
            "subscription cancelled"
        );

        self.wake_producers();
        self.run_release();

        // When called from inside `on_next` the lock is held by the delivering
        // frame, which drops the observer itself once the callback returns.
        if let Some(mut state) = self.try_lock_state() {
            let observer = state.observer.take();
            drop(state);
            drop(observer);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn request_next(&self) {
        if let Some(demand) = &self.demand {
            *demand.lock() = true;
            demand.ready.notify_all();
        }
    }
}

/// Handle a work function reports values and its outcome through.
///
/// Clones address the same subscription, so a callback registered with an
/// external service can carry one. Once a terminal signal has been sent, or
/// the consumer has cancelled, every further call is a no-op.
///
/// Dropping every clone without a terminal signal closes the subscription as
/// abandoned.
pub struct Subscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Subscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        shared.producers.fetch_add(1, Ordering::AcqRel);
        Self { shared }
    }

    /// Delivers `value` to the consumer.
    ///
    /// Returns `false` when the subscription is closed, including when the
    /// consumer cancelled while handling this value. Producers iterating over
    /// many items should stop then.
    pub fn send(&self, value: T) -> bool {
        self.shared.deliver(value)
    }

    /// Ends the subscription successfully.
    pub fn complete(&self) {
        self.shared.terminate(Completion::Finished);
    }

    /// Ends the subscription with `error`.
    pub fn fail(&self, error: E) {
        self.shared.terminate(Completion::Failure(error));
    }

    pub fn finish(&self, completion: Completion<E>) {
        self.shared.terminate(completion);
    }

    /// Sends the value and completes on `Ok`, fails on `Err`.
    pub fn resolve(&self, result: Result<T, E>) {
        match result {
            Ok(value) => {
                self.send(value);
                self.complete();
            }
            Err(error) => self.fail(error),
        }
    }

    /// Blocks until the consumer is waiting for another value.
    ///
    /// Returns `false` once the subscription is closed. Only stream consumers
    /// are paced; for every other consumer this returns at once. Call it only
    /// from a thread that may block, never from the subscribing call or an
    /// async task.
    pub fn wait_for_demand(&self) -> bool {
        self.shared.wait_for_demand()
    }

    /// Whether values sent now would be dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Whether the consumer cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl<T, E> Clone for Subscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.shared))
    }
}

impl<T, E> Drop for Subscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn drop(&mut self) {
        if self.shared.producers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared
                .close_without_terminal("every subscriber handle was dropped");
        }
    }
}

impl<T, E> fmt::Debug for Subscriber<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("publisher", &self.shared.label)
            .field("subscription", &self.shared.id)
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}
