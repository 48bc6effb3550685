//! Publisher-returning facade over a [`ContactDirectory`].

use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bridge_traits::{
    error::Result as DirectoryResult, Contact, ContactDirectory, ContactKey, ContactPredicate,
    Container, ContainerPredicate, DirectoryChange, DirectoryError, EntityType, FetchRequest, Group, GroupPredicate, SaveRequest,
};
use core_async::runtime;
use core_async::sync::CancellationToken;
use core_publisher::{panic_message, Cancellable, Publisher, Subscriber};
use core_runtime::config::{ContactsConfig, DispatchMode, SaveFailurePolicy};
use core_runtime::logging::mask_identifier;
use tracing::{debug, error, warn};

use crate::error::ContactError;
use crate::translate::{translate, unknown, CallbackGuard, DirectoryOperation};

/// Contacts facade
///
/// Every method returns a cold [`Publisher`]: nothing touches the directory
/// until the publisher is subscribed, and every subscription runs the
/// operation again. Failures arrive as [`ContactError`] tagged with the
/// operation that produced them.
///
/// Collection results (`unified_contacts`, `groups`, `containers`) are
/// emitted as a single value when non-empty; an empty result completes
/// without a value.
#[derive(Clone)]
pub struct ContactsService {
    directory: Arc<dyn ContactDirectory>,
    save_failure_policy: SaveFailurePolicy,
    dispatcher: Dispatcher,
    transaction_author: Option<String>,
}

impl ContactsService {
    pub fn new(config: ContactsConfig) -> Self {
        Self {
            directory: config.directory,
            save_failure_policy: config.save_failure_policy,
            dispatcher: Dispatcher {
                mode: config.dispatch_mode,
            },
            transaction_author: config.transaction_author,
        }
    }

    /// Service over `directory` with default settings.
    pub fn with_directory(directory: Arc<dyn ContactDirectory>) -> Self {
        Self {
            directory,
            save_failure_policy: SaveFailurePolicy::default(),
            dispatcher: Dispatcher {
                mode: DispatchMode::default(),
            },
            transaction_author: None,
        }
    }

    pub fn directory(&self) -> Arc<dyn ContactDirectory> {
        Arc::clone(&self.directory)
    }

    pub fn save_failure_policy(&self) -> SaveFailurePolicy {
        self.save_failure_policy
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatcher.mode
    }

    /// Requests access to `entity_type`.
    ///
    /// Emits `true` or `false` and completes. Only a failure of the
    /// permission layer itself fails the publisher, with
    /// [`ContactError::AccessDenied`].
    pub fn request_access(&self, entity_type: EntityType) -> Publisher<bool, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::RequestAccess;
        let directory = Arc::clone(&self.directory);

        Publisher::create(move |subscriber| {
            debug!(operation = %OPERATION, ?entity_type, "requesting access");
            let guard = CallbackGuard::new(OPERATION, subscriber);

            let completion = Box::new(move |granted: bool, failure: Option<DirectoryError>| {
                let Some(subscriber) = guard.resolve() else {
                    return;
                };
                match failure {
                    Some(failure) => {
                        warn!(operation = %OPERATION, error = %failure, "access request failed");
                        subscriber.fail(translate(OPERATION, failure));
                    }
                    None => {
                        debug!(operation = %OPERATION, granted, "access answered");
                        subscriber.send(granted);
                        subscriber.complete();
                    }
                }
            });

            // A panicking directory drops the completion, and the guard inside
            // it fails the subscription.
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| {
                directory.request_access(entity_type, completion)
            })) {
                error!(
                    operation = %OPERATION,
                    panic = %panic_message(payload.as_ref()),
                    "directory panicked"
                );
            }

            Cancellable::empty()
        })
        .named(OPERATION.as_str())
    }

    /// Fetches the contact with `identifier`, populating only `keys`.
    pub fn unified_contact(
        &self,
        identifier: impl Into<String>,
        keys: &[ContactKey],
    ) -> Publisher<Contact, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::UnifiedContact;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;
        let identifier = identifier.into();
        let keys = keys.to_vec();

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let identifier = identifier.clone();
            let keys = keys.clone();

            dispatcher.run(OPERATION, move |_| {
                debug!(
                    operation = %OPERATION,
                    contact = %mask_identifier(&identifier),
                    keys = keys.len(),
                    "fetching contact"
                );
                subscriber.resolve(guarded(OPERATION, || {
                    directory.unified_contact(&identifier, &keys)
                }));
            })
        })
        .named(OPERATION.as_str())
    }

    /// Fetches every contact matching `predicate`.
    pub fn unified_contacts(
        &self,
        predicate: ContactPredicate,
        keys: &[ContactKey],
    ) -> Publisher<Vec<Contact>, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::UnifiedContacts;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;
        let keys = keys.to_vec();

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let predicate = predicate.clone();
            let keys = keys.clone();

            dispatcher.run(OPERATION, move |_| {
                emit_collection(
                    &subscriber,
                    guarded(OPERATION, || directory.unified_contacts(&predicate, &keys)),
                );
            })
        })
        .named(OPERATION.as_str())
    }

    /// Fetches groups matching `predicate`, or every group for `None`.
    pub fn groups(&self, predicate: Option<GroupPredicate>) -> Publisher<Vec<Group>, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::Groups;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let predicate = predicate.clone();

            dispatcher.run(OPERATION, move |_| {
                emit_collection(
                    &subscriber,
                    guarded(OPERATION, || directory.groups(predicate.as_ref())),
                );
            })
        })
        .named(OPERATION.as_str())
    }

    /// Fetches containers matching `predicate`, or every container for `None`.
    pub fn containers(
        &self,
        predicate: Option<ContainerPredicate>,
    ) -> Publisher<Vec<Container>, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::Containers;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let predicate = predicate.clone();

            dispatcher.run(OPERATION, move |_| {
                emit_collection(
                    &subscriber,
                    guarded(OPERATION, || directory.containers(predicate.as_ref())),
                );
            })
        })
        .named(OPERATION.as_str())
    }

    /// Emits each contact matching `request`, in the directory's order.
    ///
    /// Cancelling stops the scan at the next contact. Under
    /// [`DispatchMode::Blocking`] a stream reader paces the scan: the worker
    /// visits the next contact only once the reader asks for it.
    pub fn enumerate_contacts(&self, request: FetchRequest) -> Publisher<Contact, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::EnumerateContacts;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let request = request.clone();

            dispatcher.run(OPERATION, move |job| {
                let mut emitted = 0usize;
                let result = guarded(OPERATION, || {
                    directory.enumerate_contacts(&request, &mut |contact| {
                        if job.token.is_cancelled() || !subscriber.send(contact) {
                            return ControlFlow::Break(());
                        }
                        emitted += 1;
                        if job.may_block && !subscriber.wait_for_demand() {
                            return ControlFlow::Break(());
                        }
                        ControlFlow::Continue(())
                    })
                });

                match result {
                    Ok(()) => {
                        debug!(
                            operation = %OPERATION,
                            emitted,
                            cancelled = subscriber.is_cancelled(),
                            "enumeration finished"
                        );
                        subscriber.complete();
                    }
                    Err(error) => subscriber.fail(error),
                }
            })
        })
        .named(OPERATION.as_str())
    }

    /// Applies `request`, emitting `()` once it succeeds.
    ///
    /// A failed save fails the publisher with [`ContactError::SaveRequest`]
    /// under [`SaveFailurePolicy::Surface`]. Under
    /// [`SaveFailurePolicy::Complete`] it is logged and the publisher
    /// completes without a value.
    pub fn execute(&self, request: SaveRequest) -> Publisher<(), ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::Execute;
        let directory = Arc::clone(&self.directory);
        let dispatcher = self.dispatcher;
        let policy = self.save_failure_policy;

        let mut request = request;
        if request.transaction_author.is_none() {
            request.transaction_author = self.transaction_author.clone();
        }

        Publisher::create(move |subscriber| {
            let directory = Arc::clone(&directory);
            let request = request.clone();

            dispatcher.run(OPERATION, move |_| {
                debug!(
                    operation = %OPERATION,
                    operations = request.operations().len(),
                    "executing save request"
                );

                match guarded(OPERATION, || directory.execute(&request)) {
                    Ok(()) => {
                        subscriber.send(());
                        subscriber.complete();
                    }
                    Err(ContactError::SaveRequest(cause))
                        if policy == SaveFailurePolicy::Complete =>
                    {
                        warn!(
                            operation = %OPERATION,
                            error = %cause,
                            "save request failed, completing without acknowledgement"
                        );
                        subscriber.complete();
                    }
                    Err(error) => subscriber.fail(error),
                }
            })
        })
        .named(OPERATION.as_str())
    }

    /// Emits a [`DirectoryChange`] for every change the directory reports.
    ///
    /// Runs until cancelled, or until the directory closes its stream.
    /// Requires a running async runtime at subscription time.
    pub fn changes(&self) -> Publisher<DirectoryChange, ContactError> {
        const OPERATION: DirectoryOperation = DirectoryOperation::ObserveChanges;
        let directory = Arc::clone(&self.directory);

        Publisher::create(move |subscriber| {
            let mut stream = match guarded(OPERATION, || directory.change_notifications()) {
                Ok(stream) => stream,
                Err(error) => {
                    subscriber.fail(error);
                    return Cancellable::empty();
                }
            };

            let Some(handle) = runtime::current() else {
                subscriber.fail(translate(
                    OPERATION,
                    DirectoryError::NotAvailable(
                        "change observation requires a running async runtime".to_string(),
                    ),
                ));
                return Cancellable::empty();
            };

            debug!(operation = %OPERATION, "observing directory changes");
            let task = handle.spawn(async move {
                while let Some(change) = stream.next().await {
                    if !subscriber.send(change) {
                        return;
                    }
                }
                debug!(operation = %OPERATION, "directory closed its change stream");
                subscriber.complete();
            });

            Cancellable::from(task.abort_handle())
        })
        .named(OPERATION.as_str())
    }
}

/// Where a subscription's directory call runs.
#[derive(Debug, Clone, Copy)]
struct Dispatcher {
    mode: DispatchMode,
}

/// What a dispatched job knows about where it runs.
struct Job {
    /// Cancelled by the subscription's release hook.
    token: CancellationToken,
    /// Set on a blocking-pool worker, where waiting for the reader is allowed.
    may_block: bool,
}

impl Dispatcher {
    /// Runs `job` and returns the hook that cancels its token.
    ///
    /// A blocking-pool job whose token is cancelled before a worker picks it
    /// up never runs.
    fn run<F>(self, operation: DirectoryOperation, job: F) -> Cancellable
    where
        F: FnOnce(Job) + Send + 'static,
    {
        let token = CancellationToken::new();
        let job_token = token.clone();

        match (self.mode, runtime::current()) {
            (DispatchMode::Blocking, Some(handle)) => {
                debug!(operation = %operation, "dispatching to blocking pool");
                handle.spawn_blocking(move || {
                    if job_token.is_cancelled() {
                        debug!(operation = %operation, "cancelled before a worker picked it up");
                        return;
                    }
                    job(Job {
                        token: job_token,
                        may_block: true,
                    });
                });
            }
            (DispatchMode::Blocking, None) => {
                debug!(operation = %operation, "no runtime for blocking dispatch, running inline");
                job(Job {
                    token: job_token,
                    may_block: false,
                });
            }
            (DispatchMode::Inline, _) => job(Job {
                token: job_token,
                may_block: false,
            }),
        }

        Cancellable::from(token)
    }
}

/// Runs a directory call, translating its failure or panic.
fn guarded<T, F>(operation: DirectoryOperation, call: F) -> Result<T, ContactError>
where
    F: FnOnce() -> DirectoryResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(failure)) => {
            warn!(operation = %operation, error = %failure, "directory operation failed");
            Err(translate(operation, failure))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(operation = %operation, panic = %message, "directory panicked");
            Err(unknown(format!("directory panicked during {}: {}", operation, message)))
        }
    }
}

fn emit_collection<T>(
    subscriber: &Subscriber<Vec<T>, ContactError>,
    result: Result<Vec<T>, ContactError>,
) where
    T: Send + 'static,
{
    match result {
        Ok(items) if items.is_empty() => subscriber.complete(),
        Ok(items) => {
            subscriber.send(items);
            subscriber.complete();
        }
        Err(error) => subscriber.fail(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn run_capturing(mode: DispatchMode) -> (Cancellable, Option<(CancellationToken, bool)>) {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let release = Dispatcher { mode }.run(DirectoryOperation::Groups, move |job| {
            *slot.lock().unwrap() = Some((job.token, job.may_block));
        });
        let seen = seen.lock().unwrap().take();
        (release, seen)
    }

    #[test]
    fn test_release_cancels_the_job_token() {
        let (release, seen) = run_capturing(DispatchMode::Inline);
        let (token, may_block) = seen.expect("inline job runs before run returns");
        assert!(!may_block);
        assert!(!token.is_cancelled());

        release.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_blocking_without_runtime_runs_inline() {
        let (release, seen) = run_capturing(DispatchMode::Blocking);
        let (token, may_block) = seen.expect("job runs on the calling thread");
        assert!(!may_block);

        release.cancel();
        assert!(token.is_cancelled());
    }

    #[core_async::test(flavor = "multi_thread")]
    async fn test_blocking_job_may_wait() {
        let (job_tx, job_rx) = core_async::sync::oneshot::channel();
        let _release = Dispatcher {
            mode: DispatchMode::Blocking,
        }
        .run(DirectoryOperation::Groups, move |job| {
            let _ = job_tx.send(job.may_block);
        });

        assert!(job_rx.await.unwrap());
    }
}
