//! Mapping from directory failures to [`ContactError`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use bridge_traits::DirectoryError;
use core_publisher::Subscriber;
use tracing::warn;

use crate::error::{ContactError, ContactErrorKind};

/// Facade operations, each with its own error tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOperation {
    RequestAccess,
    UnifiedContact,
    UnifiedContacts,
    Groups,
    Containers,
    EnumerateContacts,
    Execute,
    ObserveChanges,
}

impl DirectoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryOperation::RequestAccess => "request_access",
            DirectoryOperation::UnifiedContact => "unified_contact",
            DirectoryOperation::UnifiedContacts => "unified_contacts",
            DirectoryOperation::Groups => "groups",
            DirectoryOperation::Containers => "containers",
            DirectoryOperation::EnumerateContacts => "enumerate_contacts",
            DirectoryOperation::Execute => "execute",
            DirectoryOperation::ObserveChanges => "changes",
        }
    }

    pub fn error_kind(&self) -> ContactErrorKind {
        match self {
            DirectoryOperation::RequestAccess => ContactErrorKind::AccessDenied,
            DirectoryOperation::UnifiedContact => ContactErrorKind::Lookup,
            DirectoryOperation::UnifiedContacts => ContactErrorKind::PredicateLookup,
            DirectoryOperation::Groups => ContactErrorKind::GroupsQuery,
            DirectoryOperation::Containers => ContactErrorKind::ContainersQuery,
            DirectoryOperation::EnumerateContacts => ContactErrorKind::Enumeration,
            DirectoryOperation::Execute => ContactErrorKind::SaveRequest,
            DirectoryOperation::ObserveChanges => ContactErrorKind::ChangeObservation,
        }
    }
}

impl fmt::Display for DirectoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags `error` with the operation it came from.
pub fn translate(operation: DirectoryOperation, error: DirectoryError) -> ContactError {
    match operation {
        DirectoryOperation::RequestAccess => ContactError::AccessDenied(error),
        DirectoryOperation::UnifiedContact => ContactError::Lookup(error),
        DirectoryOperation::UnifiedContacts => ContactError::PredicateLookup(error),
        DirectoryOperation::Groups => ContactError::GroupsQuery(error),
        DirectoryOperation::Containers => ContactError::ContainersQuery(error),
        DirectoryOperation::EnumerateContacts => ContactError::Enumeration(error),
        DirectoryOperation::Execute => ContactError::SaveRequest(error),
        DirectoryOperation::ObserveChanges => ContactError::ChangeObservation(error),
    }
}

/// Fallback tag for failures that are not directory errors.
pub fn unknown<C>(cause: C) -> ContactError
where
    C: Into<Box<dyn StdError + Send + Sync>>,
{
    ContactError::Unknown(Arc::from(cause.into()))
}

/// Carries the subscriber into a directory callback.
///
/// Dropped without [`resolve`](CallbackGuard::resolve), it fails the
/// subscription with [`ContactError::Unknown`] so the consumer never waits on
/// a callback that will not come.
pub(crate) struct CallbackGuard<T>
where
    T: Send + 'static,
{
    operation: DirectoryOperation,
    subscriber: Option<Subscriber<T, ContactError>>,
}

impl<T> CallbackGuard<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(operation: DirectoryOperation, subscriber: Subscriber<T, ContactError>) -> Self {
        Self {
            operation,
            subscriber: Some(subscriber),
        }
    }

    /// Disarms the guard and hands back the subscriber.
    pub(crate) fn resolve(mut self) -> Option<Subscriber<T, ContactError>> {
        self.subscriber.take()
    }
}

impl<T> Drop for CallbackGuard<T>
where
    T: Send + 'static,
{
    fn drop(&mut self) {
        if let Some(subscriber) = self.subscriber.take() {
            warn!(
                operation = %self.operation,
                "directory dropped its callback without calling it"
            );
            subscriber.fail(unknown(format!(
                "{} callback was dropped without being called",
                self.operation
            )));
        }
    }
}
