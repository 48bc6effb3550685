//! Contact Directory Capability
//!
//! The host-side contact store the core adapts into publishers. Every
//! operation is either synchronous and fallible or callback based.

use std::ops::ControlFlow;

use crate::{
    contacts::{
        Contact, ContactKey, ContactPredicate, Container, ContainerPredicate, DirectoryChange,
        EntityType, FetchRequest, Group, GroupPredicate, SaveRequest,
    },
    error::{DirectoryError, Result},
};

/// Completion callback for [`ContactDirectory::request_access`]
///
/// Invoked at most once with `(granted, error)`. A denial without an error is
/// `(false, None)`; an exceptional failure carries `Some(error)`.
pub type AccessCompletion = Box<dyn FnOnce(bool, Option<DirectoryError>) + Send + 'static>;

/// Contact directory trait
///
/// Abstracts the platform contact store:
/// - **iOS / macOS**: Contacts framework
/// - **Android**: ContactsContract provider
/// - **Desktop**: CardDAV or address-book services
/// - **Tests**: `bridge_memory::InMemoryDirectory`
///
/// # Threading
///
/// Synchronous methods may block; the core decides whether to call them on
/// the subscribing thread or on a blocking worker. `request_access` may invoke
/// its completion on any thread, possibly long after returning (for example
/// once the user answers a permission prompt).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::{ContactDirectory, ContactKey};
///
/// fn display_name(directory: &dyn ContactDirectory, id: &str) -> Option<String> {
///     directory
///         .unified_contact(id, &[ContactKey::GivenName, ContactKey::FamilyName])
///         .ok()
///         .map(|contact| contact.full_name())
/// }
/// ```
pub trait ContactDirectory: Send + Sync {
    /// Ask the user for access to `entity_type`
    fn request_access(&self, entity_type: EntityType, completion: AccessCompletion);

    /// Fetch the unified contact with `identifier`, populating only `keys`
    fn unified_contact(&self, identifier: &str, keys: &[ContactKey]) -> Result<Contact>;

    /// Fetch every unified contact matching `predicate`
    fn unified_contacts(
        &self,
        predicate: &ContactPredicate,
        keys: &[ContactKey],
    ) -> Result<Vec<Contact>>;

    /// Fetch groups matching `predicate`, or all groups for `None`
    fn groups(&self, predicate: Option<&GroupPredicate>) -> Result<Vec<Group>>;

    /// Fetch containers matching `predicate`, or all containers for `None`
    fn containers(&self, predicate: Option<&ContainerPredicate>) -> Result<Vec<Container>>;

    /// Visit every contact matching `request` in the directory's order
    ///
    /// The scan stops early when `visitor` returns `ControlFlow::Break`.
    fn enumerate_contacts(
        &self,
        request: &FetchRequest,
        visitor: &mut dyn FnMut(Contact) -> ControlFlow<()>,
    ) -> Result<()>;

    /// Apply every operation in `request`
    fn execute(&self, request: &SaveRequest) -> Result<()>;

    /// Subscribe to store change notifications
    ///
    /// Directories that cannot report changes keep the default, which fails
    /// with [`DirectoryError::NotAvailable`].
    fn change_notifications(&self) -> Result<Box<dyn DirectoryChangeStream>> {
        Err(DirectoryError::NotAvailable(
            "change notifications are not supported by this directory".to_string(),
        ))
    }
}

/// Stream of directory change notifications
#[async_trait::async_trait]
pub trait DirectoryChangeStream: Send {
    /// Get the next change
    ///
    /// Returns `None` when the directory closes the stream.
    async fn next(&mut self) -> Option<DirectoryChange>;
}
