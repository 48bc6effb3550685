//! In-memory [`ContactDirectory`] implementation.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bridge_traits::{
    error::Result, AccessCompletion, Clock, Contact, ContactDirectory, ContactKey,
    ContactPredicate, Container, ContainerPredicate, DirectoryChange, DirectoryChangeStream,
    EntityType, FetchRequest, Group, GroupPredicate, SaveRequest, SystemClock,
};
use core_async::sync::broadcast;
use tracing::{debug, warn};

use crate::access::{respond, AccessPrompt};
use crate::changes::BroadcastChangeStream;
use crate::store::Store;

const CHANGE_CAPACITY: usize = 64;

struct AccessSettings {
    prompt: AccessPrompt,
    delay: Option<Duration>,
}

/// Contact directory held entirely in process memory
///
/// Provides a complete, deterministic host for tests and demos:
/// - Insertion-ordered contacts, groups and containers
/// - Key projection on every fetch
/// - Atomic save requests (all operations apply or none do)
/// - Change notifications for every applied save request
/// - A scripted permission prompt, optionally answered after a delay
///
/// Seeding methods (`insert_container`, `seed`) do not emit change
/// notifications; `execute` does.
///
/// # Example
///
/// ```
/// use bridge_memory::{AccessPrompt, InMemoryDirectory};
/// use bridge_traits::{Contact, ContactDirectory, ContactKey, SaveRequest};
///
/// let directory = InMemoryDirectory::new();
/// directory
///     .seed(SaveRequest::new().add_contact(Contact::new("123").with_given_name("Ann"), None))
///     .unwrap();
/// directory.set_access_prompt(AccessPrompt::Deny);
///
/// let ann = directory.unified_contact("123", &[ContactKey::GivenName]).unwrap();
/// assert_eq!(ann.given_name, "Ann");
/// ```
pub struct InMemoryDirectory {
    store: Mutex<Store>,
    access: Mutex<AccessSettings>,
    changes: broadcast::Sender<DirectoryChange>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDirectory {
    /// Create an empty directory that grants access immediately
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty directory stamping changes with `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            store: Mutex::new(Store::default()),
            access: Mutex::new(AccessSettings {
                prompt: AccessPrompt::default(),
                delay: None,
            }),
            changes,
            clock,
        }
    }

    /// Script the answer to subsequent access requests
    pub fn set_access_prompt(&self, prompt: AccessPrompt) {
        self.lock_access().prompt = prompt;
    }

    /// Answer access requests after `delay` instead of inline
    pub fn set_access_delay(&self, delay: Option<Duration>) {
        self.lock_access().delay = delay;
    }

    /// Add or replace a container
    pub fn insert_container(&self, container: Container) {
        self.lock_store().insert_container(container);
    }

    /// Apply `request` without notifying change observers
    pub fn seed(&self, request: SaveRequest) -> Result<()> {
        self.lock_store().apply(&request).map(|_| ())
    }

    pub fn contact_count(&self) -> usize {
        self.lock_store().contact_count()
    }

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_access(&self) -> MutexGuard<'_, AccessSettings> {
        self.access.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactDirectory for InMemoryDirectory {
    fn request_access(&self, entity_type: EntityType, completion: AccessCompletion) {
        let (prompt, delay) = {
            let access = self.lock_access();
            (access.prompt.clone(), access.delay)
        };

        debug!(?entity_type, ?prompt, "access requested");
        respond(prompt, delay, completion);
    }

    fn unified_contact(&self, identifier: &str, keys: &[ContactKey]) -> Result<Contact> {
        self.lock_store().unified_contact(identifier, keys)
    }

    fn unified_contacts(
        &self,
        predicate: &ContactPredicate,
        keys: &[ContactKey],
    ) -> Result<Vec<Contact>> {
        self.lock_store().unified_contacts(predicate, keys)
    }

    fn groups(&self, predicate: Option<&GroupPredicate>) -> Result<Vec<Group>> {
        self.lock_store().groups(predicate)
    }

    fn containers(&self, predicate: Option<&ContainerPredicate>) -> Result<Vec<Container>> {
        self.lock_store().containers(predicate)
    }

    fn enumerate_contacts(
        &self,
        request: &FetchRequest,
        visitor: &mut dyn FnMut(Contact) -> ControlFlow<()>,
    ) -> Result<()> {
        // The visitor may call back into the directory.
        let snapshot = self.lock_store().snapshot(request)?;
        let total = snapshot.len();

        for (visited, contact) in snapshot.into_iter().enumerate() {
            if visitor(contact).is_break() {
                debug!(visited = visited + 1, total, "enumeration stopped early");
                break;
            }
        }

        Ok(())
    }

    fn execute(&self, request: &SaveRequest) -> Result<()> {
        let applied = self.lock_store().apply(request);
        let changes = match applied {
            Ok(changes) => changes,
            Err(error) => {
                warn!(error = %error, operations = request.operations().len(), "save request rejected");
                return Err(error);
            }
        };

        if changes.is_empty() {
            return Ok(());
        }

        let change = DirectoryChange {
            changed_at: self.clock.now(),
            contact_identifiers: changes.contacts,
            group_identifiers: changes.groups,
            transaction_author: request.transaction_author.clone(),
        };

        // No receivers is not an error.
        let _ = self.changes.send(change);
        Ok(())
    }

    fn change_notifications(&self) -> Result<Box<dyn DirectoryChangeStream>> {
        Ok(Box::new(BroadcastChangeStream::new(
            self.changes.subscribe(),
        )))
    }
}
