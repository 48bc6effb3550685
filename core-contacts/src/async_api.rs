//! Await-style counterparts of the publisher operations.
//!
//! Each method subscribes once, waits for the first outcome and drops the
//! subscription. Enumeration is the exception: it gathers every contact.
//!
//! A subscription that closes without a terminal signal resolves to
//! [`ContactError::Unknown`], never to an empty result.

use bridge_traits::{
    Contact, ContactKey, ContactPredicate, Container, ContainerPredicate, EntityType,
    FetchRequest, Group, GroupPredicate, SaveRequest,
};

use crate::error::{ContactError, Result};
use crate::service::ContactsService;
use crate::translate::{unknown, DirectoryOperation};

impl ContactsService {
    pub async fn request_access_async(&self, entity_type: EntityType) -> Result<bool> {
        required(
            DirectoryOperation::RequestAccess,
            self.request_access(entity_type).first().await,
        )
    }

    pub async fn unified_contact_async(
        &self,
        identifier: impl Into<String>,
        keys: &[ContactKey],
    ) -> Result<Contact> {
        required(
            DirectoryOperation::UnifiedContact,
            self.unified_contact(identifier, keys).first().await,
        )
    }

    /// Contacts matching `predicate`; empty when nothing matched.
    pub async fn unified_contacts_async(
        &self,
        predicate: ContactPredicate,
        keys: &[ContactKey],
    ) -> Result<Vec<Contact>> {
        Ok(self
            .unified_contacts(predicate, keys)
            .first()
            .await?
            .unwrap_or_default())
    }

    /// Groups matching `predicate`; empty when nothing matched.
    pub async fn groups_async(&self, predicate: Option<GroupPredicate>) -> Result<Vec<Group>> {
        Ok(self.groups(predicate).first().await?.unwrap_or_default())
    }

    /// Containers matching `predicate`; empty when nothing matched.
    pub async fn containers_async(
        &self,
        predicate: Option<ContainerPredicate>,
    ) -> Result<Vec<Container>> {
        Ok(self.containers(predicate).first().await?.unwrap_or_default())
    }

    /// Every contact matching `request`, in the directory's order.
    pub async fn enumerate_contacts_async(&self, request: FetchRequest) -> Result<Vec<Contact>> {
        self.enumerate_contacts(request).collect().await
    }

    /// Resolves once the save request finished.
    ///
    /// A failure swallowed by [`SaveFailurePolicy::Complete`](core_runtime::SaveFailurePolicy::Complete)
    /// resolves to `Ok(())` as well.
    pub async fn execute_async(&self, request: SaveRequest) -> Result<()> {
        self.execute(request).first().await.map(|_| ())
    }
}

fn required<T>(operation: DirectoryOperation, outcome: Result<Option<T>>) -> Result<T> {
    outcome?.ok_or_else(|| missing_value(operation))
}

fn missing_value(operation: DirectoryOperation) -> ContactError {
    unknown(format!("{} completed without a value", operation))
}
