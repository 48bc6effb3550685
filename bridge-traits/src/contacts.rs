//! Contact Directory Data Types
//!
//! Native value types exchanged with a [`ContactDirectory`](crate::directory::ContactDirectory).
//! They describe records, groups, containers and the requests the core
//! forwards to the host; their storage semantics belong to the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of entity an access request is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Contacts,
}

/// Property of a contact that can be requested when fetching
///
/// Only requested keys are populated on fetched contacts. The identifier is
/// always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactKey {
    GivenName,
    FamilyName,
    Nickname,
    OrganizationName,
    JobTitle,
    EmailAddresses,
    PhoneNumbers,
    Note,
}

impl ContactKey {
    /// Every key, in declaration order
    pub const ALL: [ContactKey; 8] = [
        ContactKey::GivenName,
        ContactKey::FamilyName,
        ContactKey::Nickname,
        ContactKey::OrganizationName,
        ContactKey::JobTitle,
        ContactKey::EmailAddresses,
        ContactKey::PhoneNumbers,
        ContactKey::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKey::GivenName => "givenName",
            ContactKey::FamilyName => "familyName",
            ContactKey::Nickname => "nickname",
            ContactKey::OrganizationName => "organizationName",
            ContactKey::JobTitle => "jobTitle",
            ContactKey::EmailAddresses => "emailAddresses",
            ContactKey::PhoneNumbers => "phoneNumbers",
            ContactKey::Note => "note",
        }
    }
}

/// A value with an optional label such as "home" or "work"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: Option<String>,
    pub value: String,
}

impl LabeledValue {
    pub fn new(label: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            label: label.map(str::to_string),
            value: value.into(),
        }
    }
}

/// A contact record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub identifier: String,
    pub given_name: String,
    pub family_name: String,
    pub nickname: String,
    pub organization_name: String,
    pub job_title: String,
    pub email_addresses: Vec<LabeledValue>,
    pub phone_numbers: Vec<LabeledValue>,
    pub note: String,
    /// Keys that were fetched for this instance
    pub fetched_keys: BTreeSet<ContactKey>,
}

impl Contact {
    /// Create an empty contact with every key available
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            given_name: String::new(),
            family_name: String::new(),
            nickname: String::new(),
            organization_name: String::new(),
            job_title: String::new(),
            email_addresses: Vec::new(),
            phone_numbers: Vec::new(),
            note: String::new(),
            fetched_keys: ContactKey::ALL.into_iter().collect(),
        }
    }

    pub fn with_given_name(mut self, name: impl Into<String>) -> Self {
        self.given_name = name.into();
        self
    }

    pub fn with_family_name(mut self, name: impl Into<String>) -> Self {
        self.family_name = name.into();
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization_name = organization.into();
        self
    }

    pub fn with_job_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = title.into();
        self
    }

    pub fn with_email(mut self, label: Option<&str>, address: impl Into<String>) -> Self {
        self.email_addresses.push(LabeledValue::new(label, address));
        self
    }

    pub fn with_phone(mut self, label: Option<&str>, number: impl Into<String>) -> Self {
        self.phone_numbers.push(LabeledValue::new(label, number));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Whether `key` was fetched for this instance
    pub fn is_key_available(&self, key: ContactKey) -> bool {
        self.fetched_keys.contains(&key)
    }

    /// Given and family name joined by a space, skipping empty parts
    pub fn full_name(&self) -> String {
        [self.given_name.as_str(), self.family_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Copy of this contact with only `keys` populated
    ///
    /// Properties that are not requested are cleared, matching how a real
    /// directory returns partially fetched records.
    pub fn projected(&self, keys: &[ContactKey]) -> Contact {
        let wanted: BTreeSet<ContactKey> = keys
            .iter()
            .copied()
            .filter(|key| self.fetched_keys.contains(key))
            .collect();
        let keep = |key: ContactKey| wanted.contains(&key);

        Contact {
            identifier: self.identifier.clone(),
            given_name: keep(ContactKey::GivenName)
                .then(|| self.given_name.clone())
                .unwrap_or_default(),
            family_name: keep(ContactKey::FamilyName)
                .then(|| self.family_name.clone())
                .unwrap_or_default(),
            nickname: keep(ContactKey::Nickname)
                .then(|| self.nickname.clone())
                .unwrap_or_default(),
            organization_name: keep(ContactKey::OrganizationName)
                .then(|| self.organization_name.clone())
                .unwrap_or_default(),
            job_title: keep(ContactKey::JobTitle)
                .then(|| self.job_title.clone())
                .unwrap_or_default(),
            email_addresses: keep(ContactKey::EmailAddresses)
                .then(|| self.email_addresses.clone())
                .unwrap_or_default(),
            phone_numbers: keep(ContactKey::PhoneNumbers)
                .then(|| self.phone_numbers.clone())
                .unwrap_or_default(),
            note: keep(ContactKey::Note)
                .then(|| self.note.clone())
                .unwrap_or_default(),
            fetched_keys: wanted,
        }
    }
}

/// A named group of contacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub identifier: String,
    pub name: String,
}

impl Group {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

/// Account or source a container syncs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerType {
    Unassigned,
    Local,
    Exchange,
    CardDav,
}

/// A container holding contacts and groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub identifier: String,
    pub name: String,
    pub container_type: ContainerType,
}

impl Container {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        container_type: ContainerType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            container_type,
        }
    }
}

/// Selects contacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPredicate {
    /// Case-insensitive substring match on any name property
    MatchingName(String),
    WithIdentifiers(Vec<String>),
    MatchingEmailAddress(String),
    MatchingPhoneNumber(String),
    InGroup(String),
    InContainer(String),
}

/// Selects groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupPredicate {
    WithIdentifiers(Vec<String>),
    InContainer(String),
}

/// Selects containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerPredicate {
    WithIdentifiers(Vec<String>),
    OfContact(String),
    OfGroup(String),
}

/// Order of results produced by an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// The directory's native order
    #[default]
    None,
    UserDefault,
    GivenName,
    FamilyName,
}

/// Describes an enumeration of contacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub keys: Vec<ContactKey>,
    pub predicate: Option<ContactPredicate>,
    pub sort_order: SortOrder,
    pub unify_results: bool,
}

impl FetchRequest {
    pub fn new(keys: impl Into<Vec<ContactKey>>) -> Self {
        Self {
            keys: keys.into(),
            predicate: None,
            sort_order: SortOrder::None,
            unify_results: true,
        }
    }

    pub fn with_predicate(mut self, predicate: ContactPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_unify_results(mut self, unify: bool) -> Self {
        self.unify_results = unify;
        self
    }
}

/// A single mutation inside a [`SaveRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOperation {
    AddContact {
        contact: Contact,
        container_identifier: Option<String>,
    },
    UpdateContact(Contact),
    DeleteContact {
        identifier: String,
    },
    AddGroup {
        group: Group,
        container_identifier: Option<String>,
    },
    UpdateGroup(Group),
    DeleteGroup {
        identifier: String,
    },
    AddMember {
        contact_identifier: String,
        group_identifier: String,
    },
    RemoveMember {
        contact_identifier: String,
        group_identifier: String,
    },
}

/// Batch of mutations applied by [`ContactDirectory::execute`](crate::directory::ContactDirectory::execute)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    operations: Vec<SaveOperation>,
    pub transaction_author: Option<String>,
}

impl SaveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contact(mut self, contact: Contact, container_identifier: Option<&str>) -> Self {
        self.operations.push(SaveOperation::AddContact {
            contact,
            container_identifier: container_identifier.map(str::to_string),
        });
        self
    }

    pub fn update_contact(mut self, contact: Contact) -> Self {
        self.operations.push(SaveOperation::UpdateContact(contact));
        self
    }

    pub fn delete_contact(mut self, identifier: impl Into<String>) -> Self {
        self.operations.push(SaveOperation::DeleteContact {
            identifier: identifier.into(),
        });
        self
    }

    pub fn add_group(mut self, group: Group, container_identifier: Option<&str>) -> Self {
        self.operations.push(SaveOperation::AddGroup {
            group,
            container_identifier: container_identifier.map(str::to_string),
        });
        self
    }

    pub fn update_group(mut self, group: Group) -> Self {
        self.operations.push(SaveOperation::UpdateGroup(group));
        self
    }

    pub fn delete_group(mut self, identifier: impl Into<String>) -> Self {
        self.operations.push(SaveOperation::DeleteGroup {
            identifier: identifier.into(),
        });
        self
    }

    pub fn add_member(
        mut self,
        contact_identifier: impl Into<String>,
        group_identifier: impl Into<String>,
    ) -> Self {
        self.operations.push(SaveOperation::AddMember {
            contact_identifier: contact_identifier.into(),
            group_identifier: group_identifier.into(),
        });
        self
    }

    pub fn remove_member(
        mut self,
        contact_identifier: impl Into<String>,
        group_identifier: impl Into<String>,
    ) -> Self {
        self.operations.push(SaveOperation::RemoveMember {
            contact_identifier: contact_identifier.into(),
            group_identifier: group_identifier.into(),
        });
        self
    }

    pub fn with_transaction_author(mut self, author: impl Into<String>) -> Self {
        self.transaction_author = Some(author.into());
        self
    }

    pub fn operations(&self) -> &[SaveOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Notification that the directory's contents changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryChange {
    pub changed_at: DateTime<Utc>,
    pub contact_identifiers: Vec<String>,
    pub group_identifiers: Vec<String>,
    pub transaction_author: Option<String>,
}
