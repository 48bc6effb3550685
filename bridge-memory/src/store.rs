//! Record storage and query evaluation behind [`InMemoryDirectory`](crate::InMemoryDirectory).

use std::collections::BTreeSet;

use bridge_traits::{
    error::Result, Contact, ContactKey, ContactPredicate, Container, ContainerPredicate,
    DirectoryError, FetchRequest, Group, GroupPredicate, SaveOperation, SaveRequest, SortOrder,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredContact {
    contact: Contact,
    container: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredGroup {
    group: Group,
    container: Option<String>,
}

/// Identifiers touched by one applied save request.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ChangeSet {
    pub contacts: Vec<String>,
    pub groups: Vec<String>,
}

impl ChangeSet {
    fn touch_contact(&mut self, identifier: &str) {
        if !self.contacts.iter().any(|id| id == identifier) {
            self.contacts.push(identifier.to_string());
        }
    }

    fn touch_group(&mut self, identifier: &str) {
        if !self.groups.iter().any(|id| id == identifier) {
            self.groups.push(identifier.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.groups.is_empty()
    }
}

/// Insertion-ordered records plus group memberships.
#[derive(Debug, Clone, Default)]
pub(crate) struct Store {
    contacts: Vec<StoredContact>,
    groups: Vec<StoredGroup>,
    containers: Vec<Container>,
    /// (group, contact)
    members: BTreeSet<(String, String)>,
}

pub(crate) fn new_identifier() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

impl Store {
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn insert_container(&mut self, container: Container) {
        self.containers
            .retain(|existing| existing.identifier != container.identifier);
        self.containers.push(container);
    }

    pub fn unified_contact(&self, identifier: &str, keys: &[ContactKey]) -> Result<Contact> {
        self.find_contact(identifier)
            .map(|stored| stored.contact.projected(keys))
            .ok_or_else(|| DirectoryError::not_found(identifier))
    }

    pub fn unified_contacts(
        &self,
        predicate: &ContactPredicate,
        keys: &[ContactKey],
    ) -> Result<Vec<Contact>> {
        Ok(self
            .matching(Some(predicate))?
            .into_iter()
            .map(|stored| stored.contact.projected(keys))
            .collect())
    }

    /// Contacts for an enumeration, already sorted and projected.
    pub fn snapshot(&self, request: &FetchRequest) -> Result<Vec<Contact>> {
        let mut matched = self.matching(request.predicate.as_ref())?;

        match request.sort_order {
            SortOrder::None => {}
            SortOrder::GivenName => matched.sort_by(|a, b| {
                (&a.contact.given_name, &a.contact.family_name)
                    .cmp(&(&b.contact.given_name, &b.contact.family_name))
            }),
            SortOrder::FamilyName | SortOrder::UserDefault => matched.sort_by(|a, b| {
                (&a.contact.family_name, &a.contact.given_name)
                    .cmp(&(&b.contact.family_name, &b.contact.given_name))
            }),
        }

        Ok(matched
            .into_iter()
            .map(|stored| stored.contact.projected(&request.keys))
            .collect())
    }

    pub fn groups(&self, predicate: Option<&GroupPredicate>) -> Result<Vec<Group>> {
        let selected: Vec<&StoredGroup> = match predicate {
            None => self.groups.iter().collect(),
            Some(GroupPredicate::WithIdentifiers(ids)) => self
                .groups
                .iter()
                .filter(|stored| ids.contains(&stored.group.identifier))
                .collect(),
            Some(GroupPredicate::InContainer(container)) => {
                self.require_container(container)?;
                self.groups
                    .iter()
                    .filter(|stored| stored.container.as_deref() == Some(container.as_str()))
                    .collect()
            }
        };

        Ok(selected.into_iter().map(|stored| stored.group.clone()).collect())
    }

    pub fn containers(&self, predicate: Option<&ContainerPredicate>) -> Result<Vec<Container>> {
        let owner = match predicate {
            None => return Ok(self.containers.clone()),
            Some(ContainerPredicate::WithIdentifiers(ids)) => {
                return Ok(self
                    .containers
                    .iter()
                    .filter(|container| ids.contains(&container.identifier))
                    .cloned()
                    .collect())
            }
            Some(ContainerPredicate::OfContact(identifier)) => self
                .find_contact(identifier)
                .ok_or_else(|| DirectoryError::not_found(identifier))?
                .container
                .clone(),
            Some(ContainerPredicate::OfGroup(identifier)) => self
                .find_group(identifier)
                .ok_or_else(|| DirectoryError::not_found(identifier))?
                .container
                .clone(),
        };

        Ok(owner
            .and_then(|identifier| {
                self.containers
                    .iter()
                    .find(|container| container.identifier == identifier)
                    .cloned()
            })
            .into_iter()
            .collect())
    }

    /// Applies every operation or none of them.
    pub fn apply(&mut self, request: &SaveRequest) -> Result<ChangeSet> {
        let mut staged = self.clone();
        let mut changes = ChangeSet::default();

        for operation in request.operations() {
            staged.apply_operation(operation, &mut changes)?;
        }

        *self = staged;
        Ok(changes)
    }

    fn apply_operation(
        &mut self,
        operation: &SaveOperation,
        changes: &mut ChangeSet,
    ) -> Result<()> {
        match operation {
            SaveOperation::AddContact {
                contact,
                container_identifier,
            } => {
                if let Some(container) = container_identifier {
                    self.require_container(container)?;
                }

                let mut contact = contact.clone();
                if contact.identifier.is_empty() {
                    contact.identifier = new_identifier();
                } else if self.find_contact(&contact.identifier).is_some() {
                    return Err(DirectoryError::ValidationFailed(format!(
                        "contact {} already exists",
                        contact.identifier
                    )));
                }
                contact.fetched_keys = ContactKey::ALL.into_iter().collect();

                changes.touch_contact(&contact.identifier);
                self.contacts.push(StoredContact {
                    contact,
                    container: container_identifier.clone(),
                });
            }
            SaveOperation::UpdateContact(update) => {
                let stored = self
                    .contacts
                    .iter_mut()
                    .find(|stored| stored.contact.identifier == update.identifier)
                    .ok_or_else(|| DirectoryError::not_found(&update.identifier))?;
                merge_contact(&mut stored.contact, update);
                changes.touch_contact(&update.identifier);
            }
            SaveOperation::DeleteContact { identifier } => {
                let before = self.contacts.len();
                self.contacts
                    .retain(|stored| &stored.contact.identifier != identifier);
                if self.contacts.len() == before {
                    return Err(DirectoryError::not_found(identifier));
                }
                self.members.retain(|(_, contact)| contact != identifier);
                changes.touch_contact(identifier);
            }
            SaveOperation::AddGroup {
                group,
                container_identifier,
            } => {
                if group.name.trim().is_empty() {
                    return Err(DirectoryError::ValidationFailed(
                        "group name cannot be empty".to_string(),
                    ));
                }
                if let Some(container) = container_identifier {
                    self.require_container(container)?;
                }

                let mut group = group.clone();
                if group.identifier.is_empty() {
                    group.identifier = new_identifier();
                } else if self.find_group(&group.identifier).is_some() {
                    return Err(DirectoryError::ValidationFailed(format!(
                        "group {} already exists",
                        group.identifier
                    )));
                }

                changes.touch_group(&group.identifier);
                self.groups.push(StoredGroup {
                    group,
                    container: container_identifier.clone(),
                });
            }
            SaveOperation::UpdateGroup(update) => {
                if update.name.trim().is_empty() {
                    return Err(DirectoryError::ValidationFailed(
                        "group name cannot be empty".to_string(),
                    ));
                }
                let stored = self
                    .groups
                    .iter_mut()
                    .find(|stored| stored.group.identifier == update.identifier)
                    .ok_or_else(|| DirectoryError::not_found(&update.identifier))?;
                stored.group.name = update.name.clone();
                changes.touch_group(&update.identifier);
            }
            SaveOperation::DeleteGroup { identifier } => {
                let before = self.groups.len();
                self.groups.retain(|stored| &stored.group.identifier != identifier);
                if self.groups.len() == before {
                    return Err(DirectoryError::not_found(identifier));
                }
                self.members.retain(|(group, _)| group != identifier);
                changes.touch_group(identifier);
            }
            SaveOperation::AddMember {
                contact_identifier,
                group_identifier,
            } => {
                self.require_contact(contact_identifier)?;
                self.require_group(group_identifier)?;
                self.members
                    .insert((group_identifier.clone(), contact_identifier.clone()));
                changes.touch_contact(contact_identifier);
                changes.touch_group(group_identifier);
            }
            SaveOperation::RemoveMember {
                contact_identifier,
                group_identifier,
            } => {
                self.require_contact(contact_identifier)?;
                self.require_group(group_identifier)?;
                self.members
                    .remove(&(group_identifier.clone(), contact_identifier.clone()));
                changes.touch_contact(contact_identifier);
                changes.touch_group(group_identifier);
            }
        }

        Ok(())
    }

    fn matching(&self, predicate: Option<&ContactPredicate>) -> Result<Vec<&StoredContact>> {
        let Some(predicate) = predicate else {
            return Ok(self.contacts.iter().collect());
        };

        let selected = match predicate {
            ContactPredicate::MatchingName(name) => {
                let needle = name.trim().to_lowercase();
                if needle.is_empty() {
                    return Err(DirectoryError::InvalidPredicate(
                        "name to match cannot be empty".to_string(),
                    ));
                }
                self.contacts
                    .iter()
                    .filter(|stored| name_matches(&stored.contact, &needle))
                    .collect()
            }
            ContactPredicate::WithIdentifiers(ids) => self
                .contacts
                .iter()
                .filter(|stored| ids.contains(&stored.contact.identifier))
                .collect(),
            ContactPredicate::MatchingEmailAddress(address) => self
                .contacts
                .iter()
                .filter(|stored| {
                    stored
                        .contact
                        .email_addresses
                        .iter()
                        .any(|email| email.value.eq_ignore_ascii_case(address.trim()))
                })
                .collect(),
            ContactPredicate::MatchingPhoneNumber(number) => {
                let wanted = digits(number);
                if wanted.is_empty() {
                    return Err(DirectoryError::InvalidPredicate(format!(
                        "'{}' contains no digits",
                        number
                    )));
                }
                self.contacts
                    .iter()
                    .filter(|stored| {
                        stored
                            .contact
                            .phone_numbers
                            .iter()
                            .any(|phone| digits(&phone.value) == wanted)
                    })
                    .collect()
            }
            ContactPredicate::InGroup(group) => {
                self.require_group(group)?;
                self.contacts
                    .iter()
                    .filter(|stored| {
                        self.members
                            .contains(&(group.clone(), stored.contact.identifier.clone()))
                    })
                    .collect()
            }
            ContactPredicate::InContainer(container) => {
                self.require_container(container)?;
                self.contacts
                    .iter()
                    .filter(|stored| stored.container.as_deref() == Some(container.as_str()))
                    .collect()
            }
        };

        Ok(selected)
    }

    fn find_contact(&self, identifier: &str) -> Option<&StoredContact> {
        self.contacts
            .iter()
            .find(|stored| stored.contact.identifier == identifier)
    }

    fn find_group(&self, identifier: &str) -> Option<&StoredGroup> {
        self.groups
            .iter()
            .find(|stored| stored.group.identifier == identifier)
    }

    fn require_contact(&self, identifier: &str) -> Result<()> {
        self.find_contact(identifier)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::not_found(identifier))
    }

    fn require_group(&self, identifier: &str) -> Result<()> {
        self.find_group(identifier)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::not_found(identifier))
    }

    fn require_container(&self, identifier: &str) -> Result<()> {
        if self
            .containers
            .iter()
            .any(|container| container.identifier == identifier)
        {
            Ok(())
        } else {
            Err(DirectoryError::not_found(identifier))
        }
    }
}

fn name_matches(contact: &Contact, needle: &str) -> bool {
    [
        contact.full_name(),
        contact.nickname.clone(),
        contact.organization_name.clone(),
    ]
    .iter()
    .any(|candidate| candidate.to_lowercase().contains(needle))
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Overwrites only the properties `update` was fetched with.
fn merge_contact(stored: &mut Contact, update: &Contact) {
    for key in &update.fetched_keys {
        match key {
            ContactKey::GivenName => stored.given_name = update.given_name.clone(),
            ContactKey::FamilyName => stored.family_name = update.family_name.clone(),
            ContactKey::Nickname => stored.nickname = update.nickname.clone(),
            ContactKey::OrganizationName => {
                stored.organization_name = update.organization_name.clone()
            }
            ContactKey::JobTitle => stored.job_title = update.job_title.clone(),
            ContactKey::EmailAddresses => stored.email_addresses = update.email_addresses.clone(),
            ContactKey::PhoneNumbers => stored.phone_numbers = update.phone_numbers.clone(),
            ContactKey::Note => stored.note = update.note.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ContainerType;

    fn seeded() -> Store {
        let mut store = Store::default();
        store.insert_container(Container::new("local", "On My Device", ContainerType::Local));

        let request = SaveRequest::new()
            .add_contact(
                Contact::new("1")
                    .with_given_name("Zoe")
                    .with_family_name("Adams")
                    .with_phone(Some("mobile"), "+1 (555) 010-0001"),
                Some("local"),
            )
            .add_contact(
                Contact::new("2")
                    .with_given_name("Ann")
                    .with_family_name("Young")
                    .with_email(Some("work"), "ann@example.com"),
                Some("local"),
            )
            .add_contact(Contact::new("3").with_given_name("Bob"), None)
            .add_group(Group::new("friends", "Friends"), Some("local"))
            .add_member("2", "friends");
        store.apply(&request).unwrap();
        store
    }

    #[test]
    fn test_lookup_projects_requested_keys() {
        let store = seeded();
        let contact = store
            .unified_contact("2", &[ContactKey::GivenName])
            .unwrap();

        assert_eq!(contact.given_name, "Ann");
        assert_eq!(contact.family_name, "");
        assert!(contact.email_addresses.is_empty());
        assert!(contact.is_key_available(ContactKey::GivenName));
        assert!(!contact.is_key_available(ContactKey::FamilyName));
    }

    #[test]
    fn test_lookup_missing_contact() {
        let store = seeded();
        assert_eq!(
            store.unified_contact("999", &[ContactKey::GivenName]),
            Err(DirectoryError::not_found("999"))
        );
    }

    #[test]
    fn test_predicates() {
        let store = seeded();
        let ids = |predicate: ContactPredicate| -> Vec<String> {
            store
                .unified_contacts(&predicate, &[])
                .unwrap()
                .into_iter()
                .map(|contact| contact.identifier)
                .collect()
        };

        assert_eq!(ids(ContactPredicate::MatchingName("an".into())), vec!["2"]);
        assert_eq!(
            ids(ContactPredicate::MatchingEmailAddress("ANN@example.com".into())),
            vec!["2"]
        );
        assert_eq!(
            ids(ContactPredicate::MatchingPhoneNumber("15550100001".into())),
            vec!["1"]
        );
        assert_eq!(ids(ContactPredicate::InGroup("friends".into())), vec!["2"]);
        assert_eq!(
            ids(ContactPredicate::InContainer("local".into())),
            vec!["1", "2"]
        );
        assert_eq!(
            ids(ContactPredicate::WithIdentifiers(vec!["3".into(), "1".into()])),
            vec!["1", "3"]
        );
    }

    #[test]
    fn test_invalid_predicates() {
        let store = seeded();
        assert!(matches!(
            store.unified_contacts(&ContactPredicate::MatchingName("  ".into()), &[]),
            Err(DirectoryError::InvalidPredicate(_))
        ));
        assert_eq!(
            store.unified_contacts(&ContactPredicate::InGroup("nope".into()), &[]),
            Err(DirectoryError::not_found("nope"))
        );
    }

    #[test]
    fn test_snapshot_sort_orders() {
        let store = seeded();
        let names = |order: SortOrder| -> Vec<String> {
            store
                .snapshot(&FetchRequest::new(vec![ContactKey::GivenName]).with_sort_order(order))
                .unwrap()
                .into_iter()
                .map(|contact| contact.given_name)
                .collect()
        };

        assert_eq!(names(SortOrder::None), vec!["Zoe", "Ann", "Bob"]);
        assert_eq!(names(SortOrder::GivenName), vec!["Ann", "Bob", "Zoe"]);
        // Bob has no family name and sorts first.
        assert_eq!(names(SortOrder::FamilyName), vec!["Bob", "Zoe", "Ann"]);
    }

    #[test]
    fn test_groups_and_containers_queries() {
        let store = seeded();

        assert_eq!(store.groups(None).unwrap().len(), 1);
        assert_eq!(
            store
                .groups(Some(&GroupPredicate::InContainer("local".into())))
                .unwrap()[0]
                .name,
            "Friends"
        );

        let of_contact = store
            .containers(Some(&ContainerPredicate::OfContact("1".into())))
            .unwrap();
        assert_eq!(of_contact[0].identifier, "local");

        // Contact 3 lives outside every container.
        assert!(store
            .containers(Some(&ContainerPredicate::OfContact("3".into())))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut store = seeded();
        let request = SaveRequest::new()
            .add_contact(Contact::new("4").with_given_name("Cy"), None)
            .delete_contact("missing");

        assert_eq!(store.apply(&request), Err(DirectoryError::not_found("missing")));
        assert_eq!(store.contact_count(), 3);
        assert!(store.unified_contact("4", &[]).is_err());
    }

    #[test]
    fn test_apply_reports_touched_identifiers() {
        let mut store = seeded();
        let changes = store
            .apply(
                &SaveRequest::new()
                    .update_contact(Contact::new("1").with_given_name("Zed"))
                    .remove_member("2", "friends")
                    .delete_group("friends"),
            )
            .unwrap();

        assert_eq!(changes.contacts, vec!["1", "2"]);
        assert_eq!(changes.groups, vec!["friends"]);
        assert!(store
            .unified_contacts(&ContactPredicate::MatchingName("zed".into()), &[])
            .unwrap()
            .len()
            == 1);
    }

    #[test]
    fn test_update_merges_only_fetched_keys() {
        let mut store = seeded();
        let partial = store
            .unified_contact("1", &[ContactKey::GivenName])
            .unwrap()
            .with_given_name("Zoey");
        let partial = Contact {
            fetched_keys: [ContactKey::GivenName].into_iter().collect(),
            ..partial
        };

        store.apply(&SaveRequest::new().update_contact(partial)).unwrap();

        let stored = store.unified_contact("1", &ContactKey::ALL).unwrap();
        assert_eq!(stored.given_name, "Zoey");
        assert_eq!(stored.family_name, "Adams");
        assert_eq!(stored.phone_numbers.len(), 1);
    }

    #[test]
    fn test_add_assigns_identifier_and_rejects_duplicates() {
        let mut store = seeded();
        let changes = store
            .apply(&SaveRequest::new().add_contact(Contact::new("").with_given_name("New"), None))
            .unwrap();
        assert_eq!(changes.contacts.len(), 1);
        assert!(!changes.contacts[0].is_empty());

        assert!(matches!(
            store.apply(&SaveRequest::new().add_contact(Contact::new("1"), None)),
            Err(DirectoryError::ValidationFailed(_))
        ));
        assert!(matches!(
            store.apply(&SaveRequest::new().add_group(Group::new("g", " "), None)),
            Err(DirectoryError::ValidationFailed(_))
        ));
    }
}
