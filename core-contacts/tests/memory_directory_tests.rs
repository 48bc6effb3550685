//! End-to-end flows over the in-memory directory.

use std::sync::Arc;
use std::time::Duration;

use bridge_memory::{AccessPrompt, InMemoryDirectory};
use bridge_traits::{
    Contact, ContactKey, ContactPredicate, DirectoryError, EntityType, FetchRequest, Group,
    SaveRequest, SortOrder,
};
use core_contacts::{ContactErrorKind, ContactsService};
use core_runtime::{ContactsConfig, DispatchMode, SaveFailurePolicy};
use futures::StreamExt;

fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .seed(
            SaveRequest::new()
                .add_contact(
                    Contact::new("1")
                        .with_given_name("Zoe")
                        .with_family_name("Adams")
                        .with_phone(Some("mobile"), "+1 (555) 010-2000"),
                    None,
                )
                .add_contact(
                    Contact::new("2")
                        .with_given_name("Ann")
                        .with_family_name("Lee")
                        .with_email(Some("home"), "ann@example.com"),
                    None,
                )
                .add_contact(
                    Contact::new("3")
                        .with_given_name("Bob")
                        .with_family_name("Chen"),
                    None,
                )
                .add_group(Group::new("G1", "Family"), None)
                .add_member("2", "G1"),
        )
        .unwrap();
    directory
}

fn service(directory: Arc<InMemoryDirectory>) -> ContactsService {
    ContactsService::new(
        ContactsConfig::builder()
            .directory(directory)
            .transaction_author("contacts-tests")
            .build()
            .unwrap(),
    )
}

#[core_async::test]
async fn test_access_prompts() {
    let directory = seeded_directory();
    let service = service(directory.clone());

    assert!(service.request_access_async(EntityType::Contacts).await.unwrap());

    directory.set_access_prompt(AccessPrompt::Deny);
    directory.set_access_delay(Some(Duration::from_millis(10)));
    assert!(!service.request_access_async(EntityType::Contacts).await.unwrap());

    directory.set_access_prompt(AccessPrompt::Fail(DirectoryError::NotAuthorized));
    let error = service
        .request_access_async(EntityType::Contacts)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ContactErrorKind::AccessDenied);

    directory.set_access_prompt(AccessPrompt::Ignore);
    let error = service
        .request_access_async(EntityType::Contacts)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ContactErrorKind::Unknown);
}

#[core_async::test]
async fn test_predicates() {
    let service = service(seeded_directory());
    let keys = [ContactKey::GivenName, ContactKey::FamilyName];

    let by_phone = service
        .unified_contacts_async(
            ContactPredicate::MatchingPhoneNumber("1-555-010-2000".into()),
            &keys,
        )
        .await
        .unwrap();
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0].given_name, "Zoe");

    let in_group = service
        .unified_contacts_async(ContactPredicate::InGroup("G1".into()), &keys)
        .await
        .unwrap();
    assert_eq!(in_group.len(), 1);
    assert_eq!(in_group[0].identifier, "2");

    let error = service
        .unified_contacts_async(ContactPredicate::InGroup("missing".into()), &keys)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ContactErrorKind::PredicateLookup);
}

#[core_async::test]
async fn test_enumeration_sorting() {
    let service = service(seeded_directory());

    let names: Vec<String> = service
        .enumerate_contacts_async(
            FetchRequest::new(vec![ContactKey::GivenName, ContactKey::FamilyName])
                .with_sort_order(SortOrder::FamilyName),
        )
        .await
        .unwrap()
        .into_iter()
        .map(|contact| contact.family_name)
        .collect();

    assert_eq!(names, vec!["Adams", "Chen", "Lee"]);
}

#[core_async::test]
async fn test_saves_are_observed() {
    let directory = seeded_directory();
    let service = service(directory.clone());

    let mut changes = service.changes().subscribe();

    service
        .execute_async(SaveRequest::new().delete_contact("3"))
        .await
        .unwrap();
    assert_eq!(directory.contact_count(), 2);

    let change = changes.next().await.unwrap().unwrap();
    assert_eq!(change.contact_identifiers, vec!["3"]);
    assert_eq!(change.transaction_author.as_deref(), Some("contacts-tests"));

    changes.cancel();
    assert!(changes.next().await.is_none());
}

#[core_async::test]
async fn test_rejected_save_leaves_directory_untouched() {
    let directory = seeded_directory();
    let service = service(directory.clone());

    let request = SaveRequest::new()
        .delete_contact("1")
        .add_group(Group::new("G2", "  "), None);
    let error = service.execute_async(request).await.unwrap_err();

    assert_eq!(error.kind(), ContactErrorKind::SaveRequest);
    assert_eq!(directory.contact_count(), 3);

    let lenient = ContactsService::new(
        ContactsConfig::builder()
            .directory(directory.clone())
            .save_failure_policy(SaveFailurePolicy::Complete)
            .build()
            .unwrap(),
    );
    lenient
        .execute_async(SaveRequest::new().delete_contact("missing"))
        .await
        .unwrap();
}

#[core_async::test(flavor = "multi_thread")]
async fn test_blocking_dispatch_over_memory_directory() {
    let directory = seeded_directory();
    let service = ContactsService::new(
        ContactsConfig::builder()
            .directory(directory)
            .dispatch_mode(DispatchMode::Blocking)
            .build()
            .unwrap(),
    );

    let ann = service
        .unified_contact_async("2", &[ContactKey::EmailAddresses])
        .await
        .unwrap();
    assert_eq!(ann.email_addresses[0].value, "ann@example.com");
    assert!(ann.given_name.is_empty());

    let groups = service.groups_async(None).await.unwrap();
    assert_eq!(groups, vec![Group::new("G1", "Family")]);
}
