//! Async behaviour of the in-memory directory: delayed prompts and change
//! notifications.

use std::sync::Arc;

use bridge_memory::{AccessPrompt, InMemoryDirectory};
use bridge_traits::{
    Contact, ContactDirectory, DirectoryChangeStream, DirectoryError, EntityType, Group,
    SaveRequest,
};
use core_async::sync::oneshot;
use core_async::time::{timeout, Duration};

#[core_async::test]
async fn test_delayed_prompt_answers_from_runtime_task() {
    let directory = InMemoryDirectory::new();
    directory.set_access_prompt(AccessPrompt::Fail(DirectoryError::NotAuthorized));
    directory.set_access_delay(Some(Duration::from_millis(20)));

    let (tx, rx) = oneshot::channel();
    directory.request_access(
        EntityType::Contacts,
        Box::new(move |granted, error| {
            let _ = tx.send((granted, error));
        }),
    );

    let answer = timeout(Duration::from_secs(2), rx)
        .await
        .expect("prompt should answer")
        .unwrap();
    assert_eq!(answer, (false, Some(DirectoryError::NotAuthorized)));
}

#[core_async::test]
async fn test_ignored_prompt_drops_completion() {
    let directory = InMemoryDirectory::new();
    directory.set_access_prompt(AccessPrompt::Ignore);

    let (tx, rx) = oneshot::channel::<bool>();
    directory.request_access(
        EntityType::Contacts,
        Box::new(move |granted, _| {
            let _ = tx.send(granted);
        }),
    );

    // The sender was dropped together with the completion.
    assert!(rx.await.is_err());
}

#[core_async::test]
async fn test_change_stream_reports_each_save() {
    let directory = Arc::new(InMemoryDirectory::new());
    let mut stream = directory.change_notifications().unwrap();

    directory
        .execute(&SaveRequest::new().add_contact(Contact::new("1").with_given_name("Ann"), None))
        .unwrap();
    directory
        .execute(
            &SaveRequest::new()
                .add_group(Group::new("g1", "Friends"), None)
                .add_member("1", "g1"),
        )
        .unwrap();

    let first = timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.contact_identifiers, vec!["1"]);

    let second = timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.contact_identifiers, vec!["1"]);
    assert_eq!(second.group_identifiers, vec!["g1"]);
}

#[core_async::test]
async fn test_change_stream_ends_when_directory_dropped() {
    let directory = InMemoryDirectory::new();
    let mut stream = directory.change_notifications().unwrap();
    drop(directory);

    assert!(stream.next().await.is_none());
}
