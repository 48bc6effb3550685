//! Shared fakes for the contacts facade tests.

#![allow(dead_code)]

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bridge_traits::{
    error::Result as DirectoryResult, AccessCompletion, Contact, ContactDirectory, ContactKey,
    ContactPredicate, Container, ContainerPredicate, DirectoryChangeStream, DirectoryError,
    EntityType, FetchRequest, Group, GroupPredicate, SaveRequest,
};
use core_publisher::{Completion, Observer, SubscriptionHandle};
use core_contacts::ContactError;

/// How the scripted directory answers an access request.
pub enum AccessScript {
    Answer(bool, Option<DirectoryError>),
    AnswerFromThread(Duration, bool, Option<DirectoryError>),
    DropCallback,
    Panic,
}

/// Directory whose every answer is fixed up front.
pub struct ScriptedDirectory {
    access: AccessScript,
    records: Vec<Contact>,
    lookup_failure: Option<DirectoryError>,
    panic_on_lookup: bool,
    predicate_result: Option<DirectoryResult<Vec<Contact>>>,
    groups: DirectoryResult<Vec<Group>>,
    containers: DirectoryResult<Vec<Container>>,
    enumeration_failure: Option<(usize, DirectoryError)>,
    save_result: DirectoryResult<()>,
    change_stream: Mutex<Option<Box<dyn DirectoryChangeStream>>>,
    pub calls: AtomicUsize,
    pub visited: AtomicUsize,
    pub finished_scans: AtomicUsize,
    pub saved: Mutex<Vec<SaveRequest>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self {
            access: AccessScript::Answer(true, None),
            records: Vec::new(),
            lookup_failure: None,
            panic_on_lookup: false,
            predicate_result: None,
            groups: Ok(Vec::new()),
            containers: Ok(Vec::new()),
            enumeration_failure: None,
            save_result: Ok(()),
            change_stream: Mutex::new(None),
            calls: AtomicUsize::new(0),
            visited: AtomicUsize::new(0),
            finished_scans: AtomicUsize::new(0),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_access(mut self, access: AccessScript) -> Self {
        self.access = access;
        self
    }

    pub fn with_records(mut self, records: Vec<Contact>) -> Self {
        self.records = records;
        self
    }

    pub fn failing_lookups(mut self, error: DirectoryError) -> Self {
        self.lookup_failure = Some(error);
        self
    }

    pub fn panicking_on_lookup(mut self) -> Self {
        self.panic_on_lookup = true;
        self
    }

    pub fn with_predicate_result(mut self, result: DirectoryResult<Vec<Contact>>) -> Self {
        self.predicate_result = Some(result);
        self
    }

    pub fn with_groups(mut self, groups: DirectoryResult<Vec<Group>>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_containers(mut self, containers: DirectoryResult<Vec<Container>>) -> Self {
        self.containers = containers;
        self
    }

    /// Fails the enumeration when it reaches record `index`.
    pub fn failing_enumeration_at(mut self, index: usize, error: DirectoryError) -> Self {
        self.enumeration_failure = Some((index, error));
        self
    }

    pub fn with_save_result(mut self, result: DirectoryResult<()>) -> Self {
        self.save_result = result;
        self
    }

    pub fn with_change_stream(self, stream: Box<dyn DirectoryChangeStream>) -> Self {
        *self.change_stream.lock().unwrap() = Some(stream);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> usize {
        self.visited.load(Ordering::SeqCst)
    }

    /// Enumerations that returned without failing.
    pub fn finished_scans(&self) -> usize {
        self.finished_scans.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ContactDirectory for ScriptedDirectory {
    fn request_access(&self, _entity_type: EntityType, completion: AccessCompletion) {
        self.record_call();
        match &self.access {
            AccessScript::Answer(granted, error) => completion(*granted, error.clone()),
            AccessScript::AnswerFromThread(delay, granted, error) => {
                let (delay, granted, error) = (*delay, *granted, error.clone());
                thread::spawn(move || {
                    thread::sleep(delay);
                    completion(granted, error);
                });
            }
            AccessScript::DropCallback => drop(completion),
            AccessScript::Panic => panic!("permission layer crashed"),
        }
    }

    fn unified_contact(&self, identifier: &str, keys: &[ContactKey]) -> DirectoryResult<Contact> {
        self.record_call();
        if self.panic_on_lookup {
            panic!("lookup crashed");
        }
        if let Some(error) = &self.lookup_failure {
            return Err(error.clone());
        }
        self.records
            .iter()
            .find(|contact| contact.identifier == identifier)
            .map(|contact| contact.projected(keys))
            .ok_or_else(|| DirectoryError::not_found(identifier))
    }

    fn unified_contacts(
        &self,
        _predicate: &ContactPredicate,
        keys: &[ContactKey],
    ) -> DirectoryResult<Vec<Contact>> {
        self.record_call();
        match &self.predicate_result {
            Some(result) => result.clone(),
            None => Ok(self
                .records
                .iter()
                .map(|contact| contact.projected(keys))
                .collect()),
        }
    }

    fn groups(&self, _predicate: Option<&GroupPredicate>) -> DirectoryResult<Vec<Group>> {
        self.record_call();
        self.groups.clone()
    }

    fn containers(
        &self,
        _predicate: Option<&ContainerPredicate>,
    ) -> DirectoryResult<Vec<Container>> {
        self.record_call();
        self.containers.clone()
    }

    fn enumerate_contacts(
        &self,
        request: &FetchRequest,
        visitor: &mut dyn FnMut(Contact) -> ControlFlow<()>,
    ) -> DirectoryResult<()> {
        self.record_call();
        for (index, contact) in self.records.iter().enumerate() {
            if let Some((failing_index, error)) = &self.enumeration_failure {
                if *failing_index == index {
                    return Err(error.clone());
                }
            }
            self.visited.fetch_add(1, Ordering::SeqCst);
            if visitor(contact.projected(&request.keys)).is_break() {
                break;
            }
        }
        self.finished_scans.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn execute(&self, request: &SaveRequest) -> DirectoryResult<()> {
        self.record_call();
        self.saved.lock().unwrap().push(request.clone());
        self.save_result.clone()
    }

    fn change_notifications(&self) -> DirectoryResult<Box<dyn DirectoryChangeStream>> {
        self.record_call();
        self.change_stream.lock().unwrap().take().ok_or_else(|| {
            DirectoryError::NotAvailable("no change stream scripted".to_string())
        })
    }
}

/// Everything an observer saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<T> {
    Next(T),
    Finished,
    Failed(String),
}

/// Observer recording into a shared log, optionally cancelling after
/// `cancel_after` values.
pub struct Recorder<T> {
    pub events: Arc<Mutex<Vec<Event<T>>>>,
    cancel_after: Option<usize>,
    handle: Option<SubscriptionHandle>,
    seen: usize,
}

impl<T> Recorder<T> {
    pub fn new() -> (Self, Arc<Mutex<Vec<Event<T>>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
                cancel_after: None,
                handle: None,
                seen: 0,
            },
            events,
        )
    }

    pub fn cancelling_after(count: usize) -> (Self, Arc<Mutex<Vec<Event<T>>>>) {
        let (mut recorder, events) = Self::new();
        recorder.cancel_after = Some(count);
        (recorder, events)
    }
}

impl<T> Observer<T, ContactError> for Recorder<T>
where
    T: Send + 'static,
{
    fn on_subscribe(&mut self, handle: SubscriptionHandle) {
        self.handle = Some(handle);
    }

    fn on_next(&mut self, value: T) {
        self.events.lock().unwrap().push(Event::Next(value));
        self.seen += 1;
        if Some(self.seen) == self.cancel_after {
            if let Some(handle) = &self.handle {
                handle.cancel();
            }
        }
    }

    fn on_completion(&mut self, completion: Completion<ContactError>) {
        let event = match completion {
            Completion::Finished => Event::Finished,
            Completion::Failure(error) => Event::Failed(error.kind().to_string()),
        };
        self.events.lock().unwrap().push(event);
    }
}

pub fn ann() -> Contact {
    Contact::new("123")
        .with_given_name("Ann")
        .with_family_name("Lee")
        .with_email(Some("home"), "ann@example.com")
}

pub fn numbered_contacts(count: usize) -> Vec<Contact> {
    (1..=count)
        .map(|n| Contact::new(n.to_string()).with_given_name(format!("Contact {}", n)))
        .collect()
}
