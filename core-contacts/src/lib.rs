//! # Core Contacts
//!
//! Reactive facade over a host [`ContactDirectory`](bridge_traits::ContactDirectory).
//!
//! ## Overview
//!
//! [`ContactsService`] turns every directory operation into a cold
//! [`Publisher`](core_publisher::Publisher) that emits its result(s) and then
//! completes, or fails with a [`ContactError`] naming the operation:
//!
//! | Method | Emits | Fails with |
//! |--------|-------|------------|
//! | `request_access` | `bool` | `AccessDenied` |
//! | `unified_contact` | `Contact` | `Lookup` |
//! | `unified_contacts` | `Vec<Contact>` | `PredicateLookup` |
//! | `groups` | `Vec<Group>` | `GroupsQuery` |
//! | `containers` | `Vec<Container>` | `ContainersQuery` |
//! | `enumerate_contacts` | one `Contact` per record | `Enumeration` |
//! | `execute` | `()` | `SaveRequest` |
//! | `changes` | `DirectoryChange` | `ChangeObservation` |
//!
//! Each has an `*_async` counterpart that awaits the outcome directly.
//!
//! ## Usage
//!
//! ```ignore
//! use core_contacts::ContactsService;
//! use core_runtime::ContactsConfig;
//! use bridge_traits::ContactKey;
//!
//! let service = ContactsService::new(
//!     ContactsConfig::builder().directory(directory).build()?,
//! );
//!
//! let ann = service
//!     .unified_contact_async("123", &[ContactKey::GivenName])
//!     .await?;
//! ```

mod async_api;
pub mod error;
mod service;
pub mod translate;

pub use error::{ContactError, ContactErrorKind, Result};
pub use service::ContactsService;
pub use translate::{translate, unknown, DirectoryOperation};

#[cfg(feature = "memory-shims")]
pub use bridge_memory::{AccessPrompt, InMemoryDirectory};
