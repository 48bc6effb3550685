//! # Host Bridge Traits
//!
//! Capabilities the reactive contacts core needs from its host.
//!
//! ## Overview
//!
//! The core never talks to a platform contact store directly. Hosts provide a
//! [`ContactDirectory`] implementation and the core adapts each of its
//! operations into a publisher. This crate owns that boundary: the trait, the
//! native value types it exchanges, and the [`DirectoryError`] hosts report
//! failures with.
//!
//! ## Traits
//!
//! - [`ContactDirectory`](directory::ContactDirectory) - access requests, lookups,
//!   group/container queries, enumeration, save requests, change notifications
//! - [`DirectoryChangeStream`](directory::DirectoryChangeStream) - async stream of store changes
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//! - [`Clock`](time::Clock) - time source for deterministic testing
//!
//! ## Host Implementations
//!
//! | Host    | Implementation Crate | Status |
//! |---------|---------------------|--------|
//! | Tests / demos | `bridge-memory` | ✅ Available |
//! | Apple   | TBD                 | 📋 Planned |
//! | Android | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! Implementations convert native failures into [`DirectoryError`]. Callers of
//! the core never see these directly: the contacts facade wraps each one into
//! an operation-specific error that keeps the original as its source.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so a single directory handle can be shared
//! across subscriptions and blocking workers.

pub mod contacts;
pub mod directory;
pub mod error;
pub mod logging;
pub mod time;

pub use error::DirectoryError;

// Re-export commonly used types
pub use contacts::{
    Contact, ContactKey, ContactPredicate, Container, ContainerPredicate, ContainerType,
    DirectoryChange, EntityType, FetchRequest, Group, GroupPredicate, LabeledValue,
    SaveOperation, SaveRequest, SortOrder,
};
pub use directory::{AccessCompletion, ContactDirectory, DirectoryChangeStream};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
