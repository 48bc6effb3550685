//! # In-Memory Bridge Implementation
//!
//! A [`ContactDirectory`](bridge_traits::ContactDirectory) host adapter that
//! keeps every record in process memory.
//!
//! ## Overview
//!
//! Used by tests, demos and the `memory-shims` configuration default. It is a
//! host adapter, not a storage engine: nothing is persisted and predicates
//! are the closed set defined by `bridge-traits`.
//!
//! - Permission prompts are scripted with [`AccessPrompt`] and can be
//!   answered after a delay, from a Tokio task when a runtime is running or
//!   from a plain thread otherwise
//! - Save requests are validated as a whole before anything is applied
//! - Every applied save request is broadcast to change-notification streams
//!
//! `FetchRequest::unify_results` has no effect: records are never linked.

mod access;
mod changes;
mod directory;
mod store;

pub use access::AccessPrompt;
pub use directory::InMemoryDirectory;
