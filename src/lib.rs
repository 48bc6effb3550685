//! Workspace umbrella crate.
//!
//! Exposes feature flags that map to the individual workspace crates so host
//! applications can depend on `contacts-workspace` alone:
//!
//! - `facade`: the publisher facade (`core-contacts`, `core-publisher`).
//! - `memory-shims` (default): the facade plus the in-memory directory from
//!   `bridge-memory`, used when the host supplies no directory of its own.

#[cfg(any(feature = "facade", feature = "memory-shims"))]
pub use core_contacts as contacts;

#[cfg(any(feature = "facade", feature = "memory-shims"))]
pub use core_publisher as publisher;

#[cfg(feature = "memory-shims")]
pub use bridge_memory as memory;
