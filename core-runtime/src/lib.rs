//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the reactive contacts core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the contacts facade depends on.
//! It establishes the logging conventions (including contact PII redaction)
//! and the fail-fast configuration builder used to wire a host
//! `ContactDirectory` into the core.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ContactsConfig, ContactsConfigBuilder, DispatchMode, SaveFailurePolicy};
pub use error::{Error, Result};
