//! # Contacts Configuration Module
//!
//! Provides configuration management for the reactive contacts core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ContactsConfig` holding the host directory and the behavioural switches
//! of the contacts facade. It fails fast when the directory is missing so
//! misconfigured hosts find out at startup rather than on first use.
//!
//! ## Required Dependencies
//!
//! - `ContactDirectory` - the host contact store every operation runs against
//!
//! When the `memory-shims` feature is enabled, an empty in-memory directory
//! is injected if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ContactsConfig, DispatchMode, SaveFailurePolicy};
//! use std::sync::Arc;
//!
//! let config = ContactsConfig::builder()
//!     .directory(Arc::new(MyDirectory::new()))
//!     .dispatch_mode(DispatchMode::Blocking)
//!     .save_failure_policy(SaveFailurePolicy::Surface)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::ContactDirectory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How `execute` reports a failed save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFailurePolicy {
    /// Fail the publisher with `ContactError::SaveRequest`.
    #[default]
    Surface,
    /// Log the failure and complete without a value.
    Complete,
}

/// Where synchronous directory calls run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// On the subscribing thread, inside `sink`/`subscribe`.
    #[default]
    Inline,
    /// On the runtime's blocking pool. Falls back to inline outside a runtime.
    Blocking,
}

/// Configuration for the contacts core.
///
/// Use [`ContactsConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ContactsConfig {
    /// Host contact store (required)
    pub directory: Arc<dyn ContactDirectory>,

    /// Failure handling for save requests
    pub save_failure_policy: SaveFailurePolicy,

    /// Where directory calls run
    pub dispatch_mode: DispatchMode,

    /// Author stamped on save requests that do not name one
    pub transaction_author: Option<String>,
}

impl fmt::Debug for ContactsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactsConfig")
            .field("directory", &"ContactDirectory { ... }")
            .field("save_failure_policy", &self.save_failure_policy)
            .field("dispatch_mode", &self.dispatch_mode)
            .field("transaction_author", &self.transaction_author)
            .finish()
    }
}

impl ContactsConfig {
    /// Creates a new builder for constructing a `ContactsConfig`.
    pub fn builder() -> ContactsConfigBuilder {
        ContactsConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(author) = &self.transaction_author {
            if author.trim().is_empty() {
                return Err(Error::Config(
                    "Transaction author cannot be blank. \
                     Omit it to leave save requests unattributed."
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "memory-shims"))]
fn directory_missing_error() -> Error {
    Error::capability_missing(
        "ContactDirectory",
        "ContactDirectory implementation is required for every contacts operation. \
         Apple: adapt the Contacts framework store. \
         Android: adapt the ContactsContract provider. \
         Tests and demos: enable the 'memory-shims' feature to use an empty InMemoryDirectory.",
    )
}

/// Builder for [`ContactsConfig`].
#[derive(Default)]
pub struct ContactsConfigBuilder {
    directory: Option<Arc<dyn ContactDirectory>>,
    save_failure_policy: SaveFailurePolicy,
    dispatch_mode: DispatchMode,
    transaction_author: Option<String>,
}

impl ContactsConfigBuilder {
    /// Sets the host contact directory.
    pub fn directory(mut self, directory: Arc<dyn ContactDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn save_failure_policy(mut self, policy: SaveFailurePolicy) -> Self {
        self.save_failure_policy = policy;
        self
    }

    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn transaction_author(mut self, author: impl Into<String>) -> Self {
        self.transaction_author = Some(author.into());
        self
    }

    /// Builds the configuration, failing fast on missing capabilities.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no directory was provided and the
    ///   `memory-shims` feature is disabled
    /// - [`Error::Config`] when validation fails
    pub fn build(self) -> Result<ContactsConfig> {
        let directory = match self.directory {
            Some(directory) => directory,
            None => default_directory()?,
        };

        let config = ContactsConfig {
            directory,
            save_failure_policy: self.save_failure_policy,
            dispatch_mode: self.dispatch_mode,
            transaction_author: self.transaction_author,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "memory-shims")]
fn default_directory() -> Result<Arc<dyn ContactDirectory>> {
    tracing::debug!("no ContactDirectory provided, using an empty in-memory directory");
    Ok(Arc::new(bridge_memory::InMemoryDirectory::new()))
}

#[cfg(not(feature = "memory-shims"))]
fn default_directory() -> Result<Arc<dyn ContactDirectory>> {
    Err(directory_missing_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        error::Result as DirectoryResult, AccessCompletion, Contact, ContactKey,
        ContactPredicate, Container, ContainerPredicate, DirectoryError, EntityType,
        FetchRequest, Group, GroupPredicate, SaveRequest,
    };
    use std::ops::ControlFlow;

    struct MockDirectory;

    impl ContactDirectory for MockDirectory {
        fn request_access(&self, _entity_type: EntityType, completion: AccessCompletion) {
            completion(true, None);
        }

        fn unified_contact(&self, identifier: &str, _keys: &[ContactKey]) -> DirectoryResult<Contact> {
            Err(DirectoryError::not_found(identifier))
        }

        fn unified_contacts(
            &self,
            _predicate: &ContactPredicate,
            _keys: &[ContactKey],
        ) -> DirectoryResult<Vec<Contact>> {
            Ok(Vec::new())
        }

        fn groups(&self, _predicate: Option<&GroupPredicate>) -> DirectoryResult<Vec<Group>> {
            Ok(Vec::new())
        }

        fn containers(
            &self,
            _predicate: Option<&ContainerPredicate>,
        ) -> DirectoryResult<Vec<Container>> {
            Ok(Vec::new())
        }

        fn enumerate_contacts(
            &self,
            _request: &FetchRequest,
            _visitor: &mut dyn FnMut(Contact) -> ControlFlow<()>,
        ) -> DirectoryResult<()> {
            Ok(())
        }

        fn execute(&self, _request: &SaveRequest) -> DirectoryResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_with_directory_uses_defaults() {
        let config = ContactsConfig::builder()
            .directory(Arc::new(MockDirectory))
            .build()
            .unwrap();

        assert_eq!(config.save_failure_policy, SaveFailurePolicy::Surface);
        assert_eq!(config.dispatch_mode, DispatchMode::Inline);
        assert!(config.transaction_author.is_none());
    }

    #[test]
    fn test_builder_with_custom_settings() {
        let config = ContactsConfig::builder()
            .directory(Arc::new(MockDirectory))
            .save_failure_policy(SaveFailurePolicy::Complete)
            .dispatch_mode(DispatchMode::Blocking)
            .transaction_author("sync-engine")
            .build()
            .unwrap();

        assert_eq!(config.save_failure_policy, SaveFailurePolicy::Complete);
        assert_eq!(config.dispatch_mode, DispatchMode::Blocking);
        assert_eq!(config.transaction_author.as_deref(), Some("sync-engine"));
    }

    #[test]
    fn test_validate_rejects_blank_author() {
        let result = ContactsConfig::builder()
            .directory(Arc::new(MockDirectory))
            .transaction_author("   ")
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Transaction author cannot be blank"));
    }

    #[cfg(not(feature = "memory-shims"))]
    #[test]
    fn test_builder_requires_directory() {
        let result = ContactsConfig::builder().build();

        let err = result.unwrap_err();
        assert!(err.is_capability_missing());
        let err_msg = err.to_string();
        assert!(err_msg.contains("ContactDirectory"));
        assert!(err_msg.contains("memory-shims"));
    }

    #[cfg(feature = "memory-shims")]
    #[test]
    fn test_builder_injects_memory_directory() {
        let config = ContactsConfig::builder().build().unwrap();
        assert!(config.directory.groups(None).unwrap().is_empty());
    }

    #[test]
    fn test_policies_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&SaveFailurePolicy::Complete).unwrap(),
            "\"complete\""
        );
        let mode: DispatchMode = serde_json::from_str("\"blocking\"").unwrap();
        assert_eq!(mode, DispatchMode::Blocking);
    }

    #[test]
    fn test_config_debug_hides_directory() {
        let config = ContactsConfig::builder()
            .directory(Arc::new(MockDirectory))
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("ContactDirectory { ... }"));
        assert!(debug.contains("Inline"));
    }
}
