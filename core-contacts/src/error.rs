use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use bridge_traits::DirectoryError;
use core_publisher::Abandoned;
use thiserror::Error;

/// Failure of a contacts operation.
///
/// Every variant except [`ContactError::Unknown`] names the operation that
/// failed and keeps the directory's error as its source.
#[derive(Error, Debug, Clone)]
pub enum ContactError {
    /// The permission request itself failed. A plain denial is not an error.
    #[error("Access request failed: {0}")]
    AccessDenied(#[source] DirectoryError),

    #[error("Contact lookup failed: {0}")]
    Lookup(#[source] DirectoryError),

    #[error("Contact lookup by predicate failed: {0}")]
    PredicateLookup(#[source] DirectoryError),

    #[error("Groups query failed: {0}")]
    GroupsQuery(#[source] DirectoryError),

    #[error("Containers query failed: {0}")]
    ContainersQuery(#[source] DirectoryError),

    #[error("Contact enumeration failed: {0}")]
    Enumeration(#[source] DirectoryError),

    #[error("Save request failed: {0}")]
    SaveRequest(#[source] DirectoryError),

    #[error("Change observation failed: {0}")]
    ChangeObservation(#[source] DirectoryError),

    #[error("Unknown contacts error: {0}")]
    Unknown(#[source] Arc<dyn StdError + Send + Sync>),
}

/// Fieldless tag of a [`ContactError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactErrorKind {
    AccessDenied,
    Lookup,
    PredicateLookup,
    GroupsQuery,
    ContainersQuery,
    Enumeration,
    SaveRequest,
    ChangeObservation,
    Unknown,
}

impl ContactErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactErrorKind::AccessDenied => "access_denied",
            ContactErrorKind::Lookup => "lookup",
            ContactErrorKind::PredicateLookup => "predicate_lookup",
            ContactErrorKind::GroupsQuery => "groups_query",
            ContactErrorKind::ContainersQuery => "containers_query",
            ContactErrorKind::Enumeration => "enumeration",
            ContactErrorKind::SaveRequest => "save_request",
            ContactErrorKind::ChangeObservation => "change_observation",
            ContactErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContactErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContactError {
    pub fn kind(&self) -> ContactErrorKind {
        match self {
            ContactError::AccessDenied(_) => ContactErrorKind::AccessDenied,
            ContactError::Lookup(_) => ContactErrorKind::Lookup,
            ContactError::PredicateLookup(_) => ContactErrorKind::PredicateLookup,
            ContactError::GroupsQuery(_) => ContactErrorKind::GroupsQuery,
            ContactError::ContainersQuery(_) => ContactErrorKind::ContainersQuery,
            ContactError::Enumeration(_) => ContactErrorKind::Enumeration,
            ContactError::SaveRequest(_) => ContactErrorKind::SaveRequest,
            ContactError::ChangeObservation(_) => ContactErrorKind::ChangeObservation,
            ContactError::Unknown(_) => ContactErrorKind::Unknown,
        }
    }

    /// The directory error this failure wraps, if any.
    pub fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            ContactError::AccessDenied(cause)
            | ContactError::Lookup(cause)
            | ContactError::PredicateLookup(cause)
            | ContactError::GroupsQuery(cause)
            | ContactError::ContainersQuery(cause)
            | ContactError::Enumeration(cause)
            | ContactError::SaveRequest(cause)
            | ContactError::ChangeObservation(cause) => Some(cause),
            ContactError::Unknown(_) => None,
        }
    }
}

/// A subscription that closed without completing or failing.
impl From<Abandoned> for ContactError {
    fn from(abandoned: Abandoned) -> Self {
        ContactError::Unknown(Arc::new(abandoned))
    }
}

pub type Result<T> = std::result::Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_chain_reaches_directory_error() {
        let error = ContactError::Lookup(DirectoryError::not_found("999"));

        assert_eq!(error.kind(), ContactErrorKind::Lookup);
        assert_eq!(error.to_string(), "Contact lookup failed: Record not found: 999");

        let source = error.source().expect("lookup errors keep their cause");
        assert_eq!(source.to_string(), "Record not found: 999");
        assert_eq!(
            error.directory_error(),
            Some(&DirectoryError::not_found("999"))
        );
    }

    #[test]
    fn test_unknown_keeps_arbitrary_cause() {
        let cause: Box<dyn StdError + Send + Sync> = "callback never invoked".into();
        let error = ContactError::Unknown(Arc::from(cause));

        assert_eq!(error.kind(), ContactErrorKind::Unknown);
        assert!(error.directory_error().is_none());
        assert!(error.to_string().contains("callback never invoked"));

        let cloned = error.clone();
        assert_eq!(cloned.kind().as_str(), "unknown");
    }

    #[test]
    fn test_abandonment_is_unknown() {
        let error = ContactError::from(Abandoned { publisher: "groups" });

        assert_eq!(error.kind(), ContactErrorKind::Unknown);
        assert_eq!(
            error.to_string(),
            "Unknown contacts error: groups closed without a terminal signal"
        );
    }
}
