use thiserror::Error;

/// Failure reported by a [`ContactDirectory`](crate::directory::ContactDirectory)
/// implementation.
///
/// Hosts convert their native errors into one of these variants. The core
/// never shows them to callers directly; the contacts facade wraps each one
/// in an operation-specific error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Not authorized to access the contact directory")]
    NotAuthorized,

    #[error("Record not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Directory capability not available: {0}")]
    NotAvailable(String),

    #[error("Directory operation failed: {0}")]
    OperationFailed(String),
}

impl DirectoryError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
