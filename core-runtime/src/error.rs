use thiserror::Error;

/// Errors raised while wiring the contacts core together.
///
/// Operation failures never use this type; they surface as
/// `core_contacts::ContactError` on the publisher that failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or a logging setup failure.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host capability was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn capability_missing(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilityMissing {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Whether the host can fix this by injecting something at startup.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, Self::CapabilityMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_missing_display() {
        let error = Error::capability_missing("ContactDirectory", "inject a directory");
        assert!(error.is_capability_missing());
        assert_eq!(
            error.to_string(),
            "Capability missing: ContactDirectory - inject a directory"
        );
        assert!(!Error::Config("bad".to_string()).is_capability_missing());
    }
}
