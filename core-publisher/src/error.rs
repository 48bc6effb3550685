//! Outcome reported by the awaiting consumers when no terminal signal came.

use thiserror::Error;

/// A subscription closed without completing or failing.
///
/// Produced by [`Publisher::first`](crate::Publisher::first) and
/// [`Publisher::collect`](crate::Publisher::collect) when the work panicked or
/// dropped every subscriber handle without a terminal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{publisher} closed without a terminal signal")]
pub struct Abandoned {
    pub publisher: &'static str,
}

impl From<Abandoned> for String {
    fn from(abandoned: Abandoned) -> Self {
        abandoned.to_string()
    }
}
