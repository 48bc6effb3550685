//! Release hooks returned by work functions.

use std::fmt;

use core_async::sync::CancellationToken;
use core_async::task::AbortHandle;

/// Releases whatever a work function acquired for one subscription.
///
/// The bridge runs it exactly once: when the consumer cancels, or right after
/// the subscription terminates on its own. Work that holds nothing returns
/// [`Cancellable::empty`].
#[must_use = "a Cancellable does nothing unless returned to the bridge or cancelled"]
pub struct Cancellable {
    action: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Cancellable {
    /// A hook with nothing to release.
    pub fn empty() -> Self {
        Self { action: None }
    }

    /// Runs `action` on release.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_none()
    }

    /// Runs the release action now.
    pub fn cancel(mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<CancellationToken> for Cancellable {
    fn from(token: CancellationToken) -> Self {
        Self::new(move || token.cancel())
    }
}

impl From<AbortHandle> for Cancellable {
    fn from(handle: AbortHandle) -> Self {
        Self::new(move || handle.abort())
    }
}

impl fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellable")
            .field("empty", &self.is_empty())
            .finish()
    }
}
