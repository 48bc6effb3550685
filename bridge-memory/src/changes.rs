//! Change notification stream over a broadcast channel.

use async_trait::async_trait;
use bridge_traits::{DirectoryChange, DirectoryChangeStream};
use core_async::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Receives every change applied after it was created.
pub(crate) struct BroadcastChangeStream {
    receiver: broadcast::Receiver<DirectoryChange>,
}

impl BroadcastChangeStream {
    pub(crate) fn new(receiver: broadcast::Receiver<DirectoryChange>) -> Self {
        Self { receiver }
    }
}

#[async_trait]
impl DirectoryChangeStream for BroadcastChangeStream {
    async fn next(&mut self) -> Option<DirectoryChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change stream lagged, notifications dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
