//! Scripted answers to access requests.

use std::thread;
use std::time::Duration;

use bridge_traits::{AccessCompletion, DirectoryError};
use core_async::runtime;
use tracing::debug;

/// How the simulated permission prompt answers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccessPrompt {
    /// The user allows access.
    #[default]
    Grant,
    /// The user declines; reported as `(false, None)`.
    Deny,
    /// The permission layer itself fails.
    Fail(DirectoryError),
    /// The completion is dropped without ever being called.
    Ignore,
}

impl AccessPrompt {
    fn answer(self, completion: AccessCompletion) {
        match self {
            AccessPrompt::Grant => completion(true, None),
            AccessPrompt::Deny => completion(false, None),
            AccessPrompt::Fail(error) => completion(false, Some(error)),
            AccessPrompt::Ignore => drop(completion),
        }
    }
}

/// Answers `completion` now, or after `delay` from another task or thread.
pub(crate) fn respond(prompt: AccessPrompt, delay: Option<Duration>, completion: AccessCompletion) {
    let Some(delay) = delay else {
        prompt.answer(completion);
        return;
    };

    debug!(?prompt, delay_ms = delay.as_millis() as u64, "deferring access answer");

    match runtime::current() {
        Some(handle) => {
            handle.spawn(async move {
                core_async::time::sleep(delay).await;
                prompt.answer(completion);
            });
        }
        None => {
            thread::spawn(move || {
                thread::sleep(delay);
                prompt.answer(completion);
            });
        }
    }
}
