//! Task spawning and execution.
//!
//! - `spawn`: runs a future concurrently on the current runtime
//! - `spawn_blocking`: runs a synchronous closure on the blocking pool; the
//!   contacts facade uses it to keep directory scans off async workers
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//!
//!     let blocking = task::spawn_blocking(|| 7);
//!     assert_eq!(blocking.await.unwrap(), 7);
//! }
//! ```

pub use tokio::task::{spawn_blocking, AbortHandle, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// Panics when called outside of a runtime; use
/// [`runtime::current`](crate::runtime::current) first when that is possible.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}
