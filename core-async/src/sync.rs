//! Channels and locks.
//!
//! `mpsc` carries subscription values to streams, `broadcast` fans directory
//! changes out to observers, and [`CancellationToken`] stops blocking
//! directory scans between records.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{CancellationToken, Mutex};
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     *mutex.lock().await += 1;
//!
//!     let token = CancellationToken::new();
//!     let child = token.child_token();
//!     token.cancel();
//!     assert!(child.is_cancelled());
//! }
//! ```

pub use tokio::sync::{broadcast, mpsc, oneshot, Mutex, MutexGuard};

pub use tokio_util::sync::{CancellationToken, DropGuard};
