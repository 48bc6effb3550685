//! Runtime abstraction layer for the reactive contacts core.
//!
//! Every other crate in the workspace reaches the executor through this crate
//! instead of depending on Tokio directly. That keeps the choice of runtime in
//! one place and gives tests a single entry point (`#[core_async::test]`).
//!
//! # Modules
//!
//! - `runtime`: blocking entry points (`block_on`) and runtime handles
//! - `task`: task spawning, including `spawn_blocking` for directory calls
//! - `sync`: channels, locks and [`sync::CancellationToken`]
//! - `time`: `sleep`, `timeout` and duration types
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
