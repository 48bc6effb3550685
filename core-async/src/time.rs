//! Time-related operations backed by `tokio::time`.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, timeout, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(10)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(10));
//!
//!     let result = timeout(Duration::from_millis(50), async { 1 }).await;
//!     assert_eq!(result.unwrap(), 1);
//! }
//! ```

pub use tokio::time::{error::Elapsed, sleep, timeout};

pub use std::time::{Duration, Instant};
