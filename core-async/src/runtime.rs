//! Runtime utilities that wrap Tokio's runtime primitives so downstream
//! crates never need to depend on Tokio directly.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// Panics if the runtime cannot be built; this is only used from test and
/// binary entry points.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Runs the provided future to completion on a fresh multi-thread runtime.
///
/// Use this when the future hands work to `spawn_blocking` and waits on
/// results produced on other threads.
pub fn block_on_multi_thread<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on_multi_thread: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns a handle to the runtime driving the current thread, if any.
///
/// Callers that may run outside of any runtime use this to decide between
/// spawning and running inline.
pub fn current() -> Option<Handle> {
    Handle::try_current().ok()
}
