//! # Core Publisher
//!
//! Turns callback-based and blocking work into cold, cancellable publishers.
//!
//! ## Overview
//!
//! A [`Publisher`] wraps a work function. Each subscription runs the work
//! once with a fresh [`Subscriber`], through which the work reports any
//! number of values and then exactly one terminal signal. The work returns a
//! [`Cancellable`] that releases what it acquired; the bridge runs it once,
//! on cancel or after termination, whichever comes first.
//!
//! Consumers choose how to read a subscription:
//!
//! - [`Publisher::sink`] pushes into an [`Observer`] and returns an
//!   [`AnyCancellable`] that cancels when dropped
//! - [`Publisher::subscribe`] returns a [`Subscription`] implementing
//!   [`futures::Stream`]
//! - [`Publisher::first`] and [`Publisher::collect`] await a single outcome
//!
//! ## Guarantees
//!
//! - Values are delivered in send order and never concurrently.
//! - At most one terminal signal reaches the consumer; later signals are
//!   dropped silently.
//! - After cancel the consumer receives nothing further.
//! - A work function that panics, or that drops every subscriber handle
//!   without a terminal signal, closes its subscription with a log entry and
//!   no terminal signal. `first` and `collect` report that as [`Abandoned`].

mod cancellable;
mod error;
mod observer;
mod publisher;
mod subscriber;
mod subscription;

pub use cancellable::Cancellable;
pub use error::Abandoned;
pub use observer::{Completion, Observer};
pub use publisher::{panic_message, Publisher};
pub use subscriber::Subscriber;
pub use subscription::{AnyCancellable, Subscription, SubscriptionHandle};
