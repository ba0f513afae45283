//! `rxi` exposes pull-based iterable sequences as push-based observable
//! streams.
//!
//! The crate bridges the two abstractions with a single conversion operator:
//! [`Observable::from_iter`] (and its fallible and panic-policy variants)
//! turns anything that can hand out a fresh iteration cursor into an
//! [`Observable`] that, on subscribe, drains the cursor synchronously into
//! the registered [`Subscriber`], in cursor order, and signals exactly one
//! terminal event.
//!
//! The adapter itself is stateless and reentrant. Each subscribe call gets
//! its own cursor, so concurrent subscriptions to the same source are
//! independent of one another. There is no buffering, no backpressure and no
//! implicit scheduling: the subscribe call runs on the caller's thread and
//! blocks until the sequence is exhausted, fails, or observes cancellation
//! through the shared [`CancelFlag`]. Callers that want off-thread delivery
//! wrap the subscribe call in an OS thread or a Tokio task and store the
//! join handle in the returned [`Subscription`].
//!
//! # Example
//!
//! ```
//! use rxi::subscribe::Subscriber;
//! use rxi::{Observable, Subscribeable};
//!
//! let mut observable = Observable::from_iter(vec!["a", "b", "c"]);
//!
//! let observer = Subscriber::new(
//!     |v| println!("emitted {}", v),
//!     |e| eprintln!("error: {}", e),
//!     || println!("completed"),
//! );
//!
//! observable.subscribe(observer);
//! ```
//!
//! # Example: cancelling mid-drain
//!
//! ```
//! use rxi::subscribe::{CancelFlag, Subscriber};
//! use rxi::{Observable, Subscribeable};
//!
//! let mut observable = Observable::from_iter(0..);
//!
//! let flag = CancelFlag::new();
//! let flag_c = flag.clone();
//!
//! let mut seen = 0;
//! let mut observer = Subscriber::on_next(move |v| {
//!     println!("emitted {}", v);
//!     seen += 1;
//!     if seen == 5 {
//!         // Stops the otherwise infinite drain between elements.
//!         flag_c.cancel();
//!     }
//! });
//! observer.set_cancel_flag(flag);
//!
//! observable.subscribe(observer);
//! ```
//!
//! [`CancelFlag`]: subscribe/struct.CancelFlag.html
//! [`Subscriber`]: subscribe/struct.Subscriber.html
//! [`Subscription`]: subscribe/struct.Subscription.html

pub mod errors;
pub mod observable;
pub mod observer;
pub mod subscription;

pub use errors::IterationError;
pub use observable::{CallbackPanicPolicy, Observable};
pub use observer::Observer;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};

/// Convenience re-exports of the subscription machinery.
pub mod subscribe {
    pub use crate::subscription::subscribe::{
        CancelFlag, Subscribeable, Subscriber, Subscription, SubscriptionHandle,
        UnsubscribeLogic, Unsubscribeable,
    };
}
