//! Provides structures and traits related to subscription management.
//!
//! This module includes types such as `Subscriber` for handling observed
//! values, errors, and completions, as well as `Subscription` for controlling
//! subscriptions to observables.
//!
//! Additionally, it defines the shared cancellation flag, the handles used
//! for awaiting subscribe calls driven on threads or tasks, and the
//! unsubscribe logic variants.
pub mod subscribe;
