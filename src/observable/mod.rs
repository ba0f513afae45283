//! The `observable` module provides the `Observable` type and the iterable
//! conversion constructors that expose pull-based sequences as push-based
//! observable streams.

use std::{
    error::Error,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use crate::errors::IterationError;
use crate::observer::Observer;
use crate::subscription::subscribe::{
    CancelFlag, Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
};

/// What to do when a subscriber callback panics while a sequence is being
/// drained into it.
///
/// The policy only concerns panics raised inside the subscriber's own `next`
/// and `complete` handlers. Panics raised by the sequence cursor itself are
/// always caught and reported through the `error` channel, regardless of
/// policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallbackPanicPolicy {
    /// Let the panic unwind out of the subscribe call. The default.
    #[default]
    Propagate,

    /// Convert the panic into a single `error` call carrying
    /// [`IterationError::Callback`] and stop draining.
    Forward,

    /// Discard the panic and keep draining the remaining elements.
    Swallow,
}

/// The `Observable` struct represents a source of values that can be
/// observed by subscribing to it.
///
/// An `Observable` wraps a first-class subscribe function: invoking
/// [`subscribe`] hands a [`Subscriber`] to that function, which delivers
/// values to it and returns a [`Subscription`].
///
/// Observables built with the `from_iter` family drain their sequence
/// synchronously on the subscribing thread: the subscribe call blocks until
/// the sequence is exhausted, fails, or observes cancellation. Use a thread
/// or a Tokio task around the subscribe call if off-thread delivery is
/// needed; the returned [`Subscription`] can store the join handle.
///
/// # Example
///
/// ```
/// use rxi::subscribe::Subscriber;
/// use rxi::{Observable, Subscribeable};
///
/// let mut observable = Observable::from_iter(vec![1, 2, 3]);
///
/// let observer = Subscriber::new(
///     |v| println!("emitted {}", v),
///     |e| eprintln!("error: {}", e),
///     || println!("completed"),
/// );
///
/// // Blocks until the whole vector is delivered, then prints "completed".
/// observable.subscribe(observer);
/// ```
///
/// [`subscribe`]: trait.Subscribeable.html#tymethod.subscribe
/// [`Subscriber`]: ../subscription/subscribe/struct.Subscriber.html
/// [`Subscription`]: ../subscription/subscribe/struct.Subscription.html
pub struct Observable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send + Sync>,
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// The closure `sf` defines the behavior of the `Observable` when
    /// subscribed to: it receives the `Subscriber`, manages delivery of
    /// values to it, and returns a `Subscription` for the caller.
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Box::new(sf),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Exposes an iterable sequence as an `Observable`.
    ///
    /// Each subscribe call obtains a fresh cursor by cloning the sequence, so
    /// independent subscriptions each receive the full replay, in cursor
    /// order, followed by exactly one `complete` call. Whether replaying the
    /// sequence is idempotent or has side effects is a property of the
    /// concrete source, not of this adapter.
    ///
    /// Between element deliveries the drain loop checks the subscriber's
    /// [`CancelFlag`]; once the flag is set, delivery stops with no further
    /// callbacks, terminal ones included.
    ///
    /// A panic raised while obtaining or advancing the cursor is caught and
    /// reported as a single `error` call carrying
    /// [`IterationError::Cursor`]; it does not escape the subscribe call.
    /// Panics from the subscriber's own callbacks unwind out of the
    /// subscribe call; see [`Observable::from_iter_with_policy`] to change
    /// that.
    ///
    /// The sequence is not required to be finite, but an infinite one never
    /// completes and blocks the subscribing thread until cancelled.
    ///
    /// # Example
    ///
    /// ```
    /// use rxi::subscribe::Subscriber;
    /// use rxi::{Observable, Subscribeable};
    ///
    /// let mut observable = Observable::from_iter(1..=10);
    /// observable.subscribe(Subscriber::on_next(|v| println!("emitted {}", v)));
    /// ```
    ///
    /// [`CancelFlag`]: ../subscription/subscribe/struct.CancelFlag.html
    pub fn from_iter<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Self::from_iter_with_policy(iterable, CallbackPanicPolicy::default())
    }

    /// Like [`Observable::from_iter`], with an explicit policy for panics
    /// raised inside the subscriber's `next` and `complete` handlers.
    pub fn from_iter_with_policy<I>(iterable: I, policy: CallbackPanicPolicy) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Observable::new(move |mut o: Subscriber<T>| {
            let flag = o.cancel_flag();
            drain(iterable.clone(), &mut o, &flag, policy);
            Subscription::with_cancel_flag(UnsubscribeLogic::Nil, SubscriptionHandle::Nil, flag)
        })
    }

    /// Exposes a fallible iterable sequence as an `Observable`.
    ///
    /// The sequence yields `Result` items. `Ok` values are delivered through
    /// `next` in cursor order; the first `Err` halts the drain and is passed
    /// to the subscriber as exactly one `error` call carrying the original
    /// cause, with no `complete` afterwards. Elements delivered before the
    /// failing advancement remain valid; nothing is rolled back or replayed.
    ///
    /// # Example
    ///
    /// ```
    /// use rxi::subscribe::Subscriber;
    /// use rxi::{Observable, Subscribeable};
    ///
    /// let lines = vec!["3", "5", "seven", "11"];
    /// let mut observable =
    ///     Observable::from_fallible_iter(lines.into_iter().map(|l| l.parse::<i32>()));
    ///
    /// let observer = Subscriber::new(
    ///     |v| println!("parsed {}", v),
    ///     |e| eprintln!("stopped: {}", e),
    ///     || println!("completed"),
    /// );
    ///
    /// // Prints 3 and 5, then "stopped" with the parse error. No completion.
    /// observable.subscribe(observer);
    /// ```
    pub fn from_fallible_iter<I, E>(iterable: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>> + Clone + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::from_fallible_iter_with_policy(iterable, CallbackPanicPolicy::default())
    }

    /// Like [`Observable::from_fallible_iter`], with an explicit policy for
    /// panics raised inside the subscriber's `next` and `complete` handlers.
    pub fn from_fallible_iter_with_policy<I, E>(iterable: I, policy: CallbackPanicPolicy) -> Self
    where
        I: IntoIterator<Item = Result<T, E>> + Clone + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
    {
        Observable::new(move |mut o: Subscriber<T>| {
            let flag = o.cancel_flag();
            drain_fallible(iterable.clone(), &mut o, &flag, policy);
            Subscription::with_cancel_flag(UnsubscribeLogic::Nil, SubscriptionHandle::Nil, flag)
        })
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        (self.subscribe_fn)(v)
    }
}

// Outcome of a single cursor advancement once panics and cancellation are
// accounted for.
enum Step<T> {
    Item(T),
    Exhausted,
    Halted,
}

fn drain<T, I>(iterable: I, o: &mut Subscriber<T>, flag: &CancelFlag, policy: CallbackPanicPolicy)
where
    I: IntoIterator<Item = T>,
{
    let Some(mut cursor) = open_cursor(iterable, o) else {
        return;
    };
    loop {
        match advance(&mut cursor, o, flag) {
            Step::Item(v) => {
                if !deliver(o, v, policy) {
                    return;
                }
            }
            Step::Exhausted => break,
            Step::Halted => return,
        }
    }
    finish(o, policy);
}

fn drain_fallible<T, E, I>(
    iterable: I,
    o: &mut Subscriber<T>,
    flag: &CancelFlag,
    policy: CallbackPanicPolicy,
) where
    I: IntoIterator<Item = Result<T, E>>,
    E: Error + Send + Sync + 'static,
{
    let Some(mut cursor) = open_cursor(iterable, o) else {
        return;
    };
    loop {
        match advance(&mut cursor, o, flag) {
            Step::Item(Ok(v)) => {
                if !deliver(o, v, policy) {
                    return;
                }
            }
            Step::Item(Err(e)) => {
                o.error(Arc::new(e));
                return;
            }
            Step::Exhausted => break,
            Step::Halted => return,
        }
    }
    finish(o, policy);
}

// Obtains a fresh cursor, reporting a panicking `into_iter` through the
// error channel instead of letting it escape the subscribe call.
fn open_cursor<I, N>(iterable: I, o: &mut Subscriber<N>) -> Option<I::IntoIter>
where
    I: IntoIterator,
{
    match catch_unwind(AssertUnwindSafe(|| iterable.into_iter())) {
        Ok(cursor) => Some(cursor),
        Err(payload) => {
            o.error(Arc::new(IterationError::cursor_panic(&payload)));
            None
        }
    }
}

fn advance<C, T, N>(cursor: &mut C, o: &mut Subscriber<N>, flag: &CancelFlag) -> Step<T>
where
    C: Iterator<Item = T>,
{
    if flag.is_cancelled() {
        return Step::Halted;
    }
    match catch_unwind(AssertUnwindSafe(|| cursor.next())) {
        Ok(Some(v)) => Step::Item(v),
        Ok(None) => Step::Exhausted,
        Err(payload) => {
            o.error(Arc::new(IterationError::cursor_panic(&payload)));
            Step::Halted
        }
    }
}

// Returns false when the drain must stop because the `next` handler
// panicked under the `Forward` policy.
fn deliver<T>(o: &mut Subscriber<T>, v: T, policy: CallbackPanicPolicy) -> bool {
    match policy {
        CallbackPanicPolicy::Propagate => {
            o.next(v);
            true
        }
        CallbackPanicPolicy::Forward => match catch_unwind(AssertUnwindSafe(|| o.next(v))) {
            Ok(()) => true,
            Err(payload) => {
                o.error(Arc::new(IterationError::callback_panic(&payload)));
                false
            }
        },
        CallbackPanicPolicy::Swallow => {
            let _ = catch_unwind(AssertUnwindSafe(|| o.next(v)));
            true
        }
    }
}

fn finish<T>(o: &mut Subscriber<T>, policy: CallbackPanicPolicy) {
    match policy {
        CallbackPanicPolicy::Propagate => o.complete(),
        CallbackPanicPolicy::Forward => {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| o.complete())) {
                o.error(Arc::new(IterationError::callback_panic(&payload)));
            }
        }
        CallbackPanicPolicy::Swallow => {
            let _ = catch_unwind(AssertUnwindSafe(|| o.complete()));
        }
    }
}
