use std::{
    any::Any,
    error::Error,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle as ThreadJoinHandle,
};

use tokio::runtime;
use tokio::task::JoinHandle;

use crate::observer::Observer;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// the values of an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle
    /// emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values
    /// emitted by the observable stream. The returned `Subscription` lets the
    /// caller manage the subscription, such as unsubscribing or joining a
    /// thread or task the subscribe call was driven on.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types holding a cancellation handle that can be released.
///
/// Unsubscribing signals the emitting side to stop and renders the handle
/// permanently inert. The operation is idempotent: calling it on an already
/// released handle does nothing.
pub trait Unsubscribeable {
    /// Unsubscribes and runs the associated release logic at most once.
    fn unsubscribe(&mut self);
}

/// Cooperative cancellation flag shared between a drain loop, the
/// `Subscriber` it feeds and the `Subscription` handed back to the caller.
///
/// The flag is checked between element deliveries. Once set, no further
/// `next`, `complete` or `error` calls are made for that subscription.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Visible to every clone of this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send + Sync>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send + Sync>;

/// A type that acts as an observer, allowing users to handle emitted values,
/// errors, and completion when subscribing to an `Observable`.
///
/// Users create a `Subscriber` with the `new` method, providing custom
/// functions for the `next`, `error`, and `complete` events, or with
/// [`Subscriber::on_next`] when only value handling is needed.
///
/// A `Subscriber` tracks its own terminal state: after it has observed a
/// `complete` or `error` call, or after its [`CancelFlag`] has been set,
/// every further event is silently dropped.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    completed: bool,
    errored: bool,
    cancelled: CancelFlag,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for
    /// emitted values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
        complete_fn: impl FnMut() + 'static + Send + Sync,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            completed: false,
            errored: false,
            cancelled: CancelFlag::new(),
        }
    }

    /// Create a new `Subscriber` with the provided `next` function only.
    ///
    /// The `next` closure is called for each item the observable emits;
    /// completion and errors are dropped unless handlers are added later
    /// with [`Subscriber::on_complete`] and [`Subscriber::on_error`].
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            completed: false,
            errored: false,
            cancelled: CancelFlag::new(),
        }
    }

    /// Set the completion function for the `Subscriber`.
    ///
    /// The provided closure will be called when the observable completes its
    /// emission sequence.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send + Sync) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the `Subscriber`.
    ///
    /// The provided closure will be called when the observable signals an
    /// error during its emission sequence.
    pub fn on_error(
        &mut self,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
    ) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns a clone of this subscriber's cancellation flag.
    ///
    /// Setting the flag, from any thread or from inside one of the
    /// subscriber's own callbacks, makes a drain loop observing it stop
    /// between element deliveries without emitting a terminal signal.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancelled.clone()
    }

    /// Replaces this subscriber's cancellation flag with `flag`.
    ///
    /// Lets handler closures built before the subscriber hold a clone of the
    /// flag and cancel the drain they participate in.
    pub fn set_cancel_flag(&mut self, flag: CancelFlag) {
        self.cancelled = flag;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }
}

impl<T> Observer for Subscriber<T> {
    type Item = T;

    fn next(&mut self, v: Self::Item) {
        if self.completed || self.errored || self.is_cancelled() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.completed || self.errored || self.is_cancelled() {
            return;
        }
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
        self.completed = true;
    }

    fn error(&mut self, observable_error: Arc<dyn Error + Send + Sync>) {
        if self.completed || self.errored || self.is_cancelled() {
            return;
        }
        if let Some(efn) = &mut self.error_fn {
            (efn)(observable_error);
        }
        self.errored = true;
    }
}

/// Handles used by a `Subscription` to await the OS thread or Tokio task a
/// caller chose to drive a subscribe call on.
///
/// The subscribe call itself is synchronous; asynchronous delivery is
/// obtained by wrapping it in a thread or task and storing the join handle
/// here.
pub enum SubscriptionHandle {
    /// No thread or task to await.
    Nil,

    /// Join handle of a Tokio task driving a subscribe call.
    JoinTask(JoinHandle<()>),

    /// Join handle of an OS thread driving a subscribe call.
    JoinThread(ThreadJoinHandle<()>),
}

/// Represents a subscription to an observable, allowing control over the
/// subscription.
///
/// Subscribing to an observable returns a `Subscription`. It can be used to
/// unsubscribe, to query whether unsubscription already happened, and to
/// await a thread or task the subscribe call was driven on.
pub struct Subscription {
    unsubscribe_logic: Option<UnsubscribeLogic>,
    subscription_future: SubscriptionHandle,
    runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
    closed: CancelFlag,
}

impl Subscription {
    /// Creates a new `Subscription` with the specified unsubscribe logic and
    /// subscription handle.
    ///
    /// The `unsubscribe_logic` parameter defines what happens upon
    /// unsubscribing; see [`UnsubscribeLogic`] for the available strategies.
    /// The `subscription_future` parameter holds a handle for awaiting a
    /// thread or task associated with the subscription; see
    /// [`SubscriptionHandle`].
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        Self::with_cancel_flag(unsubscribe_logic, subscription_future, CancelFlag::new())
    }

    /// Creates a `Subscription` that shares `flag` with the emitting side.
    ///
    /// Unsubscribing sets the shared flag, so a drain loop checking it stops
    /// between element deliveries, and `is_unsubscribed` reflects
    /// cancellation requested from either end.
    #[must_use]
    pub fn with_cancel_flag(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
        flag: CancelFlag,
    ) -> Self {
        let runtime_handle = runtime::Handle::try_current();
        Subscription {
            unsubscribe_logic: Some(unsubscribe_logic),
            subscription_future,
            runtime_handle,
            closed: flag,
        }
    }

    /// The inert subscription: all work it could cancel already finished
    /// before it was created, so unsubscribing only marks it closed.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    }

    /// Returns `true` once `unsubscribe` has been called or the shared
    /// cancellation flag has been set by the emitting side.
    #[must_use]
    pub fn is_unsubscribed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Awaits the completion of the Tokio task or OS thread associated with
    /// this subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if joining the thread or awaiting the task fails.
    pub async fn join_concurrent(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => {
                let r = task_handle.await;
                r.map_err(|e| Box::new(e) as Box<dyn Any + Send>)
            }
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    /// Awaits the completion of the OS thread associated with this
    /// subscription, blocking the current thread.
    ///
    /// Useful when using `rxi` without `Tokio` in a project.
    ///
    /// # Errors
    ///
    /// Returns an error if joining the thread fails.
    ///
    /// # Panics
    ///
    /// Panics if the stored handle is a Tokio task handle. Use
    /// `join_concurrent().await` for those.
    pub fn join(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
            SubscriptionHandle::JoinTask(_) => {
                panic!("handle is a Tokio task handle, not an OS thread handle. Use `join_concurrent().await` to await subscriptions driven on Tokio tasks.")
            }
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&mut self) {
        self.closed.cancel();
        if let Some(logic) = self.unsubscribe_logic.take() {
            logic.unsubscribe(&self.runtime_handle);
        }
    }
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. The wrapped subscription's
    /// unsubscribe will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous unsubscribe logic represented by a future. Use if you
    /// need to spawn `Tokio` tasks or `.await` as a part of the unsubscribe
    /// logic.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self, runtime_handle: &Result<runtime::Handle, runtime::TryCurrentError>) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => {
                let mut subscription = *subscription;
                subscription.unsubscribe();
            }
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Ok(handle) => {
                    handle.spawn(async {
                        future.await;
                    });
                }
                Err(_) => {
                    panic!("subscription with future unsubscribe logic was created outside of a Tokio runtime");
                }
            },
        }
    }
}
