use std::{error::Error, sync::Arc};

/// The sink side of a subscription.
///
/// An observer receives zero or more values through `next`, followed by at
/// most one terminal call: either `complete` or `error`, never both. No
/// `next` call may follow a terminal call.
pub trait Observer {
    /// The type of values this observer accepts.
    type Item;

    /// Delivers the next value of the sequence.
    fn next(&mut self, _: Self::Item);

    /// Signals that the sequence finished without error.
    fn complete(&mut self);

    /// Signals that the sequence failed. Terminal, like `complete`.
    fn error(&mut self, _: Arc<dyn Error + Send + Sync>);
}
