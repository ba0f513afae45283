//! Error types reported on the observer error channel.

mod iteration_error;

pub use iteration_error::IterationError;
