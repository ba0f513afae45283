use std::any::Any;
use std::error::Error;
use std::fmt;

/// Error emitted through an observer's `error` channel when draining a
/// sequence is cut short by a panic.
///
/// Errors produced by a fallible sequence itself are passed to the observer
/// unwrapped; this type only covers failures the drain loop has to catch on
/// its own.
#[derive(Debug, Clone)]
pub enum IterationError {
    /// Obtaining or advancing the sequence cursor panicked. Carries the
    /// stringified panic payload.
    Cursor(String),

    /// A subscriber callback panicked and the `Forward` policy turned the
    /// panic into an error signal.
    Callback(String),
}

impl IterationError {
    pub(crate) fn cursor_panic(payload: &Box<dyn Any + Send>) -> Self {
        Self::Cursor(payload_message(payload))
    }

    pub(crate) fn callback_panic(payload: &Box<dyn Any + Send>) -> Self {
        Self::Callback(payload_message(payload))
    }
}

fn payload_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(m) = payload.downcast_ref::<&str>() {
        (*m).to_string()
    } else if let Some(m) = payload.downcast_ref::<String>() {
        m.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Display for IterationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Cursor(m) => write!(f, "sequence cursor panicked: {m}"),
            Self::Callback(m) => write!(f, "subscriber callback panicked: {m}"),
        }
    }
}

impl Error for IterationError {}
