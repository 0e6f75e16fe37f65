//! Error types for the front-end.
//!
//! Recoverable problems flow through the diagnostics collection; the types
//! here cover the hard failures that abort an operation outright.

use crate::utils::diagnostics::Diagnostic;
use crate::utils::location::Location;
use std::fmt;
use thiserror::Error;

/// Top-level error type for the front-end.
#[derive(Error, Debug)]
pub enum FrontendError {
    /// A diagnostic promoted to a hard error by `DiagnosticsCollection::throw`
    #[error("{0}")]
    Diagnostic(Diagnostic),

    /// An unrecoverable parse fault
    #[error("Syntax fault: {0}")]
    Syntax(#[from] SyntaxFault),

    /// Internal compiler error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The payload of the one unwind the parser supports.
///
/// Inner productions never raise; when the parser detects a state it cannot
/// recover from (a tripped iteration guard, a cursor that stopped moving),
/// it records a `SyntaxFault` and pins itself to end-of-input. The fault is
/// turned into an `Error` diagnostic at the top of `parse()` and the partial
/// result is still returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct SyntaxFault {
    /// What went wrong
    pub message: String,
    /// Where the parser was stuck
    pub location: Location,
    /// Whether this indicates a bug in the parser rather than in the input
    pub internal: bool,
}

impl SyntaxFault {
    /// A fault caused by ill-formed input.
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self { message: message.into(), location, internal: false }
    }

    /// A fault caused by an impossibility the implementation encountered.
    pub fn internal(message: impl Into<String>, location: Location) -> Self {
        Self { message: message.into(), location, internal: true }
    }
}

impl fmt::Display for SyntaxFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.internal {
            write!(f, "{} (this is an internal error) at {}", self.message, self.location)
        } else {
            write!(f, "{} at {}", self.message, self.location)
        }
    }
}

/// Result type using FrontendError.
pub type FrontendResult<T> = Result<T, FrontendError>;
