//! Utility modules shared across the front-end:
//! - Source location tracking
//! - Diagnostics and ordered-diagnostic ranking
//! - Hard error types
//! - Symbol interning

pub mod diagnostics;
pub mod errors;
pub mod intern;
pub mod location;

// Re-exports
pub use diagnostics::{
    Diagnostic, DiagnosticsCollection, Level, OrderedDiagnostic, OrderedDiagnosticCollection,
};
pub use errors::{FrontendError, FrontendResult, SyntaxFault};
pub use intern::Symbol;
pub use location::{Location, SourceLocation, SourceMap, Span};
