//! # rillc - Front-end for the Rill language
//!
//! The front-end of the Rill compiler: a tokenizer with an integrated
//! conditional preprocessor, a backtracking recursive-descent parser that
//! recovers from ill-formed input, and the diagnostics pipeline feeding
//! both. Semantic analysis and the code-generation back-ends live in the
//! surrounding toolchain and consume the [`ParserResult`] produced here.
//!
//! ## Architecture
//!
//! ```text
//! source text → tokens (preprocessor applied) → ParserResult (AST + diagnostics)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rillc::utils::diagnostics::DiagnosticsCollection;
//!
//! let source = r#"
//!     struct Point { int x; int y; }
//!
//!     int manhattan(Point p) {
//!         return p.x + p.y;
//!     }
//! "#;
//!
//! let mut diagnostics = DiagnosticsCollection::new();
//! let result = rillc::parse_source(source, "point.rill", &mut diagnostics);
//! assert!(!diagnostics.has_errors());
//! assert_eq!(result.structs.len(), 1);
//! assert_eq!(result.functions.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frontend;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::frontend::ast::*;
    pub use crate::frontend::walker::{
        walk_expression, walk_statement, walk_statement_linked, walk_type, Node,
    };
    pub use crate::frontend::{
        parse, parse_expression, tokenize, AllowedType, AnalyzedKind, Token, TokenKind,
    };
    pub use crate::source::{
        AsyncSourceProvider, CancellationToken, FileSourceProvider, LoadOutcome,
        MemorySourceProvider, SourceProvider, SourceProviderSet,
    };
    pub use crate::utils::diagnostics::{
        Diagnostic, DiagnosticsCollection, Level, OrderedDiagnostic, OrderedDiagnosticCollection,
    };
    pub use crate::utils::location::{Location, SourceLocation, Span};
}

use crate::frontend::ast::ParserResult;
use crate::utils::diagnostics::DiagnosticsCollection;
use anyhow::Result;
use std::collections::HashSet;

/// Configuration for a front-end run.
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    /// Preprocessor variables defined before the first token is read.
    pub preprocessor_defines: HashSet<String>,
}

impl FrontendConfig {
    /// Add a preprocessor definition.
    pub fn define(mut self, name: impl Into<String>) -> Self {
        self.preprocessor_defines.insert(name.into());
        self
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tokenize and parse one source file with the default configuration.
pub fn parse_source(
    source: &str,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
) -> ParserResult {
    frontend::parse_source(source, file, diagnostics, &HashSet::new())
}

/// Tokenize and parse one source file.
pub fn parse_source_with(
    source: &str,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
    config: &FrontendConfig,
) -> ParserResult {
    frontend::parse_source(source, file, diagnostics, &config.preprocessor_defines)
}

/// Parse one source file and fail on the first error-level diagnostic.
///
/// Warnings and hints are tolerated; the caller who wants them must use
/// [`parse_source`] and inspect the collection.
pub fn parse_source_checked(
    source: &str,
    file: &str,
    config: &FrontendConfig,
) -> Result<ParserResult> {
    let mut diagnostics = DiagnosticsCollection::new();
    let result = parse_source_with(source, file, &mut diagnostics, config);
    diagnostics.throw()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parse_source_checked() {
        let config = FrontendConfig::default();
        assert!(parse_source_checked("int x = 1;", "ok.rill", &config).is_ok());
        assert!(parse_source_checked("int x = ;", "bad.rill", &config).is_err());
    }

    #[test]
    fn test_config_defines() {
        let config = FrontendConfig::default().define("FEATURE");
        let source = "#if FEATURE\nint f() { return 1; }\n#endif\n";
        let result = parse_source_checked(source, "cfg.rill", &config).unwrap();
        assert_eq!(result.functions.len(), 1);
    }
}
