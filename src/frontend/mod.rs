//! Frontend: tokenizer, preprocessor, parser, AST, and walker for Rill.
//!
//! The pipeline is `source text → tokens → ParserResult`:
//!
//! ```text
//! tokenize(source) ──► full-fidelity token stream (preprocessor applied)
//! parse(tokens)    ──► AST + diagnostics, trivia filtered on intake
//! ```
//!
//! Both stages append to one [`DiagnosticsCollection`] and neither aborts
//! on ill-formed input: the parser backtracks, synthesizes `Missing*`
//! placeholder nodes, and ranks competing failure explanations so only
//! the most promising ones are reported.
//!
//! [`DiagnosticsCollection`]: crate::utils::diagnostics::DiagnosticsCollection

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod token;
pub mod walker;

// Re-exports
pub use ast::ParserResult;
pub use lexer::tokenize;
pub use parser::{parse, parse_expression, AllowedType};
pub use preprocessor::Preprocessor;
pub use token::{AnalyzedKind, Token, TokenKind};
pub use walker::{walk_expression, walk_statement, walk_statement_linked, walk_type, Node};

use crate::utils::diagnostics::DiagnosticsCollection;
use std::collections::HashSet;

/// Tokenize and parse a source buffer in one step.
pub fn parse_source(
    source: &str,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
    initial_defines: &HashSet<String>,
) -> ParserResult {
    let tokens = tokenize(source, file, diagnostics, initial_defines);
    parse(tokens, file, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_pipeline() {
        let mut diagnostics = DiagnosticsCollection::new();
        let result = parse_source(
            "int add(int a, int b) { return a + b; }",
            "test.rill",
            &mut diagnostics,
            &HashSet::new(),
        );
        assert!(diagnostics.is_empty());
        assert_eq!(result.functions.len(), 1);
    }
}
