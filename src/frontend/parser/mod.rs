//! Recursive-descent parser for Rill.
//!
//! The parser works over the trivia-filtered token list and recovers from
//! ill-formed input instead of aborting. Three layers of recovery apply:
//!
//! 1. Silent backtrack: a production whose opening tokens do not match
//!    restores the cursor and the next alternative is tried.
//! 2. Synthesized placeholders: a production that already committed emits a
//!    positioned diagnostic and substitutes a `Missing*` node at
//!    `previous_token.span.after()`, then parsing continues.
//! 3. Importance ranking: when every alternative for one input failed, the
//!    diagnostics of the alternatives that consumed the most tokens are
//!    reported and the rest are discarded.
//!
//! The working token list is mutable: closing `>>` of nested generics and
//! combined `@word` closure modifiers are split in place, and both the
//! pre-split and post-split views are recorded in the returned
//! [`ParserResult`].

mod def;
mod expr;
mod stmt;
mod ty;

pub use ty::AllowedType;

use crate::frontend::ast::{ParserResult, Stmt, StmtKind};
use crate::frontend::token::{AnalyzedKind, Token, TokenKind};
use crate::utils::diagnostics::{Diagnostic, DiagnosticsCollection, OrderedDiagnosticCollection};
use crate::utils::errors::SyntaxFault;
use crate::utils::intern::Symbol;
use crate::utils::location::{Location, Span};

/// Upper bound on parser steps; tripping it means a production stopped
/// making progress.
const MAX_PARSER_STEPS: usize = 1_000_000;

/// Parse a token stream into a [`ParserResult`].
///
/// The input should be the tokenizer's full-fidelity output; trivia is
/// filtered on intake. All problems are reported through `diagnostics`;
/// the result is returned even when errors were found.
pub fn parse(tokens: Vec<Token>, file: &str, diagnostics: &mut DiagnosticsCollection) -> ParserResult {
    run(tokens, file, diagnostics, ParseMode::File)
}

/// Parse a token stream as a single expression.
///
/// Top-level rules are relaxed: no trailing semicolon is required and the
/// one expression becomes the only top-level statement of the result.
pub fn parse_expression(
    tokens: Vec<Token>,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
) -> ParserResult {
    run(tokens, file, diagnostics, ParseMode::Expression)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    File,
    Expression,
}

fn run(
    tokens: Vec<Token>,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
    mode: ParseMode,
) -> ParserResult {
    let mut result = ParserResult {
        original_tokens: tokens.clone(),
        ..ParserResult::default()
    };
    let filtered = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();
    let mut parser = Parser::new(filtered, file, diagnostics);
    match mode {
        ParseMode::File => parser.parse_file(&mut result),
        ParseMode::Expression => parser.parse_single_expression(&mut result),
    }
    if let Some(fault) = parser.fault.take() {
        let diagnostic = if fault.internal {
            Diagnostic::internal_error(fault.message)
        } else {
            Diagnostic::error(fault.message)
        };
        parser.diagnostics.add(diagnostic.with_location(fault.location));
    }
    result.filtered_tokens = parser.tokens;
    result
}

/// The parser state: the mutable working token list, the cursor, and the
/// diagnostics sink.
pub(crate) struct Parser<'d> {
    /// Trivia-filtered working list; splits happen in place
    pub(crate) tokens: Vec<Token>,
    /// Cursor into `tokens`
    pub(crate) pos: usize,
    /// File URI for locations
    pub(crate) file: String,
    /// Diagnostics sink
    pub(crate) diagnostics: &'d mut DiagnosticsCollection,
    /// The one unrecoverable fault; set pins the cursor to end-of-input
    fault: Option<SyntaxFault>,
    /// Step counter backing the endless-loop guard
    steps: usize,
}

impl<'d> Parser<'d> {
    fn new(tokens: Vec<Token>, file: &str, diagnostics: &'d mut DiagnosticsCollection) -> Self {
        Self {
            tokens,
            pos: 0,
            file: file.to_string(),
            diagnostics,
            fault: None,
            steps: 0,
        }
    }

    // -- cursor -----------------------------------------------------------

    pub(crate) fn is_at_end(&self) -> bool {
        self.fault.is_some() || self.pos >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        if self.fault.is_some() {
            return None;
        }
        self.tokens.get(self.pos)
    }

    pub(crate) fn previous(&self) -> Option<&Token> {
        self.tokens.get(self.pos.checked_sub(1)?)
    }

    /// Look `offset` tokens past the cursor without consuming.
    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        if self.fault.is_some() {
            return None;
        }
        self.tokens.get(self.pos + offset)
    }

    /// The restore point for backtracking.
    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    /// Roll the cursor back to a restore point.
    pub(crate) fn restore(&mut self, mark: usize) {
        if self.fault.is_none() {
            self.pos = mark;
        }
    }

    /// Consume the current token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        if self.fault.is_some() {
            return None;
        }
        self.steps += 1;
        if self.steps > MAX_PARSER_STEPS {
            self.fault = Some(SyntaxFault::internal(
                "Parser exceeded its iteration limit",
                self.here(),
            ));
            return None;
        }
        let token = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(token)
    }

    /// Record the unrecoverable fault and pin the cursor so every loop
    /// terminates.
    pub(crate) fn stall(&mut self, message: &str) {
        if self.fault.is_none() {
            self.fault = Some(SyntaxFault::internal(message, self.here()));
        }
    }

    // -- locations --------------------------------------------------------

    pub(crate) fn location(&self, span: Span) -> Location {
        Location::new(span, self.file.clone())
    }

    /// The location of the current token, or end-of-input.
    pub(crate) fn here(&self) -> Location {
        let span = match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => self
                .tokens
                .last()
                .map(|t| t.span.after())
                .unwrap_or(Span::default()),
        };
        self.location(span)
    }

    /// The zero-width location just past the previously consumed token.
    /// Missing nodes anchor here.
    pub(crate) fn after_previous(&self) -> Location {
        let span = self
            .previous()
            .map(|t| t.span.after())
            .unwrap_or_else(|| self.here().span);
        self.location(span)
    }

    /// The span from a marked token index to the previously consumed token.
    pub(crate) fn span_since(&self, mark: usize) -> Span {
        let start = self
            .tokens
            .get(mark)
            .map(|t| t.span)
            .unwrap_or_else(|| self.after_previous().span);
        let end = self.previous().map(|t| t.span).unwrap_or(start);
        start.union(&end)
    }

    // -- token probes -----------------------------------------------------

    pub(crate) fn check_operator(&self, op: &str) -> bool {
        self.peek().map(|t| t.is_operator(op)).unwrap_or(false)
    }

    pub(crate) fn check_keyword(&self, sym: Symbol) -> bool {
        self.peek().map(|t| t.is_symbol(sym)).unwrap_or(false)
    }

    /// Consume the given operator, leaving the cursor unchanged on a miss.
    pub(crate) fn expect_operator(&mut self, op: &str) -> Option<Token> {
        if self.check_operator(op) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume any of the given operators.
    pub(crate) fn expect_any_operator(&mut self, ops: &[&str]) -> Option<Token> {
        if self.peek().map(|t| t.is_operator_of(ops)).unwrap_or(false) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume a non-keyword identifier.
    pub(crate) fn expect_identifier(&mut self) -> Option<Token> {
        let token = self.peek()?;
        if token.kind == TokenKind::Identifier
            && !token
                .symbol
                .is_some_and(crate::utils::intern::keywords::is_keyword)
        {
            self.advance()
        } else {
            None
        }
    }

    /// Consume a specific keyword.
    pub(crate) fn expect_keyword(&mut self, sym: Symbol) -> Option<Token> {
        if self.check_keyword(sym) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume any literal token.
    pub(crate) fn expect_literal(&mut self) -> Option<Token> {
        if self.peek().map(|t| t.kind.is_literal()).unwrap_or(false) {
            self.advance()
        } else {
            None
        }
    }

    // -- analyzed-kind tagging and token mutation -------------------------

    /// Re-tag the previously consumed token and return the tagged copy.
    pub(crate) fn tag_previous(&mut self, kind: AnalyzedKind) -> Token {
        let index = self.pos - 1;
        self.tokens[index].analyzed_kind = kind;
        self.tokens[index].clone()
    }

    /// Split the current token at byte `n` in place. The cursor then sits
    /// on the first half.
    pub(crate) fn split_current(&mut self, n: usize) -> bool {
        let Some(token) = self.tokens.get(self.pos) else {
            return false;
        };
        let Some((head, tail)) = token.slice_at(n) else {
            return false;
        };
        self.tokens.splice(self.pos..self.pos + 1, [head, tail]);
        true
    }

    // -- recovery helpers -------------------------------------------------

    /// Report a positioned error at the expected-token location and return
    /// a synthesized stand-in token.
    pub(crate) fn missing_token(&mut self, kind: TokenKind, expected: &str, what: &str) -> Token {
        let location = self.after_previous();
        self.diagnostics
            .add(Diagnostic::error(format!("Expected {}", what)).with_location(location.clone()));
        Token::missing(kind, expected, location.span)
    }

    /// Consume the given operator or diagnose and synthesize it. The
    /// synthesized token is not spliced into the working list.
    pub(crate) fn expect_operator_or_missing(&mut self, op: &str) -> Token {
        match self.expect_operator(op) {
            Some(token) => token,
            None => self.missing_token(TokenKind::Operator, op, &format!("'{}'", op)),
        }
    }

    /// Run one alternative of a competing set. On success its diagnostics
    /// are committed; on failure they move into `candidates` keyed by how
    /// far the alternative advanced, and the cursor is restored.
    pub(crate) fn attempt<T>(
        &mut self,
        candidates: &mut OrderedDiagnosticCollection,
        alternative: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        let mark = self.mark();
        let scope = self.diagnostics.push_override();
        match alternative(self) {
            Some(value) => {
                self.diagnostics.commit_override(scope);
                Some(value)
            }
            None => {
                let consumed = self.pos.saturating_sub(mark);
                for diagnostic in self.diagnostics.take_override(scope) {
                    candidates.add(consumed, diagnostic);
                }
                self.restore(mark);
                None
            }
        }
    }

    // -- top level --------------------------------------------------------

    fn parse_file(&mut self, result: &mut ParserResult) {
        while !self.is_at_end() {
            let before = self.pos;
            self.parse_top_item(result);
            if !self.is_at_end() && self.pos == before {
                // A top item neither consumed tokens nor recovered.
                self.stall("Parser failed to advance at the top level");
            }
        }
    }

    fn parse_single_expression(&mut self, result: &mut ParserResult) {
        let expr = match self.try_parse_expression() {
            Some(expr) => expr,
            None => {
                self.diagnostics.add(
                    Diagnostic::error("Expected an expression").with_location(self.here()),
                );
                crate::frontend::ast::Expr::missing(self.after_previous())
            }
        };
        let location = expr.location.clone();
        result
            .top_level_statements
            .push(Stmt::new(StmtKind::Expression(expr), location));
        if !self.is_at_end() {
            let location = self.here();
            self.diagnostics.add(
                Diagnostic::error("Unexpected content after the expression")
                    .with_location(location),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use std::collections::HashSet;

    pub(crate) fn parse_source(source: &str) -> (ParserResult, DiagnosticsCollection) {
        let mut diagnostics = DiagnosticsCollection::new();
        let tokens = tokenize(source, "test.rill", &mut diagnostics, &HashSet::new());
        let result = parse(tokens, "test.rill", &mut diagnostics);
        (result, diagnostics)
    }

    #[test]
    fn test_empty_input() {
        let (result, diagnostics) = parse_source("");
        assert!(result.functions.is_empty());
        assert!(result.structs.is_empty());
        assert!(result.top_level_statements.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_filtered_tokens_have_no_trivia() {
        let (result, _) = parse_source("int x = 1; // comment\n");
        assert!(result.filtered_tokens.iter().all(|t| !t.kind.is_trivia()));
        assert!(result.original_tokens.iter().any(|t| t.kind.is_trivia()));
    }

    #[test]
    fn test_parse_expression_mode() {
        let mut diagnostics = DiagnosticsCollection::new();
        let tokens = tokenize("1 + 2 * 3", "test.rill", &mut diagnostics, &HashSet::new());
        let result = parse_expression(tokens, "test.rill", &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(result.top_level_statements.len(), 1);
        match &result.top_level_statements[0].kind {
            StmtKind::Expression(expr) => assert_eq!(expr.to_string(), "1 + 2 * 3"),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_expression_mode_rejects_trailing() {
        let mut diagnostics = DiagnosticsCollection::new();
        let tokens = tokenize("1 + 2; int x;", "test.rill", &mut diagnostics, &HashSet::new());
        let _ = parse_expression(tokens, "test.rill", &mut diagnostics);
        assert!(diagnostics.has_errors());
    }
}
