//! Tokenizer for Rill source text, with the conditional preprocessor
//! applied inline.
//!
//! The output stream is full fidelity: whitespace, line breaks, comments,
//! and preprocessor directives all become tokens, and tokens inside a
//! skipped `#if` region are re-typed `PreprocessSkipped` rather than
//! dropped so that every byte of the source stays covered. The parser
//! filters trivia on intake.

use crate::frontend::preprocessor::Preprocessor;
use crate::frontend::token::{operators, AnalyzedKind, Token, TokenKind};
use crate::utils::diagnostics::{Diagnostic, DiagnosticsCollection};
use crate::utils::intern::keywords;
use crate::utils::location::{Location, SourceLocation, Span};
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

/// A tokenizer for Rill source text.
pub struct Lexer<'a, 'd> {
    /// The source text
    source: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte offset
    offset: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start of current token
    token_start: SourceLocation,
    /// The file URI tokens and diagnostics are attributed to
    file: String,
    /// Conditional-inclusion state
    preprocessor: Preprocessor,
    /// Diagnostics sink
    diagnostics: &'d mut DiagnosticsCollection,
}

/// Tokenize a source buffer.
///
/// `initial_defines` seeds the preprocessor variable set.
pub fn tokenize(
    source: &str,
    file: &str,
    diagnostics: &mut DiagnosticsCollection,
    initial_defines: &HashSet<String>,
) -> Vec<Token> {
    Lexer::new(source, file, diagnostics, initial_defines).run()
}

impl<'a, 'd> Lexer<'a, 'd> {
    /// Create a new lexer for the given source.
    pub fn new(
        source: &'a str,
        file: &str,
        diagnostics: &'d mut DiagnosticsCollection,
        initial_defines: &HashSet<String>,
    ) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            token_start: SourceLocation::start(),
            file: file.to_string(),
            preprocessor: Preprocessor::new(initial_defines),
            diagnostics,
        }
    }

    /// Get the current location.
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.offset)
    }

    /// Mark the start of a new token.
    fn mark_token_start(&mut self) {
        self.token_start = self.current_location();
    }

    /// Create a span from token start to current location.
    fn make_span(&self) -> Span {
        Span::from_locations(self.token_start, self.current_location())
    }

    /// Peek at the current character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at the next character (one ahead).
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the current character.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the current character if it matches.
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Create a token spanning from the token start to the cursor.
    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let content = &self.source[span.start_offset..span.end_offset];
        if kind == TokenKind::Identifier {
            let mut token = Token::identifier(content, span);
            if token.symbol.is_some_and(keywords::is_keyword) {
                token.analyzed_kind = AnalyzedKind::Keyword;
            }
            token
        } else {
            Token::new(kind, content, span)
        }
    }

    /// Report a positioned diagnostic covering the current token.
    fn report(&mut self, diagnostic: Diagnostic) {
        let location = Location::new(self.make_span(), self.file.clone());
        self.diagnostics.add(diagnostic.with_location(location));
    }

    /// Tokenize the whole buffer.
    pub fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            self.mark_token_start();
            match c {
                ' ' | '\t' => {
                    while matches!(self.peek(), Some(' ') | Some('\t')) {
                        self.advance();
                    }
                    self.push(&mut tokens, self.make_token(TokenKind::Whitespace));
                }
                '\n' => {
                    self.advance();
                    self.push(&mut tokens, self.make_token(TokenKind::LineBreak));
                }
                '\r' => {
                    self.advance();
                    self.match_char('\n');
                    self.push(&mut tokens, self.make_token(TokenKind::LineBreak));
                }
                '/' if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') && self.peek() != Some('\r')
                    {
                        self.advance();
                    }
                    self.push(&mut tokens, self.make_token(TokenKind::Comment));
                }
                '/' if self.peek_next() == Some('*') => {
                    let token = self.scan_block_comment();
                    self.push(&mut tokens, token);
                }
                '"' => {
                    let token = self.scan_string();
                    self.push(&mut tokens, token);
                }
                '\'' => {
                    let token = self.scan_character();
                    self.push(&mut tokens, token);
                }
                '#' => self.scan_directive(&mut tokens),
                c if c.is_ascii_digit() => {
                    let token = self.scan_number();
                    self.push(&mut tokens, token);
                }
                c if unicode_xid::UnicodeXID::is_xid_start(c) || c == '_' => {
                    self.scan_word();
                    self.push(&mut tokens, self.make_token(TokenKind::Identifier));
                }
                _ => {
                    let token = self.scan_operator();
                    self.push(&mut tokens, token);
                }
            }
        }
        let eof = Location::new(Span::at(self.current_location()), self.file.clone());
        self.preprocessor.finish(eof, self.diagnostics);
        tokens
    }

    /// Append a token, re-typing it when inside a skipped region.
    fn push(&mut self, tokens: &mut Vec<Token>, mut token: Token) {
        if self.preprocessor.is_skipping() {
            token.kind = TokenKind::PreprocessSkipped;
        }
        tokens.push(token);
    }

    /// Consume an identifier/keyword word; the cursor sits on its start.
    fn scan_word(&mut self) {
        self.advance();
        while self
            .peek()
            .map(|c| unicode_xid::UnicodeXID::is_xid_continue(c) || c == '_')
            .unwrap_or(false)
        {
            self.advance();
        }
    }

    /// Scan a numeric literal (decimal, float, hex, or binary).
    fn scan_number(&mut self) -> Token {
        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('b')) {
            let binary = self.peek_next() == Some('b');
            self.advance();
            self.advance();
            let digits_valid: fn(char) -> bool = if binary {
                |c| matches!(c, '0' | '1' | '_')
            } else {
                |c| c.is_ascii_hexdigit() || c == '_'
            };
            while self.peek().map(digits_valid).unwrap_or(false) {
                self.advance();
            }
            let kind = if binary { TokenKind::LiteralBinary } else { TokenKind::LiteralHex };
            let token = self.make_token(kind);
            if token.content.len() < 3 {
                let message =
                    if binary { "Invalid binary literal" } else { "Invalid hex literal" };
                self.report(Diagnostic::error(message));
            }
            return token;
        }

        while self.peek().map(|c| c.is_ascii_digit() || c == '_').unwrap_or(false) {
            self.advance();
        }
        // A decimal point only belongs to the literal when digits follow.
        if self.peek() == Some('.')
            && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            self.advance();
            while self.peek().map(|c| c.is_ascii_digit() || c == '_').unwrap_or(false) {
                self.advance();
            }
            self.make_token(TokenKind::LiteralFloat)
        } else {
            self.make_token(TokenKind::LiteralNumber)
        }
    }

    /// Scan a string literal. The raw slice, quotes included, becomes the
    /// token content; unescaping happens at value extraction.
    fn scan_string(&mut self) -> Token {
        self.advance(); // opening quote
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('\n') | Some('\r') | None => {
                    self.report(Diagnostic::error("Unterminated string literal"));
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.make_token(TokenKind::LiteralString)
    }

    /// Scan a character literal.
    fn scan_character(&mut self) -> Token {
        self.advance(); // opening quote
        match self.peek() {
            Some('\\') => {
                self.advance();
                self.advance();
            }
            Some('\'') => {
                self.report(Diagnostic::error("Empty character literal"));
            }
            Some('\n') | Some('\r') | None => {}
            Some(_) => {
                self.advance();
            }
        }
        if !self.match_char('\'') {
            self.report(Diagnostic::error("Unterminated character literal"));
        }
        self.make_token(TokenKind::LiteralCharacter)
    }

    /// Scan a block comment, nesting-aware.
    fn scan_block_comment(&mut self) -> Token {
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1;
        while depth > 0 {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                None => {
                    self.report(Diagnostic::error("Unterminated block comment"));
                    break;
                }
                _ => {}
            }
        }
        self.make_token(TokenKind::CommentMultiline)
    }

    /// Scan an operator, longest match first.
    fn scan_operator(&mut self) -> Token {
        let rest = &self.source[self.offset..];
        for op in operators::MULTI_CHAR {
            if rest.starts_with(op) {
                self.advance();
                self.advance();
                return self.make_token(TokenKind::Operator);
            }
        }
        if let Some(c) = self.advance() {
            if !operators::SINGLE_CHAR.contains(&c) {
                self.report(Diagnostic::error(format!("Unexpected character '{}'", c)));
            }
        }
        self.make_token(TokenKind::Operator)
    }

    /// Scan a `#directive` with its rest-of-line argument and apply it to
    /// the preprocessor state.
    fn scan_directive(&mut self, tokens: &mut Vec<Token>) {
        self.advance(); // '#'
        if !self
            .peek()
            .map(|c| unicode_xid::UnicodeXID::is_xid_start(c) || c == '_')
            .unwrap_or(false)
        {
            self.report(Diagnostic::error("Expected a preprocessor tag after '#'"));
            let token = self.make_token(TokenKind::Operator);
            self.push(tokens, token);
            return;
        }
        self.scan_word();
        let directive = self.make_token(TokenKind::PreprocessIdentifier);
        let directive_location = Location::new(directive.span, self.file.clone());
        let name = directive.content[1..].to_string();
        let first = tokens.len();
        tokens.push(directive);

        // Inline whitespace, then the rest of the line as the argument.
        self.mark_token_start();
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
        if self.offset > self.token_start.offset {
            tokens.push(self.make_token(TokenKind::Whitespace));
        }
        self.mark_token_start();
        while self.peek().is_some() && self.peek() != Some('\n') && self.peek() != Some('\r') {
            self.advance();
        }
        let mut argument = None;
        if self.offset > self.token_start.offset {
            let token = self.make_token(TokenKind::PreprocessArgument);
            let trimmed = token.content.trim().to_string();
            if !trimmed.is_empty() {
                argument = Some(trimmed);
            }
            tokens.push(token);
        }

        // The tokens delimiting a region follow the skip state of the
        // frames enclosing the one the directive manipulates.
        let enclosing = match name.as_str() {
            "elseif" | "else" | "endif" => self.preprocessor.is_skipping_enclosing(),
            _ => self.preprocessor.is_skipping(),
        };
        self.preprocessor.directive(
            &name,
            argument.as_deref(),
            directive_location,
            self.diagnostics,
        );
        if enclosing {
            for token in &mut tokens[first..] {
                token.kind = TokenKind::PreprocessSkipped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, DiagnosticsCollection) {
        let mut diagnostics = DiagnosticsCollection::new();
        let tokens = tokenize(source, "test.rill", &mut diagnostics, &HashSet::new());
        (tokens, diagnostics)
    }

    fn lex_with(source: &str, defines: &[&str]) -> (Vec<Token>, DiagnosticsCollection) {
        let mut diagnostics = DiagnosticsCollection::new();
        let defines: HashSet<String> = defines.iter().map(|s| s.to_string()).collect();
        let tokens = tokenize(source, "test.rill", &mut diagnostics, &defines);
        (tokens, diagnostics)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn significant(tokens: &[Token]) -> Vec<&Token> {
        tokens.iter().filter(|t| !t.kind.is_trivia()).collect()
    }

    #[test]
    fn test_empty() {
        let (tokens, diagnostics) = lex("");
        assert!(tokens.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_full_fidelity() {
        let source = "int x = 1; // note\nfloat y;";
        let (tokens, _) = lex(source);
        let rebuilt: String = tokens.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_keywords_tagged() {
        let (tokens, _) = lex("struct point_of_interest");
        assert_eq!(tokens[0].analyzed_kind, AnalyzedKind::Keyword);
        assert_eq!(tokens[2].analyzed_kind, AnalyzedKind::Plain);
    }

    #[test]
    fn test_numbers() {
        let (tokens, diagnostics) = lex("12 1_000 3.14 0xff_a 0b1010");
        let sig = significant(&tokens);
        assert_eq!(
            kinds(&sig.iter().map(|t| (*t).clone()).collect::<Vec<_>>()),
            vec![
                TokenKind::LiteralNumber,
                TokenKind::LiteralNumber,
                TokenKind::LiteralFloat,
                TokenKind::LiteralHex,
                TokenKind::LiteralBinary,
            ]
        );
        assert_eq!(sig[1].integer_value(), 1000);
        assert_eq!(sig[3].integer_value(), 0xffa);
        assert_eq!(sig[4].integer_value(), 10);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_hex_and_binary() {
        let (tokens, diagnostics) = lex("0x 0b");
        let sig = significant(&tokens);
        assert_eq!(sig[0].integer_value(), 0);
        assert_eq!(sig[1].integer_value(), 0);
        let mut rendered = String::new();
        diagnostics.write_errors_to(&mut rendered).unwrap();
        assert!(rendered.contains("Invalid hex literal"));
        assert!(rendered.contains("Invalid binary literal"));
    }

    #[test]
    fn test_field_access_is_not_float() {
        let (tokens, _) = lex("1.x");
        let sig = significant(&tokens);
        assert_eq!(sig[0].kind, TokenKind::LiteralNumber);
        assert!(sig[1].is_operator("."));
        assert_eq!(sig[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_shift_right_is_one_token() {
        let (tokens, _) = lex("a >> b");
        let sig = significant(&tokens);
        assert!(sig[1].is_operator(">>"));
    }

    #[test]
    fn test_multi_char_operators() {
        let (tokens, _) = lex("<= => -> ++ -- += &&");
        let sig = significant(&tokens);
        let contents: Vec<_> = sig.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["<=", "=>", "->", "++", "--", "+=", "&&"]);
    }

    #[test]
    fn test_string_and_char_literals() {
        let (tokens, diagnostics) = lex(r#""he\"llo" 'x' '\n'"#);
        let sig = significant(&tokens);
        assert_eq!(sig[0].kind, TokenKind::LiteralString);
        assert_eq!(sig[0].string_value(), "he\"llo");
        assert_eq!(sig[1].char_value(), 'x');
        assert_eq!(sig[2].char_value(), '\n');
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diagnostics) = lex("\"oops\nint x;");
        assert!(diagnostics.has_errors());
        // The rest of the file still tokenizes.
        assert!(significant(&tokens).iter().any(|t| t.content == "int"));
    }

    #[test]
    fn test_comments() {
        let (tokens, _) = lex("a // line\n/* block /* nested */ */ b");
        assert!(kinds(&tokens).contains(&TokenKind::Comment));
        assert!(kinds(&tokens).contains(&TokenKind::CommentMultiline));
        let sig = significant(&tokens);
        assert_eq!(sig.len(), 2);
    }

    #[test]
    fn test_preprocessor_skipping() {
        let source = "#if FEATURE\nint f;\n#else\nint g;\n#endif\n";
        let (tokens, diagnostics) = lex_with(source, &["FEATURE"]);
        assert!(diagnostics.is_empty());
        let sig = significant(&tokens);
        let contents: Vec<_> = sig.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["int", "f", ";"]);
        // The skipped arm is preserved as PreprocessSkipped tokens.
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::PreprocessSkipped && t.content == "g"));

        let (tokens, _) = lex_with(source, &[]);
        let sig = significant(&tokens);
        let contents: Vec<_> = sig.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["int", "g", ";"]);
    }

    #[test]
    fn test_preprocessor_define_then_if() {
        let source = "#define A\n#if A\nint x;\n#endif\n";
        let (tokens, diagnostics) = lex(source);
        assert!(diagnostics.is_empty());
        assert!(significant(&tokens).iter().any(|t| t.content == "x"));
    }

    #[test]
    fn test_preprocessor_spans_preserved() {
        let source = "#if A\nskip me\n#endif\n";
        let (tokens, _) = lex(source);
        let rebuilt: String = tokens.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_unclosed_if_warns() {
        let (_, diagnostics) = lex("#if A\nint x;\n");
        assert!(!diagnostics.is_empty());
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diagnostics) = lex("int $ x;");
        assert!(diagnostics.has_errors());
        // The stray byte still occupies a token.
        let rebuilt: String = tokens.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(rebuilt, "int $ x;");
    }

    #[test]
    fn test_location_tracking() {
        let (tokens, _) = lex("foo\nbar");
        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[2].span.start_line, 2);
        assert_eq!(tokens[2].span.start_column, 1);
    }
}
