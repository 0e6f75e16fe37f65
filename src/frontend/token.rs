//! Token types produced by the tokenizer.
//!
//! Tokens keep the raw source slice, their span, and a mutable
//! `analyzed_kind` slot that the parser overwrites with the semantic color
//! category an external syntax highlighter consumes. The stream is
//! full-fidelity: whitespace, line breaks, comments, and preprocessor
//! tokens are all present, and tokens inside skipped `#if` regions are
//! re-typed rather than removed so source spans stay exact.

use crate::utils::intern::{self, Symbol};
use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Identifier (or keyword; keywords are classified by symbol)
    Identifier,
    /// Decimal integer literal
    LiteralNumber,
    /// Floating-point literal
    LiteralFloat,
    /// Hexadecimal literal (`0x…`)
    LiteralHex,
    /// Binary literal (`0b…`)
    LiteralBinary,
    /// String literal
    LiteralString,
    /// Character literal
    LiteralCharacter,
    /// Operator or punctuation
    Operator,
    /// Run of spaces and tabs
    Whitespace,
    /// `\n` or `\r\n`
    LineBreak,
    /// Line comment `// …`
    Comment,
    /// Block comment `/* … */`
    CommentMultiline,
    /// `#word` preprocessor directive
    PreprocessIdentifier,
    /// Rest-of-line argument of a preprocessor directive
    PreprocessArgument,
    /// Any token inside a conditionally skipped region
    PreprocessSkipped,
}

impl TokenKind {
    /// Check whether the parser filters this kind out on intake.
    pub fn is_trivia(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Whitespace
                | LineBreak
                | Comment
                | CommentMultiline
                | PreprocessIdentifier
                | PreprocessArgument
                | PreprocessSkipped
        )
    }

    /// Check whether this kind is a literal.
    pub fn is_literal(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            LiteralNumber | LiteralFloat | LiteralHex | LiteralBinary | LiteralString
                | LiteralCharacter
        )
    }

    /// Get a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Identifier => "identifier",
            LiteralNumber => "number",
            LiteralFloat => "float",
            LiteralHex => "hex literal",
            LiteralBinary => "binary literal",
            LiteralString => "string",
            LiteralCharacter => "character",
            Operator => "operator",
            Whitespace => "whitespace",
            LineBreak => "line break",
            Comment => "comment",
            CommentMultiline => "block comment",
            PreprocessIdentifier => "preprocessor directive",
            PreprocessArgument => "preprocessor argument",
            PreprocessSkipped => "skipped",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Semantic color category, assigned during tokenizing (keywords) and
/// parsing (everything else), consumed by an external highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalyzedKind {
    /// No category assigned
    #[default]
    Plain,
    /// Language keyword
    Keyword,
    /// Type name in type position
    TypeName,
    /// Struct name at its definition
    StructName,
    /// Function or method name
    FunctionName,
    /// Field name
    FieldName,
    /// Parameter name
    ParameterName,
    /// Local variable name
    VariableName,
    /// Modifier keyword
    Modifier,
    /// Attribute name
    Attribute,
    /// Instruction label
    Label,
}

/// A token in the source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The raw source slice
    pub content: String,
    /// The source span
    pub span: Span,
    /// True when the tokenizer or parser fabricated this token for recovery
    pub synthetic: bool,
    /// Mutable highlight-category slot
    pub analyzed_kind: AnalyzedKind,
    /// Interned handle, present on identifier-shaped tokens
    pub symbol: Option<Symbol>,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, content: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            content: content.into(),
            span,
            synthetic: false,
            analyzed_kind: AnalyzedKind::Plain,
            symbol: None,
        }
    }

    /// Create an identifier token, interning its content.
    pub fn identifier(content: impl Into<String>, span: Span) -> Self {
        let content = content.into();
        let symbol = Some(intern::intern(&content));
        Self {
            kind: TokenKind::Identifier,
            content,
            span,
            synthetic: false,
            analyzed_kind: AnalyzedKind::Plain,
            symbol,
        }
    }

    /// Create a synthesized token standing in for an expected one.
    pub fn missing(kind: TokenKind, expected: impl Into<String>, at: Span) -> Self {
        let content = expected.into();
        let symbol = if kind == TokenKind::Identifier {
            Some(intern::intern(&content))
        } else {
            None
        };
        Self {
            kind,
            content,
            span: at,
            synthetic: true,
            analyzed_kind: AnalyzedKind::Plain,
            symbol,
        }
    }

    /// Check for a specific operator.
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.content == op
    }

    /// Check for any of the given operators.
    pub fn is_operator_of(&self, ops: &[&str]) -> bool {
        self.kind == TokenKind::Operator && ops.iter().any(|op| self.content == *op)
    }

    /// Check for an identifier with a specific interned symbol.
    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Identifier && self.symbol == Some(symbol)
    }

    /// Concatenate two adjacent tokens into one spanning both.
    ///
    /// Returns `None` when the tokens are not adjacent in the source.
    pub fn concat(&self, other: &Token) -> Option<Token> {
        if self.span.end_offset != other.span.start_offset {
            return None;
        }
        let mut content = self.content.clone();
        content.push_str(&other.content);
        let mut merged = Token::new(self.kind, content, self.span.union(&other.span));
        merged.synthetic = self.synthetic || other.synthetic;
        Some(merged)
    }

    /// Split this token at byte `n` of its content.
    ///
    /// Returns `None` (a null partition) when `n` is not a character
    /// boundary or falls outside the content.
    pub fn slice_at(&self, n: usize) -> Option<(Token, Token)> {
        if n == 0 || n >= self.content.len() || !self.content.is_char_boundary(n) {
            return None;
        }
        let mut head = Token::new(self.kind, &self.content[..n], self.span.slice_to(n));
        let mut tail = Token::new(self.kind, &self.content[n..], self.span.slice_from(n));
        head.synthetic = self.synthetic;
        tail.synthetic = self.synthetic;
        if self.kind == TokenKind::Identifier {
            head.symbol = Some(intern::intern(&head.content));
            tail.symbol = Some(intern::intern(&tail.content));
        }
        Some((head, tail))
    }

    /// The integer value of a numeric literal, underscores stripped.
    ///
    /// An all-underscore digit run converts to zero. Malformed digits also
    /// yield zero; the tokenizer has already diagnosed them.
    pub fn integer_value(&self) -> i64 {
        let (digits, radix) = match self.kind {
            TokenKind::LiteralNumber => (self.content.as_str(), 10),
            TokenKind::LiteralHex => (self.content.get(2..).unwrap_or(""), 16),
            TokenKind::LiteralBinary => (self.content.get(2..).unwrap_or(""), 2),
            _ => return 0,
        };
        let digits: String = digits.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return 0;
        }
        u64::from_str_radix(&digits, radix).map(|v| v as i64).unwrap_or(0)
    }

    /// The value of a float literal, underscores stripped.
    pub fn float_value(&self) -> f64 {
        let digits: String = self.content.chars().filter(|c| *c != '_').collect();
        digits.parse().unwrap_or(0.0)
    }

    /// The unescaped value of a string literal.
    pub fn string_value(&self) -> String {
        unescape(self.content.trim_start_matches('"').trim_end_matches('"'))
    }

    /// The unescaped value of a character literal.
    pub fn char_value(&self) -> char {
        unescape(self.content.trim_start_matches('\'').trim_end_matches('\''))
            .chars()
            .next()
            .unwrap_or('\0')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.content)
    }
}

/// Process the escape sequences of a quoted literal body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// The operator catalogs of the language.
pub mod operators {
    /// Multi-character operators, longest-match first.
    pub const MULTI_CHAR: &[&str] = &[
        "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "=>", "->", "++", "--", "+=", "-=",
        "*=", "/=", "%=", "&=", "|=", "^=",
    ];

    /// Single-character operators and punctuation.
    pub const SINGLE_CHAR: &[char] = &[
        '.', ',', ';', ':', '(', ')', '{', '}', '[', ']', '<', '>', '+', '-', '*', '/', '%',
        '&', '|', '^', '~', '!', '=', '?', '@',
    ];

    /// Operators a struct may overload. The call operator is written as the
    /// two tokens `(` `)` and is handled separately.
    pub const OVERLOADABLE: &[&str] = &[
        "<<", ">>", "+", "-", "*", "/", "%", "&", "|", "^", "<", ">", "<=", ">=", "!=", "==",
        "&&", "||",
    ];

    /// Compound assignment operators.
    pub const COMPOUND_ASSIGNMENT: &[&str] = &["+=", "-=", "*=", "/=", "%=", "&=", "|=", "^="];

    /// Unary prefix operators.
    pub const UNARY_PREFIX: &[&str] = &["!", "~", "-", "+"];

    /// Increment and decrement.
    pub const INCREMENT_DECREMENT: &[&str] = &["++", "--"];

    /// Binding strength of a binary operator; higher binds tighter.
    /// `None` for operators that are not binary.
    pub fn binary_precedence(op: &str) -> Option<u8> {
        Some(match op {
            "*" | "/" | "%" => 10,
            "+" | "-" => 9,
            "<<" | ">>" => 8,
            "&" => 7,
            "^" => 6,
            "|" => 5,
            "<" | ">" | "<=" | ">=" | "!=" | "==" => 4,
            "&&" => 3,
            "||" => 2,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::location::SourceLocation;

    fn span(start: usize, len: usize) -> Span {
        Span::from_locations(
            SourceLocation::new(1, start + 1, start),
            SourceLocation::new(1, start + 1 + len, start + len),
        )
    }

    #[test]
    fn test_concat_adjacent() {
        let a = Token::new(TokenKind::Operator, ">", span(0, 1));
        let b = Token::new(TokenKind::Operator, ">", span(1, 1));
        let merged = a.concat(&b).unwrap();
        assert_eq!(merged.content, ">>");
        assert_eq!(merged.span.len(), 2);
    }

    #[test]
    fn test_concat_non_adjacent() {
        let a = Token::new(TokenKind::Operator, ">", span(0, 1));
        let b = Token::new(TokenKind::Operator, ">", span(5, 1));
        assert!(a.concat(&b).is_none());
    }

    #[test]
    fn test_slice_at() {
        let token = Token::new(TokenKind::Operator, ">>", span(3, 2));
        let (head, tail) = token.slice_at(1).unwrap();
        assert_eq!(head.content, ">");
        assert_eq!(tail.content, ">");
        assert_eq!(head.span.end_offset, tail.span.start_offset);
        assert_eq!(head.span.union(&tail.span), token.span);
    }

    #[test]
    fn test_slice_at_bad_boundary() {
        let token = Token::new(TokenKind::LiteralString, "\"é\"", span(0, 4));
        assert!(token.slice_at(2).is_none()); // inside the two-byte é
        assert!(token.slice_at(0).is_none());
        assert!(token.slice_at(4).is_none());
    }

    #[test]
    fn test_integer_values() {
        assert_eq!(Token::new(TokenKind::LiteralNumber, "1_000", span(0, 5)).integer_value(), 1000);
        assert_eq!(Token::new(TokenKind::LiteralHex, "0xff", span(0, 4)).integer_value(), 255);
        assert_eq!(Token::new(TokenKind::LiteralHex, "0x", span(0, 2)).integer_value(), 0);
        assert_eq!(Token::new(TokenKind::LiteralBinary, "0b101", span(0, 5)).integer_value(), 5);
        assert_eq!(Token::new(TokenKind::LiteralNumber, "___", span(0, 3)).integer_value(), 0);
    }

    #[test]
    fn test_float_value() {
        let token = Token::new(TokenKind::LiteralFloat, "1_0.2_5", span(0, 7));
        assert!((token.float_value() - 10.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_string_unescape() {
        let token = Token::new(TokenKind::LiteralString, r#""a\n\t\"b""#, span(0, 10));
        assert_eq!(token.string_value(), "a\n\t\"b");
        let token = Token::new(TokenKind::LiteralCharacter, r"'\\'", span(0, 4));
        assert_eq!(token.char_value(), '\\');
    }

    #[test]
    fn test_identifier_symbols() {
        let a = Token::identifier("foo", span(0, 3));
        let b = Token::identifier("foo", span(10, 3));
        assert_eq!(a.symbol, b.symbol);
        assert!(a.symbol.is_some());
    }

    #[test]
    fn test_precedence_table() {
        use operators::binary_precedence;
        assert!(binary_precedence("*") > binary_precedence("+"));
        assert!(binary_precedence("+") > binary_precedence("<<"));
        assert!(binary_precedence("<<") > binary_precedence("&"));
        assert!(binary_precedence("&") > binary_precedence("^"));
        assert!(binary_precedence("^") > binary_precedence("|"));
        assert!(binary_precedence("|") > binary_precedence("=="));
        assert!(binary_precedence("==") > binary_precedence("&&"));
        assert!(binary_precedence("&&") > binary_precedence("||"));
        assert_eq!(binary_precedence("=>"), None);
    }
}
