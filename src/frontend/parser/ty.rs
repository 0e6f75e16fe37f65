//! Parsing of types in type position.
//!
//! A type is an identifier followed by postfix forms: generic arguments,
//! `*` for pointers, a parenthesized parameter list for function pointers,
//! and `[len]` / `[]` for stack arrays. A leading `@word` attaches a
//! closure modifier to a function-pointer type.
//!
//! Closing a nested generic list may land on a `>>` token; the token is
//! split in place into two `>` tokens so the outer list closes cleanly on
//! the second one.

use super::Parser;
use crate::frontend::ast::{TypeInstance, TypeKind};
use crate::frontend::token::{AnalyzedKind, Token, TokenKind};
use crate::utils::diagnostics::Diagnostic;
use crate::utils::intern::keywords;

/// Which type forms a context admits. Violations are diagnosed but the
/// offending node is still produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedType {
    /// Function-pointer types (`R(P…)`) are admitted
    pub function_pointer: bool,
    /// Stack arrays without a length (`T[]`) are admitted
    pub stack_array_without_length: bool,
}

impl AllowedType {
    /// Every type form is admitted.
    pub const ANY: AllowedType = AllowedType {
        function_pointer: true,
        stack_array_without_length: true,
    };

    /// Value positions: function pointers yes, unsized stack arrays no.
    pub const VALUE: AllowedType = AllowedType {
        function_pointer: true,
        stack_array_without_length: false,
    };

    /// Return-type positions: only plain forms. Function-pointer returns
    /// go through an alias, which keeps `int ()(…)` unambiguously an
    /// overload of the call operator.
    pub const RETURN: AllowedType = AllowedType {
        function_pointer: false,
        stack_array_without_length: false,
    };

    /// The return type of a general struct member: the trailing `[]` of
    /// `T [](…)` must parse as an unsized stack array and the `(` must be
    /// left for the parameter list.
    pub const GENERAL: AllowedType = AllowedType {
        function_pointer: false,
        stack_array_without_length: true,
    };
}

impl<'d> Parser<'d> {
    /// Consume an identifier usable as a type name: a builtin type keyword
    /// or any non-keyword identifier.
    pub(crate) fn expect_type_name(&mut self) -> Option<Token> {
        let token = self.peek()?;
        if token.kind != TokenKind::Identifier {
            return None;
        }
        let is_builtin = token
            .symbol
            .is_some_and(|s| keywords::BUILTIN_TYPE_SYMS.contains(&s));
        let is_keyword = token.symbol.is_some_and(keywords::is_keyword);
        if is_builtin || !is_keyword {
            self.advance()
        } else {
            None
        }
    }

    /// Try to parse a type; restores the cursor and returns `None` when no
    /// type starts here.
    pub(crate) fn try_parse_type(&mut self, allowed: AllowedType) -> Option<TypeInstance> {
        let mark = self.mark();
        let closure = self.try_parse_closure_modifier();

        if self.expect_type_name().is_none() {
            self.restore(mark);
            return None;
        }
        let name = self.tag_previous(AnalyzedKind::TypeName);
        let mut node = TypeInstance::new(
            TypeKind::Simple { name: name.clone(), generics: Vec::new() },
            self.location(name.span),
        );

        loop {
            if self.check_operator("<") {
                match self.try_parse_generic_arguments() {
                    Some(generics) => {
                        let location = node.location.union(&self.location(self.span_since(mark)));
                        if let TypeKind::Simple { generics: slot, .. } = &mut node.kind {
                            *slot = generics;
                        } else {
                            self.diagnostics.add(
                                Diagnostic::error(
                                    "Generic arguments must follow the type name directly",
                                )
                                .with_location(location.clone()),
                            );
                        }
                        node.location = location;
                        continue;
                    }
                    // Not a generic list after all (a comparison, most
                    // likely); the type ends here.
                    None => break,
                }
            }
            if self.expect_operator("*").is_some() {
                let location = self.location(self.span_since(mark));
                node = TypeInstance::new(TypeKind::Pointer { inner: Box::new(node) }, location);
                continue;
            }
            if allowed.function_pointer && self.check_operator("(") {
                node = self.parse_function_type_suffix(node, mark);
                continue;
            }
            if self.check_operator("[") {
                self.advance();
                let length = if self.check_operator("]") {
                    None
                } else {
                    match self.try_parse_expression() {
                        Some(expr) => Some(Box::new(expr)),
                        None => {
                            let location = self.after_previous();
                            self.diagnostics.add(
                                Diagnostic::error("Expected a stack array length")
                                    .with_location(location),
                            );
                            None
                        }
                    }
                };
                self.expect_operator_or_missing("]");
                if length.is_none() && !allowed.stack_array_without_length {
                    let location = self.location(self.span_since(mark));
                    self.diagnostics.add(
                        Diagnostic::error("A stack array in this position requires a length")
                            .with_location(location),
                    );
                }
                let location = self.location(self.span_since(mark));
                node = TypeInstance::new(
                    TypeKind::StackArray { element: Box::new(node), length },
                    location,
                );
                continue;
            }
            break;
        }

        if let Some(closure) = closure {
            if let TypeKind::Function { closure: slot, .. } = &mut node.kind {
                *slot = Some(closure);
                node.location = self.location(self.span_since(mark));
            } else {
                self.diagnostics.add(
                    Diagnostic::error("A closure modifier requires a function pointer type")
                        .with_location(self.location(closure.span)),
                );
            }
        }

        Some(node)
    }

    /// A leading `@word` before a function-pointer type. A combined
    /// `@word` token (from an externally built list) is split in place
    /// first, the same mutation discipline as `>>`.
    fn try_parse_closure_modifier(&mut self) -> Option<Token> {
        if let Some(token) = self.peek() {
            if token.content.len() > 1 && token.content.starts_with('@') {
                self.split_current(1);
            }
        }
        let mark = self.mark();
        self.expect_operator("@")?;
        match self.expect_identifier() {
            Some(_) => Some(self.tag_previous(AnalyzedKind::Modifier)),
            None => {
                self.restore(mark);
                None
            }
        }
    }

    /// Parse `<T, U, …>` after a type name. The probe is all-or-nothing:
    /// when the content cannot be a generic list the cursor is restored
    /// and the `<` is left for the surrounding expression.
    fn try_parse_generic_arguments(&mut self) -> Option<Vec<TypeInstance>> {
        let mark = self.mark();
        self.expect_operator("<")?;

        let mut generics = Vec::new();
        let mut committed = false;
        loop {
            match self.try_parse_type(AllowedType::ANY) {
                Some(ty) => generics.push(ty),
                None if committed => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected a generic argument")
                            .with_location(location.clone()),
                    );
                    generics.push(TypeInstance::missing(location));
                }
                None => {
                    self.restore(mark);
                    return None;
                }
            }
            if self.expect_operator(",").is_some() {
                committed = true;
                continue;
            }
            break;
        }

        if self.expect_operator(">").is_some() {
            return Some(generics);
        }
        // A nested list may have swallowed the closing `>` into `>>` (or
        // `>=`, `>>=`…). Split the token so this list can consume its `>`.
        if self
            .peek()
            .map(|t| t.kind == TokenKind::Operator && t.content.starts_with('>') && t.content.len() > 1)
            .unwrap_or(false)
        {
            self.split_current(1);
            self.advance();
            return Some(generics);
        }
        if committed {
            self.expect_operator_or_missing(">");
            Some(generics)
        } else {
            self.restore(mark);
            None
        }
    }

    /// Parse the `(P1, P2, …)` suffix of a function-pointer type.
    fn parse_function_type_suffix(&mut self, ret: TypeInstance, mark: usize) -> TypeInstance {
        self.advance(); // '('
        let mut parameters = Vec::new();
        if !self.check_operator(")") {
            loop {
                match self.try_parse_type(AllowedType::VALUE) {
                    Some(ty) => parameters.push(ty),
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected a parameter type")
                                .with_location(location.clone()),
                        );
                        parameters.push(TypeInstance::missing(location));
                    }
                }
                if self.expect_operator(",").is_some() {
                    continue;
                }
                break;
            }
        }
        self.expect_operator_or_missing(")");
        let location = self.location(self.span_since(mark));
        TypeInstance::new(
            TypeKind::Function { ret: Box::new(ret), parameters, closure: None },
            location,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::StmtKind;
    use crate::frontend::parser::tests::parse_source;

    fn variable_type(source: &str) -> String {
        let (result, diagnostics) = parse_source(source);
        assert!(
            !diagnostics.has_errors(),
            "unexpected errors for {:?}",
            source
        );
        match &result.top_level_statements[0].kind {
            StmtKind::VariableDefinition(var) => var.ty.as_ref().unwrap().to_string(),
            other => panic!("expected variable definition, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_and_pointer() {
        assert_eq!(variable_type("int x;"), "int");
        assert_eq!(variable_type("int* p;"), "int*");
        assert_eq!(variable_type("int** pp;"), "int**");
    }

    #[test]
    fn test_generics() {
        assert_eq!(variable_type("List<int> xs;"), "List<int>");
        assert_eq!(variable_type("Dict<int, float> m;"), "Dict<int, float>");
    }

    #[test]
    fn test_nested_generics_with_shift_close() {
        assert_eq!(variable_type("List<Dict<int, int>> m;"), "List<Dict<int, int>>");
        // spaced form parses identically
        assert_eq!(variable_type("List < Dict < int , int > > m;"), "List<Dict<int, int>>");
    }

    #[test]
    fn test_shift_split_is_visible_in_token_list() {
        let (result, _) = parse_source("List<Dict<int, int>> m;");
        let closers = result
            .filtered_tokens
            .iter()
            .filter(|t| t.is_operator(">"))
            .count();
        assert_eq!(closers, 2);
        assert!(!result.filtered_tokens.iter().any(|t| t.is_operator(">>")));
        // the pre-split view still has the original `>>`
        assert!(result.original_tokens.iter().any(|t| t.is_operator(">>")));
    }

    #[test]
    fn test_function_pointer_type() {
        assert_eq!(variable_type("int(int, float) cb;"), "int(int, float)");
    }

    #[test]
    fn test_closure_modifier() {
        assert_eq!(variable_type("@closure int(int) cb;"), "@closure int(int)");
    }

    #[test]
    fn test_closure_modifier_split_token() {
        let (result, _) = parse_source("@closure int(int) cb;");
        assert!(result.filtered_tokens.iter().any(|t| t.is_operator("@")));
        assert!(result
            .filtered_tokens
            .iter()
            .any(|t| t.content == "closure"));
    }

    #[test]
    fn test_stack_array() {
        assert_eq!(variable_type("int[4] quad;"), "int[4]");
    }

    #[test]
    fn test_closure_on_plain_type_is_diagnosed() {
        let (_, diagnostics) = parse_source("@closure int x;");
        assert!(diagnostics.has_errors());
    }
}
