//! Expression parsing.
//!
//! Binary expressions are built left-leaning and re-associated on every
//! new operator: the insertion point is the deepest rightmost subtree
//! whose operator binds strictly weaker than the incoming one, and
//! explicit parentheses (a `Grouped` node) stop the descent.

use super::Parser;
use crate::frontend::ast::{
    AnyCall, ArgumentList, BinaryOperatorCall, Expr, ExprKind, IdentifierExpr, Lambda,
    LambdaBody, ListExpr, Literal, LiteralValue, NewInstance, NumericBase,
};
use crate::frontend::token::{operators, AnalyzedKind, Token, TokenKind};
use crate::utils::diagnostics::Diagnostic;
use crate::utils::intern::keywords;
use crate::frontend::parser::ty::AllowedType;

impl<'d> Parser<'d> {
    /// Try to parse a full expression (binary operators included).
    pub(crate) fn try_parse_expression(&mut self) -> Option<Expr> {
        let mut tree = self.try_parse_unary()?;
        loop {
            let has_binary = self
                .peek()
                .map(|t| {
                    t.kind == TokenKind::Operator
                        && operators::binary_precedence(&t.content).is_some()
                })
                .unwrap_or(false);
            if !has_binary {
                break;
            }
            let operator = match self.advance() {
                Some(token) => token,
                None => break,
            };
            let rhs = match self.try_parse_unary() {
                Some(rhs) => rhs,
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error(format!(
                            "Expected an expression after '{}'",
                            operator.content
                        ))
                        .with_location(location.clone()),
                    );
                    Expr::missing(location)
                }
            };
            tree = attach_binary(tree, operator, rhs);
        }
        Some(tree)
    }

    /// A unary-prefix chain (`! ~ - +`) in front of a one-value chain.
    fn try_parse_unary(&mut self) -> Option<Expr> {
        let is_prefix = self
            .peek()
            .map(|t| t.is_operator_of(operators::UNARY_PREFIX))
            .unwrap_or(false);
        if is_prefix {
            let mark = self.mark();
            let operator = self.advance()?;
            match self.try_parse_unary() {
                Some(operand) => {
                    let location = self
                        .location(operator.span)
                        .union(&operand.location);
                    return Some(Expr::new(
                        ExprKind::Unary {
                            operator,
                            operand: Box::new(operand),
                            reference: None,
                        },
                        location,
                    ));
                }
                None => {
                    self.restore(mark);
                    return None;
                }
            }
        }
        self.try_parse_one_value_chain()
    }

    /// A one-value with its postfix chain: field access, indexing, calls,
    /// and `as` reinterpretation.
    pub(crate) fn try_parse_one_value_chain(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let mut value = self.try_parse_one_value()?;
        loop {
            if self.expect_operator(".").is_some() {
                let field = match self.expect_identifier() {
                    Some(_) => self.tag_previous(AnalyzedKind::FieldName),
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected a field name after '.'")
                                .with_location(location.clone()),
                        );
                        Token::missing(TokenKind::Identifier, "", location.span)
                    }
                };
                let location = self.location(self.span_since(mark));
                value = Expr::new(
                    ExprKind::FieldAccess { value: Box::new(value), field },
                    location,
                );
                continue;
            }
            if self.check_operator("[") {
                self.advance();
                let index = match self.try_parse_expression() {
                    Some(index) => index,
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected an index expression")
                                .with_location(location.clone()),
                        );
                        Expr::missing(location)
                    }
                };
                self.expect_operator_or_missing("]");
                let location = self.location(self.span_since(mark));
                value = Expr::new(
                    ExprKind::IndexCall {
                        value: Box::new(value),
                        index: Box::new(index),
                        reference: None,
                    },
                    location,
                );
                continue;
            }
            if self.check_operator("(") {
                let arguments = self.parse_argument_list();
                let location = self.location(self.span_since(mark));
                value = Expr::new(
                    ExprKind::AnyCall(AnyCall {
                        value: Box::new(value),
                        arguments,
                        reference: None,
                    }),
                    location,
                );
                continue;
            }
            if self.check_keyword(*keywords::AS) {
                self.advance();
                let target = match self.try_parse_type(AllowedType::VALUE) {
                    Some(target) => target,
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected a type after 'as'")
                                .with_location(location.clone()),
                        );
                        crate::frontend::ast::TypeInstance::missing(location)
                    }
                };
                let location = self.location(self.span_since(mark));
                value = Expr::new(
                    ExprKind::Reinterpret { value: Box::new(value), target },
                    location,
                );
                continue;
            }
            break;
        }
        Some(value)
    }

    /// A single value: lambda, list, literal, cast, parenthesized
    /// expression, `new`, reference/dereference, or identifier.
    fn try_parse_one_value(&mut self) -> Option<Expr> {
        if let Some(lambda) = self.try_parse_lambda() {
            return Some(lambda);
        }

        if self.check_operator("(") {
            if let Some(cast) = self.try_parse_type_cast() {
                return Some(cast);
            }
            let mark = self.mark();
            self.advance(); // '('
            let inner = match self.try_parse_expression() {
                Some(inner) => inner,
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected an expression after '('")
                            .with_location(location.clone()),
                    );
                    Expr::missing(location)
                }
            };
            self.expect_operator_or_missing(")");
            let location = self.location(self.span_since(mark));
            return Some(Expr::new(ExprKind::Grouped(Box::new(inner)), location));
        }

        if self.check_operator("[") {
            return Some(self.parse_list_expression());
        }

        if let Some(token) = self.expect_literal() {
            let location = self.location(token.span);
            let literal = literal_from_token(token);
            return Some(Expr::new(ExprKind::Literal(literal), location));
        }

        if self.check_keyword(*keywords::NEW) {
            return Some(self.parse_new_instance());
        }

        if self.check_operator("&") {
            let mark = self.mark();
            self.advance();
            match self.try_parse_one_value_chain() {
                Some(operand) => {
                    let location = self.location(self.span_since(mark));
                    return Some(Expr::new(
                        ExprKind::GetReference { operand: Box::new(operand), reference: None },
                        location,
                    ));
                }
                None => {
                    self.restore(mark);
                    return None;
                }
            }
        }

        if self.check_operator("*") {
            let mark = self.mark();
            self.advance();
            match self.try_parse_one_value_chain() {
                Some(operand) => {
                    let location = self.location(self.span_since(mark));
                    return Some(Expr::new(
                        ExprKind::Dereference { operand: Box::new(operand) },
                        location,
                    ));
                }
                None => {
                    self.restore(mark);
                    return None;
                }
            }
        }

        // `this`, `sizeof`, and builtin type names act as ordinary
        // identifier expressions; the semantic phase gives them meaning.
        let is_identifier_like = self
            .peek()
            .map(|t| {
                t.kind == TokenKind::Identifier
                    && (!t.symbol.is_some_and(keywords::is_keyword)
                        || t.is_symbol(*keywords::THIS)
                        || t.is_symbol(*keywords::SIZEOF)
                        || t.symbol
                            .is_some_and(|s| keywords::BUILTIN_TYPE_SYMS.contains(&s)))
            })
            .unwrap_or(false);
        if is_identifier_like {
            let token = self.advance()?;
            let location = self.location(token.span);
            return Some(Expr::new(
                ExprKind::Identifier(IdentifierExpr { token }),
                location,
            ));
        }

        None
    }

    /// Probe for `(params) => body`. The parameter list is parsed into a
    /// diagnostics override that is only committed when the `=>` arrow
    /// confirms this really is a lambda.
    fn try_parse_lambda(&mut self) -> Option<Expr> {
        if !self.check_operator("(") {
            return None;
        }
        let mark = self.mark();
        let scope = self.diagnostics.push_override();
        let parameters = match self.parse_parameter_definitions(&["ref", "temp", "const"], false)
        {
            Some(parameters) if self.check_operator("=>") => parameters,
            _ => {
                self.diagnostics.drop_override(scope);
                self.restore(mark);
                return None;
            }
        };
        self.diagnostics.commit_override(scope);
        self.advance(); // '=>'

        let body = match self.try_parse_block() {
            Some(block) => LambdaBody::Block(block),
            None => match self.try_parse_expression() {
                Some(expr) => LambdaBody::Expr(Box::new(expr)),
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected a lambda body after '=>'")
                            .with_location(location.clone()),
                    );
                    LambdaBody::Expr(Box::new(Expr::missing(location)))
                }
            },
        };
        let location = self.location(self.span_since(mark));
        Some(Expr::new(ExprKind::Lambda(Lambda { parameters, body }), location))
    }

    /// Probe for `(TYPE) one_value`. Backtracks silently when either the
    /// type or the following value is absent.
    fn try_parse_type_cast(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let scope = self.diagnostics.push_override();
        self.advance(); // '('
        let parsed = self
            .try_parse_type(AllowedType::VALUE)
            .filter(|_| self.expect_operator(")").is_some());
        let Some(target) = parsed else {
            self.diagnostics.drop_override(scope);
            self.restore(mark);
            return None;
        };
        match self.try_parse_one_value_chain() {
            Some(value) => {
                self.diagnostics.commit_override(scope);
                let location = self.location(self.span_since(mark));
                Some(Expr::new(
                    ExprKind::TypeCast { target, value: Box::new(value) },
                    location,
                ))
            }
            None => {
                self.diagnostics.drop_override(scope);
                self.restore(mark);
                None
            }
        }
    }

    /// `[e1, e2, …]`
    fn parse_list_expression(&mut self) -> Expr {
        let mark = self.mark();
        self.advance(); // '['
        let mut elements = Vec::new();
        if !self.check_operator("]") {
            loop {
                match self.try_parse_expression() {
                    Some(element) => elements.push(element),
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected a list element")
                                .with_location(location.clone()),
                        );
                        elements.push(Expr::missing(location));
                    }
                }
                if self.expect_operator(",").is_some() {
                    continue;
                }
                break;
            }
        }
        self.expect_operator_or_missing("]");
        let location = self.location(self.span_since(mark));
        Expr::new(ExprKind::List(ListExpr { elements }), location)
    }

    /// `new T` / `new T(args)`
    fn parse_new_instance(&mut self) -> Expr {
        let mark = self.mark();
        self.advance(); // 'new'
        let ty = match self.try_parse_type(AllowedType::VALUE) {
            Some(ty) => ty,
            None => {
                let location = self.after_previous();
                self.diagnostics.add(
                    Diagnostic::error("Expected a type after 'new'")
                        .with_location(location.clone()),
                );
                crate::frontend::ast::TypeInstance::missing(location)
            }
        };
        let arguments = if self.check_operator("(") {
            Some(self.parse_argument_list())
        } else {
            None
        };
        let location = self.location(self.span_since(mark));
        Expr::new(
            ExprKind::NewInstance(NewInstance { ty, arguments, reference: None }),
            location,
        )
    }

    /// A parenthesized argument list; the cursor sits on `(`.
    ///
    /// Each argument may carry value modifiers (`ref x`, `temp y`). A
    /// modifier with no following value is kept as a missing argument with
    /// a warning.
    pub(crate) fn parse_argument_list(&mut self) -> ArgumentList {
        let mark = self.mark();
        self.advance(); // '('
        let mut arguments = Vec::new();
        if !self.check_operator(")") {
            loop {
                let mut modifiers = Vec::new();
                loop {
                    let is_modifier = self
                        .peek()
                        .map(|t| {
                            t.kind == TokenKind::Identifier
                                && t.symbol
                                    .is_some_and(|s| keywords::MODIFIER_SYMS.contains(&s))
                                && !t.is_symbol(*keywords::THIS)
                        })
                        .unwrap_or(false);
                    if !is_modifier {
                        break;
                    }
                    self.advance();
                    modifiers.push(self.tag_previous(AnalyzedKind::Modifier));
                }
                match self.try_parse_expression() {
                    Some(value) => {
                        let expr = if modifiers.is_empty() {
                            value
                        } else {
                            let location = self
                                .location(modifiers[0].span)
                                .union(&value.location);
                            Expr::new(
                                ExprKind::Argument { modifiers, value: Box::new(value) },
                                location,
                            )
                        };
                        arguments.push(expr);
                    }
                    None => {
                        let location = self.after_previous();
                        if modifiers.is_empty() {
                            self.diagnostics.add(
                                Diagnostic::error("Expected an argument")
                                    .with_location(location.clone()),
                            );
                        } else {
                            self.diagnostics.add(
                                Diagnostic::warning("argument modifier without a value")
                                    .with_location(location.clone()),
                            );
                        }
                        arguments.push(Expr::missing_argument(location));
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
        ArgumentList { arguments, location }
    }
}

/// Insert `operator rhs` into an existing tree, descending the rightmost
/// spine while the incoming operator binds tighter.
fn attach_binary(tree: Expr, operator: Token, rhs: Expr) -> Expr {
    let incoming = operators::binary_precedence(&operator.content).unwrap_or(0);
    let Expr { kind, location, resolved_type } = tree;
    match kind {
        ExprKind::Binary(mut binary)
            if incoming > operators::binary_precedence(&binary.operator.content).unwrap_or(0) =>
        {
            let new_right = attach_binary(*binary.right, operator, rhs);
            let location = location.union(&new_right.location);
            binary.right = Box::new(new_right);
            Expr { kind: ExprKind::Binary(binary), location, resolved_type }
        }
        kind => {
            let left = Expr { kind, location, resolved_type };
            let location = left.location.union(&rhs.location);
            Expr::new(
                ExprKind::Binary(BinaryOperatorCall {
                    operator,
                    left: Box::new(left),
                    right: Box::new(rhs),
                    reference: None,
                }),
                location,
            )
        }
    }
}

/// Convert a literal token into the typed literal node.
fn literal_from_token(token: Token) -> Literal {
    let value = match token.kind {
        TokenKind::LiteralHex => LiteralValue::Int {
            value: token.integer_value(),
            base: NumericBase::Hexadecimal,
        },
        TokenKind::LiteralBinary => LiteralValue::Int {
            value: token.integer_value(),
            base: NumericBase::Binary,
        },
        TokenKind::LiteralFloat => LiteralValue::Float(token.float_value()),
        TokenKind::LiteralString => LiteralValue::String(token.string_value()),
        TokenKind::LiteralCharacter => LiteralValue::Char(token.char_value()),
        _ => LiteralValue::Int { value: token.integer_value(), base: NumericBase::Decimal },
    };
    Literal { token, value }
}
