//! Statement parsing.
//!
//! Statements that are not blocks, loops, branches, or labels end with a
//! semicolon; a missing one is a warning, as are empty statements and
//! unnecessary semicolons after block-shaped statements.

use super::Parser;
use crate::frontend::ast::{
    Block, DeleteStmt, Expr, ExprKind, ForStmt, IfStmt, Stmt, StmtKind, VariableDefinition,
};
use crate::frontend::token::{operators, AnalyzedKind, TokenKind};
use crate::utils::diagnostics::Diagnostic;
use crate::utils::intern::keywords;
use crate::frontend::parser::ty::AllowedType;

/// Modifiers a local variable definition admits.
const LOCAL_MODIFIERS: &[&str] = &["const", "temp"];

impl<'d> Parser<'d> {
    /// Parse `{ … }`. Returns `None` when the cursor is not on `{`.
    ///
    /// Content that cannot be parsed becomes a missing statement plus an
    /// `Expected a statement` diagnostic at the stall point; a missing
    /// closing brace is diagnosed and synthesized at end of input.
    pub(crate) fn try_parse_block(&mut self) -> Option<Block> {
        let mark = self.mark();
        self.expect_operator("{")?;
        let mut statements = Vec::new();
        loop {
            if self.expect_operator("}").is_some() {
                break;
            }
            if self.is_at_end() {
                self.missing_token(TokenKind::Operator, "}", "'}'");
                break;
            }
            let before = self.pos;
            match self.try_parse_statement() {
                Some(statement) => statements.push(statement),
                None => {
                    self.diagnostics.add(
                        Diagnostic::error("Expected a statement").with_location(self.here()),
                    );
                    statements.push(Stmt::missing(self.after_previous()));
                    self.synchronize_statement();
                }
            }
            if !self.is_at_end() && self.pos == before {
                self.stall("Parser failed to advance inside a block");
                break;
            }
        }
        Some(Block::new(statements, self.location(self.span_since(mark))))
    }

    /// Skip tokens until a point a fresh statement could start from.
    fn synchronize_statement(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() {
            if self.previous().map(|t| t.is_operator(";")).unwrap_or(false) {
                return;
            }
            if self.check_operator("}") {
                return;
            }
            let at_keyword = self
                .peek()
                .map(|t| {
                    t.kind == TokenKind::Identifier
                        && t.symbol.is_some_and(|s| {
                            keywords::STATEMENT_SYMS.contains(&s)
                                || keywords::DECLARATION_SYMS.contains(&s)
                                || keywords::BUILTIN_TYPE_SYMS.contains(&s)
                        })
                })
                .unwrap_or(false);
            if at_keyword {
                return;
            }
            self.advance();
        }
    }

    /// Try to parse one statement; restores the cursor and returns `None`
    /// when nothing statement-shaped starts here.
    pub(crate) fn try_parse_statement(&mut self) -> Option<Stmt> {
        let mark = self.mark();

        if let Some(block) = self.try_parse_block() {
            let location = block.location.clone();
            self.warn_unnecessary_semicolon();
            return Some(Stmt::new(StmtKind::Block(block), location));
        }

        if let Some(semi) = self.expect_operator(";") {
            let location = self.location(semi.span);
            self.diagnostics
                .add(Diagnostic::warning("Empty statement").with_location(location.clone()));
            return Some(Stmt::new(StmtKind::Empty, location));
        }

        // Instruction label: `name:`
        if self.expect_identifier().is_some() {
            if self.check_operator(":") {
                let name = self.tag_previous(AnalyzedKind::Label);
                self.advance(); // ':'
                let location = self.location(self.span_since(mark));
                return Some(Stmt::new(StmtKind::Label { name }, location));
            }
            self.restore(mark);
        }

        if self.check_keyword(*keywords::IF) {
            return Some(self.parse_if());
        }
        if self.check_keyword(*keywords::WHILE) {
            return Some(self.parse_while());
        }
        if self.check_keyword(*keywords::FOR) {
            return Some(self.parse_for());
        }
        if let Some(statement) = self.try_parse_keyword_call() {
            return Some(statement);
        }

        if let Some(statement) = self.try_parse_variable_definition(true) {
            return Some(statement);
        }

        self.try_parse_assignment_or_expression(true)
    }

    fn warn_unnecessary_semicolon(&mut self) {
        if let Some(semi) = self.expect_operator(";") {
            let location = self.location(semi.span);
            self.diagnostics
                .add(Diagnostic::warning("Unnecessary semicolon").with_location(location));
        }
    }

    /// A missing statement terminator is a warning; parsing continues as
    /// if it were present.
    pub(crate) fn require_semicolon(&mut self) {
        if self.expect_operator(";").is_none() {
            let location = self.after_previous();
            self.diagnostics
                .add(Diagnostic::warning("Expected ';'").with_location(location));
        }
    }

    fn expression_or_missing(&mut self, what: &str) -> Expr {
        match self.try_parse_expression() {
            Some(expr) => expr,
            None => {
                let location = self.after_previous();
                self.diagnostics.add(
                    Diagnostic::error(format!("Expected {}", what)).with_location(location.clone()),
                );
                Expr::missing(location)
            }
        }
    }

    fn statement_or_missing(&mut self) -> Stmt {
        match self.try_parse_statement() {
            Some(statement) => statement,
            None => {
                self.diagnostics
                    .add(Diagnostic::error("Expected a statement").with_location(self.here()));
                Stmt::missing(self.after_previous())
            }
        }
    }

    fn parse_if(&mut self) -> Stmt {
        let mark = self.mark();
        self.advance(); // 'if'
        self.expect_operator_or_missing("(");
        let condition = self.expression_or_missing("a condition");
        self.expect_operator_or_missing(")");
        let then_branch = Box::new(self.statement_or_missing());
        let else_branch = if self.expect_keyword(*keywords::ELSE).is_some() {
            Some(Box::new(self.statement_or_missing()))
        } else {
            None
        };
        let location = self.location(self.span_since(mark));
        Stmt::new(StmtKind::If(IfStmt { condition, then_branch, else_branch }), location)
    }

    fn parse_while(&mut self) -> Stmt {
        let mark = self.mark();
        self.advance(); // 'while'
        self.expect_operator_or_missing("(");
        let condition = self.expression_or_missing("a condition");
        self.expect_operator_or_missing(")");
        let body = Box::new(self.statement_or_missing());
        let location = self.location(self.span_since(mark));
        Stmt::new(StmtKind::While { condition, body }, location)
    }

    /// `for (init; cond; step) body` — every component may be empty.
    fn parse_for(&mut self) -> Stmt {
        let mark = self.mark();
        self.advance(); // 'for'
        self.expect_operator_or_missing("(");

        let initializer = if self.expect_operator(";").is_some() {
            None
        } else {
            let component = self
                .try_parse_variable_definition(false)
                .or_else(|| self.try_parse_assignment_or_expression(false));
            let component = match component {
                Some(component) => component,
                None => {
                    self.diagnostics.add(
                        Diagnostic::error("Expected a loop initializer")
                            .with_location(self.here()),
                    );
                    Stmt::missing(self.after_previous())
                }
            };
            self.expect_operator_or_missing(";");
            Some(Box::new(component))
        };

        let condition = if self.check_operator(";") {
            None
        } else {
            self.try_parse_expression()
        };
        self.expect_operator_or_missing(";");

        let step = if self.check_operator(")") {
            None
        } else {
            self.try_parse_assignment_or_expression(false).map(Box::new)
        };
        self.expect_operator_or_missing(")");

        let body = Box::new(self.statement_or_missing());
        let location = self.location(self.span_since(mark));
        Stmt::new(
            StmtKind::For(ForStmt { initializer, condition, step, body }),
            location,
        )
    }

    /// `return` / `yield` / `crash` / `goto` / `break` / `delete`.
    fn try_parse_keyword_call(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let sym = self.peek()?.symbol?;

        if sym == *keywords::RETURN || sym == *keywords::YIELD || sym == *keywords::CRASH {
            self.advance();
            let value = if self.check_operator(";") {
                None
            } else {
                self.try_parse_expression()
            };
            self.require_semicolon();
            let location = self.location(self.span_since(mark));
            let kind = if sym == *keywords::RETURN {
                StmtKind::Return { value }
            } else if sym == *keywords::YIELD {
                StmtKind::Yield { value }
            } else {
                StmtKind::Crash { value }
            };
            return Some(Stmt::new(kind, location));
        }

        if sym == *keywords::BREAK {
            self.advance();
            self.require_semicolon();
            let location = self.location(self.span_since(mark));
            return Some(Stmt::new(StmtKind::Break, location));
        }

        if sym == *keywords::GOTO {
            self.advance();
            let label = match self.expect_identifier() {
                Some(_) => self.tag_previous(AnalyzedKind::Label),
                None => self.missing_token(TokenKind::Identifier, "", "a label name"),
            };
            self.require_semicolon();
            let location = self.location(self.span_since(mark));
            return Some(Stmt::new(StmtKind::Goto { label }, location));
        }

        if sym == *keywords::DELETE {
            self.advance();
            let value = self.expression_or_missing("a value to delete");
            self.require_semicolon();
            let location = self.location(self.span_since(mark));
            return Some(Stmt::new(
                StmtKind::Delete(DeleteStmt { value, destructor: None, deallocator: None }),
                location,
            ));
        }

        None
    }

    /// `modifier* (var | type) name (= expr)? ;`
    ///
    /// The type-and-name probe runs inside a diagnostics override so a
    /// backtrack (the input was an assignment or a call) leaves nothing
    /// behind.
    pub(crate) fn try_parse_variable_definition(&mut self, require_semi: bool) -> Option<Stmt> {
        let mark = self.mark();
        let scope = self.diagnostics.push_override();
        let modifiers = self.parse_modifier_tokens(LOCAL_MODIFIERS);

        let ty = if self.expect_keyword(*keywords::VAR).is_some() {
            None
        } else {
            match self.try_parse_type(AllowedType::VALUE) {
                Some(ty) => Some(ty),
                None => {
                    self.diagnostics.drop_override(scope);
                    self.restore(mark);
                    return None;
                }
            }
        };

        if self.expect_identifier().is_none() {
            self.diagnostics.drop_override(scope);
            self.restore(mark);
            return None;
        }
        // A declaration continues with an initializer or ends. Anything
        // else (`int f(`) belongs to another production.
        let continues = match self.peek() {
            None => true,
            Some(t) => t.is_operator("=") || t.is_operator(";") || t.is_operator("}"),
        };
        if !continues {
            self.diagnostics.drop_override(scope);
            self.restore(mark);
            return None;
        }
        self.diagnostics.commit_override(scope);
        let name = self.tag_previous(AnalyzedKind::VariableName);

        let initializer = if self.expect_operator("=").is_some() {
            Some(self.expression_or_missing("an initializer"))
        } else {
            None
        };
        if require_semi {
            self.require_semicolon();
        }
        let location = self.location(self.span_since(mark));
        Some(Stmt::new(
            StmtKind::VariableDefinition(VariableDefinition {
                modifiers,
                ty,
                name,
                initializer,
                resolved_type: None,
            }),
            location,
        ))
    }

    /// Assignment family (`=`, compound, `++`/`--`) or a bare
    /// statement-expression.
    pub(crate) fn try_parse_assignment_or_expression(&mut self, require_semi: bool) -> Option<Stmt> {
        let mark = self.mark();
        if let Some(target) = self.try_parse_one_value_chain() {
            if let Some(operator) = self.expect_any_operator(operators::INCREMENT_DECREMENT) {
                if require_semi {
                    self.require_semicolon();
                }
                let location = self.location(self.span_since(mark));
                return Some(Stmt::new(
                    StmtKind::ShortOperatorCall { target, operator, reference: None },
                    location,
                ));
            }
            if let Some(operator) = self.expect_any_operator(operators::COMPOUND_ASSIGNMENT) {
                let value = self.expression_or_missing("a value");
                if require_semi {
                    self.require_semicolon();
                }
                let location = self.location(self.span_since(mark));
                return Some(Stmt::new(
                    StmtKind::CompoundAssignment { target, operator, value, reference: None },
                    location,
                ));
            }
            if self.expect_operator("=").is_some() {
                let value = self.expression_or_missing("a value");
                if require_semi {
                    self.require_semicolon();
                }
                let location = self.location(self.span_since(mark));
                return Some(Stmt::new(StmtKind::Assignment { target, value }, location));
            }
        }

        // Not an assignment; re-parse as a full expression statement. An
        // expression without an effect is not a statement: diagnose it and
        // fail the production so the surrounding recovery takes over.
        self.restore(mark);
        let expr = self.try_parse_expression()?;
        if !is_statement_expression(&expr) {
            self.diagnostics.add(
                Diagnostic::error("Only call and new expressions can stand as statements")
                    .with_location(expr.location.clone()),
            );
            self.restore(mark);
            return None;
        }
        if require_semi {
            self.require_semicolon();
        }
        let location = self.location(self.span_since(mark));
        Some(Stmt::new(StmtKind::Expression(expr), location))
    }
}

/// Whether an expression may stand alone as a statement.
fn is_statement_expression(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::AnyCall(_) | ExprKind::NewInstance(_) => true,
        ExprKind::Grouped(inner) => is_statement_expression(inner),
        ExprKind::Missing(_) => true,
        _ => false,
    }
}
