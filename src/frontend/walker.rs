//! Deterministic pre-order traversal over statements.
//!
//! The walker calls the supplied predicate for every node; a `false`
//! return stops the whole traversal. Children are visited in source order
//! and every node variant enumerates its children explicitly.
//!
//! Two flavors are exposed: the untyped pass visits every node, and the
//! function-linked pass additionally reports the function definition a
//! node references (calls, allocations, cleanup slots) through a secondary
//! callback.

use crate::frontend::ast::{
    Block, Expr, ExprKind, FunctionRef, LambdaBody, ParameterDefinition, Stmt, StmtKind,
    TypeInstance, TypeKind,
};

/// A node handed to the walk predicate.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A statement
    Stmt(&'a Stmt),
    /// An expression
    Expr(&'a Expr),
    /// A type in type position
    Type(&'a TypeInstance),
    /// A block
    Block(&'a Block),
    /// A parameter definition
    Parameter(&'a ParameterDefinition),
}

/// Walk a statement tree pre-order. Returns `false` when the predicate
/// stopped the traversal.
pub fn walk_statement(stmt: &Stmt, visit: &mut dyn FnMut(Node<'_>) -> bool) -> bool {
    walk_statement_linked(stmt, visit, &mut |_| {})
}

/// Walk a statement tree pre-order, reporting referenced functions.
///
/// `on_function` fires for every node that carries a resolved function
/// reference. A `delete` whose destructor and deallocator alias reports
/// that function once.
pub fn walk_statement_linked(
    stmt: &Stmt,
    visit: &mut dyn FnMut(Node<'_>) -> bool,
    on_function: &mut dyn FnMut(FunctionRef),
) -> bool {
    if !visit(Node::Stmt(stmt)) {
        return false;
    }
    match &stmt.kind {
        StmtKind::Empty
        | StmtKind::Break
        | StmtKind::Goto { .. }
        | StmtKind::Label { .. }
        | StmtKind::Missing(_) => true,
        StmtKind::Block(block) => walk_block_linked(block, visit, on_function),
        StmtKind::If(if_stmt) => {
            walk_expression_linked(&if_stmt.condition, visit, on_function)
                && walk_statement_linked(&if_stmt.then_branch, visit, on_function)
                && if_stmt
                    .else_branch
                    .as_ref()
                    .map(|e| walk_statement_linked(e, visit, on_function))
                    .unwrap_or(true)
        }
        StmtKind::While { condition, body } => {
            walk_expression_linked(condition, visit, on_function)
                && walk_statement_linked(body, visit, on_function)
        }
        StmtKind::For(for_stmt) => {
            for_stmt
                .initializer
                .as_ref()
                .map(|i| walk_statement_linked(i, visit, on_function))
                .unwrap_or(true)
                && for_stmt
                    .condition
                    .as_ref()
                    .map(|c| walk_expression_linked(c, visit, on_function))
                    .unwrap_or(true)
                && for_stmt
                    .step
                    .as_ref()
                    .map(|s| walk_statement_linked(s, visit, on_function))
                    .unwrap_or(true)
                && walk_statement_linked(&for_stmt.body, visit, on_function)
        }
        StmtKind::Return { value } | StmtKind::Crash { value } | StmtKind::Yield { value } => {
            value
                .as_ref()
                .map(|v| walk_expression_linked(v, visit, on_function))
                .unwrap_or(true)
        }
        StmtKind::Delete(delete) => {
            match (delete.destructor, delete.deallocator) {
                (Some(a), Some(b)) if a == b => on_function(a),
                (destructor, deallocator) => {
                    if let Some(f) = destructor {
                        on_function(f);
                    }
                    if let Some(f) = deallocator {
                        on_function(f);
                    }
                }
            }
            walk_expression_linked(&delete.value, visit, on_function)
        }
        StmtKind::VariableDefinition(var) => {
            var.ty
                .as_ref()
                .map(|t| walk_type_linked(t, visit, on_function))
                .unwrap_or(true)
                && var
                    .initializer
                    .as_ref()
                    .map(|i| walk_expression_linked(i, visit, on_function))
                    .unwrap_or(true)
        }
        StmtKind::Assignment { target, value } => {
            walk_expression_linked(target, visit, on_function)
                && walk_expression_linked(value, visit, on_function)
        }
        StmtKind::CompoundAssignment { target, value, reference, .. } => {
            if let Some(f) = reference {
                on_function(*f);
            }
            walk_expression_linked(target, visit, on_function)
                && walk_expression_linked(value, visit, on_function)
        }
        StmtKind::ShortOperatorCall { target, reference, .. } => {
            if let Some(f) = reference {
                on_function(*f);
            }
            walk_expression_linked(target, visit, on_function)
        }
        StmtKind::Expression(expr) => walk_expression_linked(expr, visit, on_function),
    }
}

/// Walk a block's statements in order.
pub fn walk_block_linked(
    block: &Block,
    visit: &mut dyn FnMut(Node<'_>) -> bool,
    on_function: &mut dyn FnMut(FunctionRef),
) -> bool {
    if !visit(Node::Block(block)) {
        return false;
    }
    block
        .statements
        .iter()
        .all(|s| walk_statement_linked(s, visit, on_function))
}

/// Walk an expression tree pre-order.
pub fn walk_expression(expr: &Expr, visit: &mut dyn FnMut(Node<'_>) -> bool) -> bool {
    walk_expression_linked(expr, visit, &mut |_| {})
}

fn walk_expression_linked(
    expr: &Expr,
    visit: &mut dyn FnMut(Node<'_>) -> bool,
    on_function: &mut dyn FnMut(FunctionRef),
) -> bool {
    if !visit(Node::Expr(expr)) {
        return false;
    }
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::Identifier(_)
        | ExprKind::Missing(_)
        | ExprKind::MissingArgument(_)
        | ExprKind::MissingLiteral(_)
        | ExprKind::MissingIdentifier(_) => true,
        ExprKind::FieldAccess { value, .. } => walk_expression_linked(value, visit, on_function),
        ExprKind::IndexCall { value, index, reference } => {
            if let Some(f) = reference {
                on_function(*f);
            }
            walk_expression_linked(value, visit, on_function)
                && walk_expression_linked(index, visit, on_function)
        }
        ExprKind::AnyCall(call) => {
            if let Some(f) = call.reference {
                on_function(f);
            }
            walk_expression_linked(&call.value, visit, on_function)
                && call
                    .arguments
                    .arguments
                    .iter()
                    .all(|a| walk_expression_linked(a, visit, on_function))
        }
        ExprKind::NewInstance(new) => {
            if let Some(f) = new.reference {
                on_function(f);
            }
            walk_type_linked(&new.ty, visit, on_function)
                && new
                    .arguments
                    .as_ref()
                    .map(|args| {
                        args.arguments
                            .iter()
                            .all(|a| walk_expression_linked(a, visit, on_function))
                    })
                    .unwrap_or(true)
        }
        ExprKind::Binary(binary) => {
            if let Some(f) = binary.reference {
                on_function(f);
            }
            walk_expression_linked(&binary.left, visit, on_function)
                && walk_expression_linked(&binary.right, visit, on_function)
        }
        ExprKind::Unary { operand, reference, .. } => {
            if let Some(f) = reference {
                on_function(*f);
            }
            walk_expression_linked(operand, visit, on_function)
        }
        ExprKind::Argument { value, .. } => walk_expression_linked(value, visit, on_function),
        ExprKind::List(list) => list
            .elements
            .iter()
            .all(|e| walk_expression_linked(e, visit, on_function)),
        ExprKind::Lambda(lambda) => {
            lambda
                .parameters
                .parameters
                .iter()
                .all(|p| walk_parameter_linked(p, visit, on_function))
                && match &lambda.body {
                    LambdaBody::Block(block) => walk_block_linked(block, visit, on_function),
                    LambdaBody::Expr(expr) => walk_expression_linked(expr, visit, on_function),
                }
        }
        ExprKind::GetReference { operand, reference } => {
            if let Some(f) = reference {
                on_function(*f);
            }
            walk_expression_linked(operand, visit, on_function)
        }
        ExprKind::Dereference { operand } => walk_expression_linked(operand, visit, on_function),
        ExprKind::TypeCast { target, value } => {
            walk_type_linked(target, visit, on_function)
                && walk_expression_linked(value, visit, on_function)
        }
        ExprKind::Reinterpret { value, target } => {
            walk_expression_linked(value, visit, on_function)
                && walk_type_linked(target, visit, on_function)
        }
        ExprKind::Grouped(inner) => walk_expression_linked(inner, visit, on_function),
    }
}

/// Walk a type expression pre-order.
pub fn walk_type(ty: &TypeInstance, visit: &mut dyn FnMut(Node<'_>) -> bool) -> bool {
    walk_type_linked(ty, visit, &mut |_| {})
}

fn walk_type_linked(
    ty: &TypeInstance,
    visit: &mut dyn FnMut(Node<'_>) -> bool,
    on_function: &mut dyn FnMut(FunctionRef),
) -> bool {
    if !visit(Node::Type(ty)) {
        return false;
    }
    match &ty.kind {
        TypeKind::Simple { generics, .. } => generics
            .iter()
            .all(|g| walk_type_linked(g, visit, on_function)),
        TypeKind::Pointer { inner } => walk_type_linked(inner, visit, on_function),
        TypeKind::Function { ret, parameters, .. } => {
            walk_type_linked(ret, visit, on_function)
                && parameters
                    .iter()
                    .all(|p| walk_type_linked(p, visit, on_function))
        }
        TypeKind::StackArray { element, length } => {
            walk_type_linked(element, visit, on_function)
                && length
                    .as_ref()
                    .map(|l| walk_expression_linked(l, visit, on_function))
                    .unwrap_or(true)
        }
        TypeKind::Missing(_) => true,
    }
}

fn walk_parameter_linked(
    parameter: &ParameterDefinition,
    visit: &mut dyn FnMut(Node<'_>) -> bool,
    on_function: &mut dyn FnMut(FunctionRef),
) -> bool {
    if !visit(Node::Parameter(parameter)) {
        return false;
    }
    walk_type_linked(&parameter.ty, visit, on_function)
        && parameter
            .default_value
            .as_ref()
            .map(|d| walk_expression_linked(d, visit, on_function))
            .unwrap_or(true)
}
