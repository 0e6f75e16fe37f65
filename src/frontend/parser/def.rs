//! Parsing of top-level items and struct members.
//!
//! Every alternative for one input runs through
//! [`Parser::attempt`](super::Parser::attempt): its diagnostics are held in
//! an override scope and, on failure, move into an ordered collection
//! keyed by how many tokens the alternative consumed. When nothing
//! matches, only the failure explanations that got furthest are reported.

use super::Parser;
use crate::frontend::ast::{
    AliasDefinition, AttributeUsage, Block, ConstructorDefinition, Expr, FieldDefinition,
    FunctionDefinition, GeneralFunctionDefinition, GeneralFunctionKind, OperatorDefinition,
    OperatorName, ParameterDefinition, ParameterDefinitionCollection, ParserResult,
    StructDefinition, TemplateInfo, TypeInstance, TypeKind, UsingDefinition, UsingTarget,
};
use crate::frontend::token::{operators, AnalyzedKind, Token, TokenKind};
use crate::utils::diagnostics::{Diagnostic, OrderedDiagnosticCollection};
use crate::utils::intern::keywords;
use crate::frontend::parser::ty::AllowedType;

/// Modifiers admitted on definitions (functions, structs, aliases, fields).
const DEFINITION_MODIFIERS: &[&str] = &["export", "private", "inline", "const"];
/// Parameter modifiers admitted on functions and general functions.
const FUNCTION_PARAM_MODIFIERS: &[&str] = &["ref", "temp", "const", "this"];
/// Parameter modifiers admitted on operators.
const OPERATOR_PARAM_MODIFIERS: &[&str] = &["ref", "temp", "const", "this"];
/// Parameter modifiers admitted on constructors.
const CONSTRUCTOR_PARAM_MODIFIERS: &[&str] = &["ref", "temp", "const"];

impl<'d> Parser<'d> {
    /// Parse one top-level item into `result`, trying the alternatives in
    /// order and recovering when none of them matches.
    pub(crate) fn parse_top_item(&mut self, result: &mut ParserResult) {
        let mut candidates = OrderedDiagnosticCollection::new();

        if let Some(using) = self.attempt(&mut candidates, |p| p.try_parse_using()) {
            result.usings.push(using);
            return;
        }
        if let Some(definition) = self.attempt(&mut candidates, |p| p.try_parse_struct()) {
            result.structs.push(definition);
            return;
        }
        if let Some(alias) = self.attempt(&mut candidates, |p| p.try_parse_alias()) {
            result.aliases.push(alias);
            return;
        }
        if let Some(function) = self.attempt(&mut candidates, |p| p.try_parse_function()) {
            result.functions.push(function);
            return;
        }
        if let Some(operator) = self.attempt(&mut candidates, |p| p.try_parse_operator()) {
            result.operators.push(operator);
            return;
        }
        if let Some(statement) = self.attempt(&mut candidates, |p| p.try_parse_statement()) {
            result.top_level_statements.push(statement);
            return;
        }

        if candidates.is_empty() {
            let location = self.here();
            self.diagnostics.add(
                Diagnostic::error("Expected a declaration or statement").with_location(location),
            );
        } else {
            candidates.commit_into(self.diagnostics);
        }
        self.synchronize_top_level();
    }

    /// Skip to a point a fresh top-level item (or struct member) could
    /// start from. Stops before a closing `}` so the enclosing body loop
    /// sees it.
    fn synchronize_top_level(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() {
            let stopped = self
                .previous()
                .map(|t| t.is_operator(";") || t.is_operator("}"))
                .unwrap_or(false);
            if stopped {
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
                            keywords::DECLARATION_SYMS.contains(&s)
                                || keywords::STATEMENT_SYMS.contains(&s)
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

    // -- shared prefixes --------------------------------------------------

    /// `@name` / `@name(args)` usages before a definition.
    pub(crate) fn parse_attribute_usages(&mut self) -> Vec<AttributeUsage> {
        let mut attributes = Vec::new();
        while self.check_operator("@") {
            let mark = self.mark();
            self.advance(); // '@'
            let name = match self.expect_identifier() {
                Some(_) => self.tag_previous(AnalyzedKind::Attribute),
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected an attribute name")
                            .with_location(location.clone()),
                    );
                    Token::missing(TokenKind::Identifier, "", location.span)
                }
            };
            let arguments: Vec<Expr> = if self.check_operator("(") {
                self.parse_argument_list().arguments
            } else {
                Vec::new()
            };
            let location = self.location(self.span_since(mark));
            attributes.push(AttributeUsage { name, arguments, location });
        }
        attributes
    }

    /// Definition-level modifier keywords (`export`, `inline`, …).
    /// Disallowed ones are diagnosed but kept.
    pub(crate) fn parse_modifier_tokens(&mut self, allowed: &[&str]) -> Vec<Token> {
        let mut modifiers = Vec::new();
        loop {
            let is_modifier = self
                .peek()
                .map(|t| {
                    t.kind == TokenKind::Identifier
                        && t.symbol.is_some_and(|s| {
                            keywords::MODIFIER_SYMS.contains(&s)
                                || keywords::PROTECTION_SYMS.contains(&s)
                        })
                        && !t.is_symbol(*keywords::THIS)
                })
                .unwrap_or(false);
            if !is_modifier {
                break;
            }
            self.advance();
            let token = self.tag_previous(AnalyzedKind::Modifier);
            if !allowed.contains(&token.content.as_str()) {
                self.diagnostics.add(
                    Diagnostic::error(format!(
                        "The modifier '{}' is not allowed here",
                        token.content
                    ))
                    .with_location(self.location(token.span)),
                );
            }
            modifiers.push(token);
        }
        modifiers
    }

    fn block_or_missing(&mut self, what: &str) -> Block {
        match self.try_parse_block() {
            Some(block) => block,
            None => {
                let location = self.after_previous();
                self.diagnostics.add(
                    Diagnostic::error(format!("Expected {}", what)).with_location(location.clone()),
                );
                Block::missing(location)
            }
        }
    }

    // -- using / alias ----------------------------------------------------

    /// `using "path";` or `using a.b.c;`
    fn try_parse_using(&mut self) -> Option<UsingDefinition> {
        let mark = self.mark();
        self.expect_keyword(*keywords::USING)?;

        let target = if let Some(path) = self.expect_literal() {
            if path.kind != TokenKind::LiteralString {
                self.diagnostics.add(
                    Diagnostic::error("An import path must be a string literal")
                        .with_location(self.location(path.span)),
                );
            }
            UsingTarget::Path(path)
        } else {
            let mut segments = Vec::new();
            match self.expect_identifier() {
                Some(segment) => segments.push(segment),
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected an import path after 'using'")
                            .with_location(location.clone()),
                    );
                    segments.push(Token::missing(TokenKind::Identifier, "", location.span));
                }
            }
            while self.expect_operator(".").is_some() {
                match self.expect_identifier() {
                    Some(segment) => segments.push(segment),
                    None => {
                        let location = self.after_previous();
                        self.diagnostics.add(
                            Diagnostic::error("Expected an identifier after '.'")
                                .with_location(location.clone()),
                        );
                        segments.push(Token::missing(TokenKind::Identifier, "", location.span));
                        break;
                    }
                }
            }
            UsingTarget::Module(segments)
        };
        self.require_semicolon();
        let location = self.location(self.span_since(mark));
        Some(UsingDefinition { target, location })
    }

    /// `alias Name = Type;`
    fn try_parse_alias(&mut self) -> Option<AliasDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        self.expect_keyword(*keywords::ALIAS)?;

        let name = match self.expect_identifier() {
            Some(_) => self.tag_previous(AnalyzedKind::TypeName),
            None => self.missing_token(TokenKind::Identifier, "", "an alias name"),
        };
        self.expect_operator_or_missing("=");
        let target = match self.try_parse_type(AllowedType::ANY) {
            Some(target) => target,
            None => {
                let location = self.after_previous();
                self.diagnostics.add(
                    Diagnostic::error("Expected the aliased type").with_location(location.clone()),
                );
                TypeInstance::missing(location)
            }
        };
        self.require_semicolon();
        let location = self.location(self.span_since(mark));
        Some(AliasDefinition { name, target, attributes, modifiers, location })
    }

    // -- functions and operators ------------------------------------------

    /// `attr* modifier* ret_type name ( params ) block`
    fn try_parse_function(&mut self) -> Option<FunctionDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        let return_type = self.try_parse_type(AllowedType::RETURN)?;
        self.expect_identifier()?;
        let name = self.tag_previous(AnalyzedKind::FunctionName);
        if !self.check_operator("(") {
            return None;
        }
        let parameters = self.parse_parameter_definitions(FUNCTION_PARAM_MODIFIERS, true)?;
        let body = self.block_or_missing("a function body");
        let location = self.location(self.span_since(mark));
        Some(FunctionDefinition {
            return_type,
            name,
            parameters,
            body,
            attributes,
            modifiers,
            location,
        })
    }

    /// `attr* modifier* ret_type OP ( params ) block` with `OP` an
    /// overloadable operator or the `(` `)` pair for the call operator.
    fn try_parse_operator(&mut self) -> Option<OperatorDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        let return_type = self.try_parse_type(AllowedType::RETURN)?;

        let operator = if let Some(token) = self.expect_any_operator(operators::OVERLOADABLE) {
            OperatorName::Symbolic(token)
        } else if self.check_operator("(")
            && self.peek_at(1).map(|t| t.is_operator(")")).unwrap_or(false)
        {
            let open = self.advance()?;
            let close = self.advance()?;
            OperatorName::Call { open, close }
        } else {
            return None;
        };

        if !self.check_operator("(") {
            return None;
        }
        let parameters = self.parse_parameter_definitions(OPERATOR_PARAM_MODIFIERS, false)?;
        let body = self.block_or_missing("an operator body");
        let location = self.location(self.span_since(mark));
        Some(OperatorDefinition {
            return_type,
            operator,
            parameters,
            body,
            attributes,
            modifiers,
            location,
        })
    }

    // -- structs ----------------------------------------------------------

    /// `attr* modifier* struct Name template? { member* }`
    fn try_parse_struct(&mut self) -> Option<StructDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        self.expect_keyword(*keywords::STRUCT)?;

        let name = match self.expect_identifier() {
            Some(_) => self.tag_previous(AnalyzedKind::StructName),
            None => self.missing_token(TokenKind::Identifier, "", "a struct name"),
        };
        let template = self.try_parse_template();

        let mut definition = StructDefinition {
            name,
            template,
            fields: Vec::new(),
            methods: Vec::new(),
            general_methods: Vec::new(),
            operators: Vec::new(),
            constructors: Vec::new(),
            attributes,
            modifiers,
            location: self.location(self.span_since(mark)),
        };

        self.expect_operator_or_missing("{");
        loop {
            if self.expect_operator("}").is_some() {
                break;
            }
            if self.is_at_end() {
                self.missing_token(TokenKind::Operator, "}", "'}'");
                break;
            }
            let before = self.pos;
            self.parse_struct_member(&mut definition);
            if !self.is_at_end() && self.pos == before {
                self.stall("Parser failed to advance inside a struct body");
                break;
            }
        }
        definition.location = self.location(self.span_since(mark));
        Some(definition)
    }

    /// `<T, U>` after a struct name. `<>` is legal but suspect.
    fn try_parse_template(&mut self) -> Option<TemplateInfo> {
        let mark = self.mark();
        self.expect_operator("<")?;
        let mut parameters = Vec::new();
        if self.expect_operator(">").is_some() {
            let location = self.location(self.span_since(mark));
            self.diagnostics
                .add(Diagnostic::warning("Empty template").with_location(location.clone()));
            return Some(TemplateInfo { parameters, location });
        }
        loop {
            match self.expect_identifier() {
                Some(_) => parameters.push(self.tag_previous(AnalyzedKind::TypeName)),
                None => {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected a template parameter")
                            .with_location(location.clone()),
                    );
                    parameters.push(Token::missing(TokenKind::Identifier, "", location.span));
                }
            }
            if self.expect_operator(",").is_some() {
                continue;
            }
            break;
        }
        self.expect_operator_or_missing(">");
        let location = self.location(self.span_since(mark));
        Some(TemplateInfo { parameters, location })
    }

    /// One struct member: constructor, destructor, indexer, operator,
    /// method, or field.
    fn parse_struct_member(&mut self, definition: &mut StructDefinition) {
        let mut candidates = OrderedDiagnosticCollection::new();

        if let Some(constructor) = self.attempt(&mut candidates, |p| p.try_parse_constructor()) {
            definition.constructors.push(constructor);
            return;
        }
        if let Some(destructor) = self.attempt(&mut candidates, |p| p.try_parse_destructor()) {
            definition.general_methods.push(destructor);
            return;
        }
        if let Some(indexer) = self.attempt(&mut candidates, |p| p.try_parse_indexer()) {
            definition.general_methods.push(indexer);
            return;
        }
        if let Some(operator) = self.attempt(&mut candidates, |p| p.try_parse_operator()) {
            definition.operators.push(operator);
            return;
        }
        if let Some(method) = self.attempt(&mut candidates, |p| p.try_parse_function()) {
            definition.methods.push(method);
            return;
        }
        if let Some(field) = self.attempt(&mut candidates, |p| p.try_parse_field()) {
            definition.fields.push(field);
            return;
        }

        if candidates.is_empty() {
            let location = self.here();
            self.diagnostics
                .add(Diagnostic::error("Expected a struct member").with_location(location));
        } else {
            candidates.commit_into(self.diagnostics);
        }
        self.synchronize_top_level();
    }

    /// `new ( params ) block`
    fn try_parse_constructor(&mut self) -> Option<ConstructorDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        self.expect_keyword(*keywords::NEW)?;
        if !self.check_operator("(") {
            return None;
        }
        let parameters = self.parse_parameter_definitions(CONSTRUCTOR_PARAM_MODIFIERS, true)?;
        let body = self.block_or_missing("a constructor body");
        let location = self.location(self.span_since(mark));
        Some(ConstructorDefinition { parameters, body, attributes, modifiers, location })
    }

    /// `~ ( ) block`
    fn try_parse_destructor(&mut self) -> Option<GeneralFunctionDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        self.expect_operator("~")?;
        if !self.check_operator("(") {
            return None;
        }
        let parameters = self.parse_parameter_definitions(&[], false)?;
        if !parameters.is_empty() {
            self.diagnostics.add(
                Diagnostic::error("A destructor takes no parameters")
                    .with_location(parameters.location.clone()),
            );
        }
        let body = self.block_or_missing("a destructor body");
        let location = self.location(self.span_since(mark));
        Some(GeneralFunctionDefinition {
            kind: GeneralFunctionKind::Destructor,
            return_type: None,
            parameters,
            body,
            attributes,
            modifiers,
            location,
        })
    }

    /// `ret_type [] ( params ) block` and `ret_type []= ( params ) block`.
    ///
    /// The return type is parsed greedily, so the `[]` arrives as an
    /// unsized stack-array wrapper that is unwrapped again here.
    fn try_parse_indexer(&mut self) -> Option<GeneralFunctionDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        let wrapped = self.try_parse_type(AllowedType::GENERAL)?;
        let TypeKind::StackArray { element, length: None } = wrapped.kind else {
            return None;
        };
        let kind = if self.expect_operator("=").is_some() {
            GeneralFunctionKind::IndexerSet
        } else {
            GeneralFunctionKind::IndexerGet
        };
        if !self.check_operator("(") {
            return None;
        }
        let parameters = self.parse_parameter_definitions(FUNCTION_PARAM_MODIFIERS, false)?;
        let body = self.block_or_missing("an indexer body");
        let location = self.location(self.span_since(mark));
        Some(GeneralFunctionDefinition {
            kind,
            return_type: Some(*element),
            parameters,
            body,
            attributes,
            modifiers,
            location,
        })
    }

    /// `attr* modifier* type name ;`
    fn try_parse_field(&mut self) -> Option<FieldDefinition> {
        let mark = self.mark();
        let attributes = self.parse_attribute_usages();
        let modifiers = self.parse_modifier_tokens(DEFINITION_MODIFIERS);
        let ty = self.try_parse_type(AllowedType::VALUE)?;
        self.expect_identifier()?;
        let name = self.tag_previous(AnalyzedKind::FieldName);
        self.expect_operator(";")?;
        let location = self.location(self.span_since(mark));
        Some(FieldDefinition {
            ty,
            name,
            attributes,
            modifiers,
            location,
            resolved_type: None,
        })
    }

    // -- parameters -------------------------------------------------------

    /// `( param (, param)* )` with the context's modifier set and
    /// default-value policy.
    ///
    /// Returns `None` when the list runs into end-of-input, failing the
    /// surrounding production; every in-list problem is recovered with
    /// diagnostics and placeholder nodes. Constraint violations (modifier
    /// not allowed, `this` not first, gaps after defaults) are diagnosed
    /// but the offending parameter is kept.
    pub(crate) fn parse_parameter_definitions(
        &mut self,
        allowed_modifiers: &[&str],
        allow_default_values: bool,
    ) -> Option<ParameterDefinitionCollection> {
        let mark = self.mark();
        self.expect_operator("(")?;
        let mut parameters: Vec<ParameterDefinition> = Vec::new();
        let mut seen_default = false;

        if !self.check_operator(")") {
            loop {
                if self.is_at_end() {
                    let location = self.after_previous();
                    self.diagnostics.add(
                        Diagnostic::error("Expected a parameter type").with_location(location),
                    );
                    return None;
                }
                let param_mark = self.mark();
                let modifiers = self.parse_parameter_modifiers(allowed_modifiers);
                if modifiers.iter().any(|m| m.content == "this") && !parameters.is_empty() {
                    let location = self.location(self.span_since(param_mark));
                    self.diagnostics.add(
                        Diagnostic::error("The 'this' modifier is only valid on the first parameter")
                            .with_location(location),
                    );
                }

                let ty = match self.try_parse_type(AllowedType::ANY) {
                    Some(ty) => ty,
                    None => {
                        self.diagnostics.add(
                            Diagnostic::error("Expected a parameter type")
                                .with_location(self.here()),
                        );
                        TypeInstance::missing(self.after_previous())
                    }
                };
                let name = match self.expect_identifier() {
                    Some(_) => self.tag_previous(AnalyzedKind::ParameterName),
                    None => self.missing_token(TokenKind::Identifier, "", "a parameter name"),
                };

                let default_value = if self.expect_operator("=").is_some() {
                    let value = match self.try_parse_expression() {
                        Some(value) => value,
                        None => {
                            let location = self.after_previous();
                            self.diagnostics.add(
                                Diagnostic::error("Expected a default value")
                                    .with_location(location.clone()),
                            );
                            Expr::missing(location)
                        }
                    };
                    if allow_default_values {
                        seen_default = true;
                        Some(value)
                    } else {
                        // Diagnosed and dropped: a collection parsed
                        // without default support never carries one.
                        self.diagnostics.add(
                            Diagnostic::error("Default parameter values are not allowed here")
                                .with_location(value.location.clone()),
                        );
                        None
                    }
                } else {
                    if seen_default {
                        let location = self.location(self.span_since(param_mark));
                        self.diagnostics.add(
                            Diagnostic::error(
                                "A parameter without a default value may not follow one with a default value",
                            )
                            .with_location(location),
                        );
                    }
                    None
                };

                let location = self.location(self.span_since(param_mark));
                parameters.push(ParameterDefinition {
                    modifiers,
                    ty,
                    name,
                    default_value,
                    location,
                    resolved_type: None,
                });

                if self.expect_operator(",").is_some() {
                    continue;
                }
                break;
            }
        }

        if self.expect_operator(")").is_none() {
            if self.is_at_end() {
                let location = self.after_previous();
                self.diagnostics
                    .add(Diagnostic::error("Expected ')'").with_location(location));
                return None;
            }
            self.expect_operator_or_missing(")");
        }
        let location = self.location(self.span_since(mark));
        Some(ParameterDefinitionCollection { parameters, location })
    }

    /// Parameter-level modifiers; `this` is admitted here (and nowhere
    /// else). Disallowed ones are diagnosed but kept.
    fn parse_parameter_modifiers(&mut self, allowed: &[&str]) -> Vec<Token> {
        let mut modifiers = Vec::new();
        loop {
            let token = match self.peek() {
                Some(t)
                    if t.kind == TokenKind::Identifier
                        && t.symbol
                            .is_some_and(|s| keywords::MODIFIER_SYMS.contains(&s)) =>
                {
                    t
                }
                _ => break,
            };
            // `this point` is a modifier use; a bare `this` before `,`/`)`
            // would be a (malformed) value, not a modifier.
            let next_starts_type = self
                .peek_at(1)
                .map(|t| t.kind == TokenKind::Identifier)
                .unwrap_or(false);
            if token.is_symbol(*keywords::THIS) && !next_starts_type {
                break;
            }
            self.advance();
            let token = self.tag_previous(AnalyzedKind::Modifier);
            if !allowed.contains(&token.content.as_str()) {
                self.diagnostics.add(
                    Diagnostic::error(format!(
                        "The modifier '{}' is not allowed on this parameter",
                        token.content
                    ))
                    .with_location(self.location(token.span)),
                );
            }
            modifiers.push(token);
        }
        modifiers
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::{GeneralFunctionKind, StmtKind, UsingTarget};
    use crate::frontend::parser::tests::parse_source;

    #[test]
    fn test_struct_with_fields() {
        let (result, diagnostics) = parse_source("struct Point { int x; int y; }");
        assert!(diagnostics.is_empty());
        assert_eq!(result.structs.len(), 1);
        let point = &result.structs[0];
        assert_eq!(point.name.content, "Point");
        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields[0].name.content, "x");
        assert_eq!(point.fields[1].name.content, "y");
    }

    #[test]
    fn test_function_definition() {
        let (result, diagnostics) = parse_source("int add(int a, int b) { return a + b; }");
        assert!(diagnostics.is_empty());
        assert_eq!(result.functions.len(), 1);
        let add = &result.functions[0];
        assert_eq!(add.name.content, "add");
        assert_eq!(add.parameters.len(), 2);
        assert_eq!(add.body.statements.len(), 1);
        assert!(matches!(add.body.statements[0].kind, StmtKind::Return { .. }));
    }

    #[test]
    fn test_using_forms() {
        let (result, diagnostics) = parse_source("using \"util.rill\";\nusing core.math;\n");
        assert!(diagnostics.is_empty());
        assert_eq!(result.usings.len(), 2);
        assert!(matches!(result.usings[0].target, UsingTarget::Path(_)));
        match &result.usings[1].target {
            UsingTarget::Module(segments) => assert_eq!(segments.len(), 2),
            other => panic!("expected module target, got {:?}", other),
        }
    }

    #[test]
    fn test_alias_definition() {
        let (result, diagnostics) = parse_source("alias Callback = @closure void(int);");
        assert!(diagnostics.is_empty());
        assert_eq!(result.aliases.len(), 1);
        assert_eq!(result.aliases[0].name.content, "Callback");
    }

    #[test]
    fn test_operator_definition() {
        let (result, diagnostics) =
            parse_source("Point +(Point a, Point b) { return a; }");
        assert!(diagnostics.is_empty());
        assert_eq!(result.operators.len(), 1);
        assert_eq!(result.operators[0].operator.text(), "+");
    }

    #[test]
    fn test_call_operator_definition() {
        let (result, diagnostics) = parse_source("int ()(int x) { return x; }");
        assert!(diagnostics.is_empty());
        assert_eq!(result.operators.len(), 1);
        assert_eq!(result.operators[0].operator.text(), "()");
    }

    #[test]
    fn test_struct_members_grouped() {
        let source = r#"
            struct Buffer<T> {
                int capacity;
                new(int capacity) { }
                ~() { }
                T [](int index) { return data[index]; }
                void []=(int index, T value) { }
                Buffer +(Buffer a, Buffer b) { return a; }
                int size() { return capacity; }
            }
        "#;
        let (result, diagnostics) = parse_source(source);
        assert!(!diagnostics.has_errors(), "unexpected errors");
        let buffer = &result.structs[0];
        assert!(buffer.template.is_some());
        assert_eq!(buffer.fields.len(), 1);
        assert_eq!(buffer.constructors.len(), 1);
        assert_eq!(buffer.general_methods.len(), 3);
        assert_eq!(buffer.operators.len(), 1);
        assert_eq!(buffer.methods.len(), 1);
        let kinds: Vec<_> = buffer.general_methods.iter().map(|g| g.kind).collect();
        assert!(kinds.contains(&GeneralFunctionKind::Destructor));
        assert!(kinds.contains(&GeneralFunctionKind::IndexerGet));
        assert!(kinds.contains(&GeneralFunctionKind::IndexerSet));
    }

    #[test]
    fn test_empty_template_warns() {
        let (result, diagnostics) = parse_source("struct Box<> { int v; }");
        assert!(!diagnostics.has_errors());
        assert!(diagnostics.iter().any(|d| d.message == "Empty template"));
        assert!(result.structs[0].template.is_some());
    }

    #[test]
    fn test_this_parameter_first_only() {
        let (result, diagnostics) =
            parse_source("int len(this string s) { return 0; }");
        assert!(!diagnostics.has_errors());
        assert!(result.functions[0].parameters.parameters[0].has_modifier("this"));

        let (result, diagnostics) =
            parse_source("int bad(int a, this string s) { return 0; }");
        assert!(diagnostics.has_errors());
        // the definition survives with the modifier still present
        assert!(result.functions[0].parameters.parameters[1].has_modifier("this"));
    }

    #[test]
    fn test_default_value_ordering() {
        let (_, diagnostics) = parse_source("int f(int a = 1, int b) { return b; }");
        assert!(diagnostics.has_errors());
        let (result, diagnostics) = parse_source("int f(int a, int b = 2) { return a; }");
        assert!(diagnostics.is_empty());
        assert!(result.functions[0].parameters.parameters[1].default_value.is_some());
    }

    #[test]
    fn test_default_values_rejected_on_operators() {
        let (result, diagnostics) = parse_source("int +(int a, int b = 2) { return a; }");
        assert!(diagnostics.has_errors());
        // the collection never carries a default it was not allowed to have
        assert!(result.operators[0]
            .parameters
            .parameters
            .iter()
            .all(|p| p.default_value.is_none()));
    }

    #[test]
    fn test_truncated_function_header() {
        let (result, diagnostics) = parse_source("int f(");
        assert!(result.functions.is_empty());
        let mut rendered = String::new();
        diagnostics.write_errors_to(&mut rendered).unwrap();
        assert!(rendered.contains("Expected a parameter type"));
    }

    #[test]
    fn test_attributes_on_definitions() {
        let (result, diagnostics) =
            parse_source("@deprecated @inline_hint(2) int f() { return 0; }");
        assert!(diagnostics.is_empty());
        let f = &result.functions[0];
        assert_eq!(f.attributes.len(), 2);
        assert_eq!(f.attributes[0].name.content, "deprecated");
        assert_eq!(f.attributes[1].arguments.len(), 1);
    }

    #[test]
    fn test_modifiers_on_definitions() {
        let (result, diagnostics) = parse_source("export inline int f() { return 0; }");
        assert!(diagnostics.is_empty());
        assert_eq!(result.functions[0].modifiers.len(), 2);
    }

    #[test]
    fn test_disallowed_modifier_kept_with_diagnostic() {
        let (result, diagnostics) = parse_source("ref int f() { return 0; }");
        assert!(diagnostics.has_errors());
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.functions[0].modifiers.len(), 1);
    }

    #[test]
    fn test_garbage_recovers() {
        let (result, diagnostics) = parse_source("??? int f() { return 0; }");
        assert!(diagnostics.has_errors());
        assert_eq!(result.functions.len(), 1);
    }
}
