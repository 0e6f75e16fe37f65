//! Integration tests for the Rill front-end pipeline.

use rillc::prelude::*;
use std::collections::HashSet;

fn parse_str(source: &str) -> (ParserResult, DiagnosticsCollection) {
    let mut diagnostics = DiagnosticsCollection::new();
    let result = rillc::parse_source(source, "test.rill", &mut diagnostics);
    (result, diagnostics)
}

fn parse_with_defines(source: &str, defines: &[&str]) -> (ParserResult, DiagnosticsCollection) {
    let mut diagnostics = DiagnosticsCollection::new();
    let defines: HashSet<String> = defines.iter().map(|s| s.to_string()).collect();
    let tokens = tokenize(source, "test.rill", &mut diagnostics, &defines);
    let result = parse(tokens, "test.rill", &mut diagnostics);
    (result, diagnostics)
}

#[test]
fn test_struct_with_two_fields() {
    let (result, diagnostics) = parse_str("struct Point { int x; int y; }");
    assert!(diagnostics.is_empty());
    assert_eq!(result.structs.len(), 1);
    let point = &result.structs[0];
    assert_eq!(point.name.content, "Point");
    assert_eq!(point.fields.len(), 2);
    assert!(point.methods.is_empty());
}

#[test]
fn test_function_with_binary_return() {
    let (result, diagnostics) = parse_str("int add(int a, int b) { return a + b; }");
    assert!(diagnostics.is_empty());
    assert_eq!(result.functions.len(), 1);
    let add = &result.functions[0];
    assert_eq!(add.body.statements.len(), 1);
    let StmtKind::Return { value: Some(value) } = &add.body.statements[0].kind else {
        panic!("expected return with value");
    };
    let ExprKind::Binary(binary) = &value.kind else {
        panic!("expected binary operator call");
    };
    assert_eq!(binary.operator.content, "+");
    assert_eq!(binary.left.to_string(), "a");
    assert_eq!(binary.right.to_string(), "b");
}

#[test]
fn test_precedence_in_initializer() {
    let (result, diagnostics) = parse_str("int x = 1 + 2 * 3;");
    assert!(diagnostics.is_empty());
    let StmtKind::VariableDefinition(var) = &result.top_level_statements[0].kind else {
        panic!("expected variable definition");
    };
    let init = var.initializer.as_ref().unwrap();
    assert_eq!(init.to_string(), "1 + 2 * 3");
    let ExprKind::Binary(top) = &init.kind else { panic!() };
    assert_eq!(top.operator.content, "+");
    let ExprKind::Binary(product) = &top.right.kind else {
        panic!("expected the multiplication nested on the right");
    };
    assert_eq!(product.operator.content, "*");
}

#[test]
fn test_preprocessor_selects_arm() {
    let source = "#if FEATURE\nint f() { return 1; }\n#else\nint g() { return 2; }\n#endif\n";

    let (result, diagnostics) = parse_with_defines(source, &["FEATURE"]);
    assert!(diagnostics.is_empty());
    assert_eq!(result.functions.len(), 1);
    assert_eq!(result.functions[0].name.content, "f");

    let (result, diagnostics) = parse_with_defines(source, &[]);
    assert!(diagnostics.is_empty());
    assert_eq!(result.functions.len(), 1);
    assert_eq!(result.functions[0].name.content, "g");
}

#[test]
fn test_truncated_function_reports_parameter_type() {
    let (result, diagnostics) = parse_str("int f(");
    assert_eq!(result.functions.len(), 0);
    assert!(diagnostics.has_errors());
    let mut rendered = String::new();
    diagnostics.write_errors_to(&mut rendered).unwrap();
    assert!(rendered.contains("Expected a parameter type"));
}

#[test]
fn test_nested_generics_split_shift_token() {
    let (result, diagnostics) = parse_str("List<Dict<int, int>> m;");
    assert!(diagnostics.is_empty());

    let StmtKind::VariableDefinition(var) = &result.top_level_statements[0].kind else {
        panic!("expected variable definition");
    };
    let ty = var.ty.as_ref().unwrap();
    assert_eq!(ty.to_string(), "List<Dict<int, int>>");
    let TypeKind::Simple { name, generics } = &ty.kind else { panic!() };
    assert_eq!(name.content, "List");
    let TypeKind::Simple { name, generics: inner } = &generics[0].kind else { panic!() };
    assert_eq!(name.content, "Dict");
    assert_eq!(inner.len(), 2);

    // The `>>` was split in place: the working list carries two separate
    // `>` tokens, the original list still the one `>>`.
    assert!(!result.filtered_tokens.iter().any(|t| t.is_operator(">>")));
    assert_eq!(
        result.filtered_tokens.iter().filter(|t| t.is_operator(">")).count(),
        2
    );
    assert!(result.original_tokens.iter().any(|t| t.is_operator(">>")));
}

#[test]
fn test_spaced_generics_parse_identically() {
    let (compact, _) = parse_str("List<Dict<int, int>> m;");
    let (spaced, _) = parse_str("List < Dict < int , int > > m;");
    let ty_of = |result: &ParserResult| match &result.top_level_statements[0].kind {
        StmtKind::VariableDefinition(var) => var.ty.as_ref().unwrap().to_string(),
        _ => panic!("expected variable definition"),
    };
    assert_eq!(ty_of(&compact), ty_of(&spaced));
}

#[test]
fn test_empty_input_is_clean() {
    let (result, diagnostics) = parse_str("");
    assert!(result.functions.is_empty());
    assert!(result.operators.is_empty());
    assert!(result.structs.is_empty());
    assert!(result.usings.is_empty());
    assert!(result.aliases.is_empty());
    assert!(result.top_level_statements.is_empty());
    assert!(result.original_tokens.is_empty());
    assert!(result.filtered_tokens.is_empty());
    assert_eq!(diagnostics.len(), 0);
}

#[test]
fn test_filtered_tokens_length_invariant() {
    // The filtered list equals the trivia-free view of the tokenizer's
    // output, except for documented splits (`>>` → `>` `>`).
    let (result, _) = parse_str("List<Dict<int, int>> m;");
    let significant = result
        .original_tokens
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .count();
    assert_eq!(result.filtered_tokens.len(), significant + 1);

    let (result, _) = parse_str("int x = 1 + 2;");
    let significant = result
        .original_tokens
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .count();
    assert_eq!(result.filtered_tokens.len(), significant);
}

#[test]
fn test_invalid_hex_and_binary_literals() {
    let (result, diagnostics) = parse_str("int a = 0x;\nint b = 0b;");
    let mut rendered = String::new();
    diagnostics.write_errors_to(&mut rendered).unwrap();
    assert!(rendered.contains("Invalid hex literal"));
    assert!(rendered.contains("Invalid binary literal"));

    // Both literals still parse, with value zero.
    for statement in &result.top_level_statements {
        let StmtKind::VariableDefinition(var) = &statement.kind else { panic!() };
        let ExprKind::Literal(literal) = &var.initializer.as_ref().unwrap().kind else {
            panic!("expected literal initializer");
        };
        assert!(matches!(literal.value, LiteralValue::Int { value: 0, .. }));
    }
}

#[test]
fn test_underscore_only_digits_are_zero() {
    let (result, diagnostics) = parse_str("int a = 0x___;");
    assert!(!diagnostics.has_errors());
    let StmtKind::VariableDefinition(var) = &result.top_level_statements[0].kind else {
        panic!()
    };
    let ExprKind::Literal(literal) = &var.initializer.as_ref().unwrap().kind else { panic!() };
    assert!(matches!(literal.value, LiteralValue::Int { value: 0, .. }));
}

#[test]
fn test_missing_brace_recovery() {
    let (result, diagnostics) = parse_str("int f() { return 1;");
    assert_eq!(result.functions.len(), 1);
    assert!(diagnostics.has_errors());
    let mut rendered = String::new();
    diagnostics.write_errors_to(&mut rendered).unwrap();
    assert!(rendered.contains("Expected '}'"));
}

#[test]
fn test_missing_nodes_anchor_positions() {
    let (result, diagnostics) = parse_str("int f() { return 1 + ; }");
    assert!(diagnostics.has_errors());
    let body = &result.functions[0].body;
    let StmtKind::Return { value: Some(value) } = &body.statements[0].kind else { panic!() };
    let ExprKind::Binary(binary) = &value.kind else { panic!() };
    assert!(binary.right.is_missing());
    // The placeholder is zero-width and sits after the operator.
    assert!(binary.right.location.span.is_empty());
    assert_eq!(
        binary.right.location.span.start_offset,
        binary.operator.span.end_offset
    );
}

#[test]
fn test_node_positions_contained_in_function() {
    let (result, _) = parse_str("int f(int a) { while (a < 10) { a += 1; } return a; }");
    let function = &result.functions[0];
    let outer = function.location.span;
    for statement in &function.body.statements {
        assert!(outer.contains(&statement.location.span));
        walk_statement(statement, &mut |node| {
            let span = match node {
                Node::Stmt(s) => s.location.span,
                Node::Expr(e) => e.location.span,
                Node::Type(t) => t.location.span,
                Node::Block(b) => b.location.span,
                Node::Parameter(p) => p.location.span,
            };
            assert!(outer.contains(&span));
            true
        });
    }
}

#[test]
fn test_expression_roundtrip_retokenizes() {
    let (result, _) = parse_str("int x = a.b[0] + f(1, 2) * 3;");
    let StmtKind::VariableDefinition(var) = &result.top_level_statements[0].kind else {
        panic!()
    };
    let rendered = var.initializer.as_ref().unwrap().to_string();

    let mut diagnostics = DiagnosticsCollection::new();
    let retokenized = tokenize(&rendered, "roundtrip.rill", &mut diagnostics, &HashSet::new());
    let significant: Vec<&str> = retokenized
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(
        significant,
        vec!["a", ".", "b", "[", "0", "]", "+", "f", "(", "1", ",", "2", ")", "*", "3"]
    );
}

#[test]
fn test_full_program() {
    let source = r#"
        using "collections.rill";
        using core.text;

        alias Predicate = @closure bool(int);

        export struct Stack<T> {
            int count;
            T[16] slots;

            new(int capacity) { count = 0; }
            ~() { }

            T [](int index) { return slots[index]; }
            void []=(int index, T value) { slots[index] = value; }

            void push(T value) {
                slots[count] = value;
                count++;
            }
        }

        Stack +(Stack a, Stack b) { return a; }

        int main() {
            var stack = new Stack(16);
            for (int i = 0; i < 4; i = i + 1) {
                stack.push(i * i);
            }
            if (stack.count > 0) {
                return stack[0];
            }
            return 0;
        }
    "#;
    let (result, diagnostics) = parse_str(source);
    let mut rendered = String::new();
    diagnostics.write_errors_to(&mut rendered).unwrap();
    assert!(!diagnostics.has_errors(), "unexpected errors:\n{}", rendered);

    assert_eq!(result.usings.len(), 2);
    assert_eq!(result.aliases.len(), 1);
    assert_eq!(result.structs.len(), 1);
    assert_eq!(result.operators.len(), 1);
    assert_eq!(result.functions.len(), 1);

    let stack = &result.structs[0];
    assert_eq!(stack.fields.len(), 2);
    assert_eq!(stack.constructors.len(), 1);
    assert_eq!(stack.general_methods.len(), 3);
    assert_eq!(stack.methods.len(), 1);
    assert_eq!(stack.modifiers.len(), 1);
}

#[test]
fn test_diagnostics_render_with_snippets() {
    let source = "int x = ;";
    let mut diagnostics = DiagnosticsCollection::new();
    let _ = rillc::parse_source(source, "snippet.rill", &mut diagnostics);
    assert!(diagnostics.has_errors());

    let mut memory = MemorySourceProvider::new();
    memory.insert("snippet.rill", source);
    let mut providers = SourceProviderSet::new();
    providers.register(Box::new(memory));

    let mut rendered = String::new();
    diagnostics.write_to(&mut rendered, Some(&providers)).unwrap();
    assert!(rendered.contains("ERROR (snippet.rill:1:"));
    assert!(rendered.contains("int x = ;"));
    assert!(rendered.contains('^'));
}

#[test]
fn test_analyzed_kinds_assigned() {
    let (result, _) = parse_str("struct Point { int x; }\nint origin(Point p) { return p.x; }");
    let find = |content: &str, kind: AnalyzedKind| {
        result
            .filtered_tokens
            .iter()
            .any(|t| t.content == content && t.analyzed_kind == kind)
    };
    assert!(find("struct", AnalyzedKind::Keyword));
    assert!(find("Point", AnalyzedKind::StructName));
    assert!(find("int", AnalyzedKind::TypeName));
    assert!(find("x", AnalyzedKind::FieldName));
    assert!(find("origin", AnalyzedKind::FunctionName));
    assert!(find("p", AnalyzedKind::ParameterName));
}

#[test]
fn test_lambda_and_list_in_program() {
    let source = "var square = (int x) => x * x;\nvar firsts = [1, 2, 3];";
    let (result, diagnostics) = parse_str(source);
    assert!(!diagnostics.has_errors());
    assert_eq!(result.top_level_statements.len(), 2);
}

#[test]
fn test_pointer_heavy_statements() {
    let source = r#"
        int deref(int* p) {
            int v = *p;
            int* q = &v;
            delete q;
            return v;
        }
    "#;
    let (result, diagnostics) = parse_str(source);
    assert!(!diagnostics.has_errors());
    assert_eq!(result.functions.len(), 1);
}
