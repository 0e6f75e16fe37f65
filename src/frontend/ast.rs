//! Abstract syntax tree for Rill.
//!
//! Statements, expressions, and type instances are tagged enums behind a
//! shared `{ kind, location }` header struct; definitions are plain
//! structs. Every node the parser may have to synthesize for recovery has
//! a `Missing*` variant carrying a [`NodeId`], so missing nodes compare
//! equal only to themselves while still anchoring a position.
//!
//! Nodes are immutable after parsing except for the late-binding slots
//! (`resolved_type`, `reference`, `destructor`/`deallocator`) the external
//! semantic phase assigns through `&mut`, and the `analyzed_kind` slots of
//! the tokens they carry.

use crate::frontend::token::Token;
use crate::utils::location::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a synthesized node. Fresh ids are never reused, so two
/// distinct missing nodes never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a type resolved by the external semantic phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub u32);

/// Handle to a function definition resolved by the external semantic phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRef(pub u32);

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// The kind of expression
    pub kind: ExprKind,
    /// Source location
    pub location: Location,
    /// Filled in by the external semantic phase
    pub resolved_type: Option<TypeRef>,
}

impl Expr {
    /// Create a new expression with no resolved type.
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Self { kind, location, resolved_type: None }
    }

    /// Create a missing-expression placeholder.
    pub fn missing(location: Location) -> Self {
        Self::new(ExprKind::Missing(NodeId::fresh()), location)
    }

    /// Create a missing-argument placeholder.
    pub fn missing_argument(location: Location) -> Self {
        Self::new(ExprKind::MissingArgument(NodeId::fresh()), location)
    }

    /// Create a missing-literal placeholder.
    pub fn missing_literal(location: Location) -> Self {
        Self::new(ExprKind::MissingLiteral(NodeId::fresh()), location)
    }

    /// Create a missing-identifier placeholder.
    pub fn missing_identifier(location: Location) -> Self {
        Self::new(ExprKind::MissingIdentifier(NodeId::fresh()), location)
    }

    /// Check whether this node is a recovery placeholder.
    pub fn is_missing(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Missing(_)
                | ExprKind::MissingArgument(_)
                | ExprKind::MissingLiteral(_)
                | ExprKind::MissingIdentifier(_)
        )
    }
}

/// The kind of an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A literal value
    Literal(Literal),
    /// A bare identifier
    Identifier(IdentifierExpr),
    /// Field access: `value.field`
    FieldAccess {
        /// The accessed value
        value: Box<Expr>,
        /// The field name
        field: Token,
    },
    /// Index call: `value[index]`
    IndexCall {
        /// The indexed value
        value: Box<Expr>,
        /// The index expression
        index: Box<Expr>,
        /// Indexer-get overload, filled by the semantic phase
        reference: Option<FunctionRef>,
    },
    /// A call `value(args)`, refined by the semantic phase into a function
    /// call or an indirect call through a function pointer
    AnyCall(AnyCall),
    /// Heap allocation: `new T` or `new T(args)`
    NewInstance(NewInstance),
    /// Binary operator application
    Binary(BinaryOperatorCall),
    /// Unary prefix operator application
    Unary {
        /// The operator token
        operator: Token,
        /// The operand
        operand: Box<Expr>,
        /// Operator overload, filled by the semantic phase
        reference: Option<FunctionRef>,
    },
    /// A modifier-wrapped value in an argument list: `f(ref x)`
    Argument {
        /// Modifier tokens preceding the value
        modifiers: Vec<Token>,
        /// The wrapped value
        value: Box<Expr>,
    },
    /// A list literal: `[a, b, c]`
    List(ListExpr),
    /// A lambda: `(params) => body`
    Lambda(Lambda),
    /// Address-of: `&value`
    GetReference {
        /// The referenced value
        operand: Box<Expr>,
        /// Referenced function, when the operand names one
        reference: Option<FunctionRef>,
    },
    /// Pointer dereference: `*value`
    Dereference {
        /// The dereferenced value
        operand: Box<Expr>,
    },
    /// Managed cast: `(T)value`
    TypeCast {
        /// The target type
        target: TypeInstance,
        /// The cast value
        value: Box<Expr>,
    },
    /// Bit-pattern reinterpretation: `value as T`
    Reinterpret {
        /// The reinterpreted value
        value: Box<Expr>,
        /// The target type
        target: TypeInstance,
    },
    /// A parenthesized expression; the parentheses stop re-association
    Grouped(Box<Expr>),
    /// Recovery placeholder for an absent expression
    Missing(NodeId),
    /// Recovery placeholder for an absent call argument
    MissingArgument(NodeId),
    /// Recovery placeholder for an absent literal
    MissingLiteral(NodeId),
    /// Recovery placeholder for an absent identifier
    MissingIdentifier(NodeId),
}

/// A literal with its source token and converted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    /// The source token
    pub token: Token,
    /// The converted value
    pub value: LiteralValue,
}

/// The converted value of a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    /// Integer, with the numeric base it was written in
    Int {
        /// The value, underscores stripped
        value: i64,
        /// The base of the source spelling
        base: NumericBase,
    },
    /// Floating-point value
    Float(f64),
    /// Character value, escapes processed
    Char(char),
    /// String value, escapes processed
    String(String),
}

/// The numeric base a literal was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericBase {
    /// Plain decimal
    Decimal,
    /// `0x…`
    Hexadecimal,
    /// `0b…`
    Binary,
}

/// An identifier expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierExpr {
    /// The identifier token (carries the interned symbol)
    pub token: Token,
}

/// A call whose callee is an arbitrary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyCall {
    /// The called value
    pub value: Box<Expr>,
    /// The argument list
    pub arguments: ArgumentList,
    /// Called function, filled by the semantic phase
    pub reference: Option<FunctionRef>,
}

/// A parenthesized argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentList {
    /// The arguments, each an `Argument` or `MissingArgument` expression
    pub arguments: Vec<Expr>,
    /// Source location including the parentheses
    pub location: Location,
}

/// A heap allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    /// The instantiated type
    pub ty: TypeInstance,
    /// Constructor arguments; absent for bare (default) instantiation
    pub arguments: Option<ArgumentList>,
    /// Constructor, filled by the semantic phase
    pub reference: Option<FunctionRef>,
}

/// A binary operator application.
///
/// `right` is replaced while expression parsing re-associates the tree;
/// afterwards the node is as immutable as the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOperatorCall {
    /// The operator token
    pub operator: Token,
    /// Left operand
    pub left: Box<Expr>,
    /// Right operand
    pub right: Box<Expr>,
    /// Operator overload, filled by the semantic phase
    pub reference: Option<FunctionRef>,
}

/// A list literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListExpr {
    /// Element expressions
    pub elements: Vec<Expr>,
}

/// A lambda expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    /// Parameter list
    pub parameters: ParameterDefinitionCollection,
    /// The body: a block or a single expression
    pub body: LambdaBody,
}

/// The body of a lambda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    /// `(params) => { … }`
    Block(Block),
    /// `(params) => expr`
    Expr(Box<Expr>),
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// The kind of statement
    pub kind: StmtKind,
    /// Source location
    pub location: Location,
}

impl Stmt {
    /// Create a new statement.
    pub fn new(kind: StmtKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// Create a missing-statement placeholder.
    pub fn missing(location: Location) -> Self {
        Self::new(StmtKind::Missing(NodeId::fresh()), location)
    }

    /// Check whether this node is a recovery placeholder.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, StmtKind::Missing(_))
    }
}

/// The kind of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// A lone `;`
    Empty,
    /// `{ … }`
    Block(Block),
    /// `if (cond) stmt else stmt`
    If(IfStmt),
    /// `while (cond) stmt`
    While {
        /// Loop condition
        condition: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `for (init; cond; step) stmt`
    For(ForStmt),
    /// `return expr?;`
    Return {
        /// The returned value, when present
        value: Option<Expr>,
    },
    /// `break;`
    Break,
    /// `goto label;`
    Goto {
        /// The target label name
        label: Token,
    },
    /// `crash expr?;`
    Crash {
        /// The crash payload, when present
        value: Option<Expr>,
    },
    /// `delete expr;`
    Delete(DeleteStmt),
    /// `yield expr?;`
    Yield {
        /// The yielded value, when present
        value: Option<Expr>,
    },
    /// `name:` — an instruction label declaration
    Label {
        /// The label name
        name: Token,
    },
    /// A variable definition
    VariableDefinition(VariableDefinition),
    /// `target = value;`
    Assignment {
        /// Assignment target
        target: Expr,
        /// Assigned value
        value: Expr,
    },
    /// `target op= value;`
    CompoundAssignment {
        /// Assignment target
        target: Expr,
        /// The compound operator token (`+=`, …)
        operator: Token,
        /// Right-hand value
        value: Expr,
        /// Operator overload, filled by the semantic phase
        reference: Option<FunctionRef>,
    },
    /// `target++;` / `target--;`
    ShortOperatorCall {
        /// The operated-on target
        target: Expr,
        /// The `++` or `--` token
        operator: Token,
        /// Operator overload, filled by the semantic phase
        reference: Option<FunctionRef>,
    },
    /// An expression in statement position
    Expression(Expr),
    /// Recovery placeholder for an absent statement
    Missing(NodeId),
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The statements, in source order
    pub statements: Vec<Stmt>,
    /// Source location including the braces
    pub location: Location,
    /// Set when this block stands in for an absent one
    pub missing_id: Option<NodeId>,
}

impl Block {
    /// Create a block.
    pub fn new(statements: Vec<Stmt>, location: Location) -> Self {
        Self { statements, location, missing_id: None }
    }

    /// Create a missing-block placeholder.
    pub fn missing(location: Location) -> Self {
        Self { statements: Vec::new(), location, missing_id: Some(NodeId::fresh()) }
    }

    /// Check whether this block is a recovery placeholder.
    pub fn is_missing(&self) -> bool {
        self.missing_id.is_some()
    }
}

/// An `if` statement with optional `else`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    /// The condition
    pub condition: Expr,
    /// The then-branch
    pub then_branch: Box<Stmt>,
    /// The else-branch, when present
    pub else_branch: Option<Box<Stmt>>,
}

/// A `for` statement. Every component may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    /// The initializer statement
    pub initializer: Option<Box<Stmt>>,
    /// The loop condition
    pub condition: Option<Expr>,
    /// The step statement
    pub step: Option<Box<Stmt>>,
    /// The loop body
    pub body: Box<Stmt>,
}

/// A `delete` statement with the cleanup slots the semantic phase fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStmt {
    /// The deleted value
    pub value: Expr,
    /// The destructor invoked before deallocation
    pub destructor: Option<FunctionRef>,
    /// The deallocator releasing the storage
    pub deallocator: Option<FunctionRef>,
}

/// A variable definition. `ty` is `None` when written with `var`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// The declared type; `None` for `var`
    pub ty: Option<TypeInstance>,
    /// The variable name
    pub name: Token,
    /// The initializer, when present
    pub initializer: Option<Expr>,
    /// Filled by the external semantic phase
    pub resolved_type: Option<TypeRef>,
}

// ---------------------------------------------------------------------------
// Types in type position
// ---------------------------------------------------------------------------

/// A type expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInstance {
    /// The kind of type expression
    pub kind: TypeKind,
    /// Source location
    pub location: Location,
    /// Filled by the external semantic phase
    pub resolved_type: Option<TypeRef>,
}

impl TypeInstance {
    /// Create a new type instance.
    pub fn new(kind: TypeKind, location: Location) -> Self {
        Self { kind, location, resolved_type: None }
    }

    /// Create a missing-type placeholder.
    pub fn missing(location: Location) -> Self {
        Self::new(TypeKind::Missing(NodeId::fresh()), location)
    }

    /// Check whether this node is a recovery placeholder.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, TypeKind::Missing(_))
    }
}

/// The kind of a type expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    /// `Name` or `Name<T, U>`
    Simple {
        /// The type name
        name: Token,
        /// Generic arguments, possibly empty
        generics: Vec<TypeInstance>,
    },
    /// `T*`
    Pointer {
        /// The pointed-to type
        inner: Box<TypeInstance>,
    },
    /// `R(P1, P2)`, optionally with a leading `@closure` modifier
    Function {
        /// The return type
        ret: Box<TypeInstance>,
        /// Parameter types
        parameters: Vec<TypeInstance>,
        /// The closure-modifier word, when one was attached
        closure: Option<Token>,
    },
    /// `T[len]` / `T[]`
    StackArray {
        /// The element type
        element: Box<TypeInstance>,
        /// The length expression; absent for `T[]`
        length: Option<Box<Expr>>,
    },
    /// Recovery placeholder for an absent type
    Missing(NodeId),
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A `using` import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsingDefinition {
    /// What is imported
    pub target: UsingTarget,
    /// Source location
    pub location: Location,
}

/// The target of a `using`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UsingTarget {
    /// `using "relative/path.rill";`
    Path(Token),
    /// `using a.b.c;`
    Module(Vec<Token>),
}

/// An `alias Name = Type;` definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDefinition {
    /// The alias name
    pub name: Token,
    /// The aliased type
    pub target: TypeInstance,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// A struct definition with its members grouped by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDefinition {
    /// The struct name
    pub name: Token,
    /// Template parameters, when the struct is generic
    pub template: Option<TemplateInfo>,
    /// Field members
    pub fields: Vec<FieldDefinition>,
    /// Ordinary methods
    pub methods: Vec<FunctionDefinition>,
    /// Indexer-get/set and destructor members
    pub general_methods: Vec<GeneralFunctionDefinition>,
    /// Operator overloads
    pub operators: Vec<OperatorDefinition>,
    /// Constructors
    pub constructors: Vec<ConstructorDefinition>,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// Template parameters of a generic struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// The parameter name tokens
    pub parameters: Vec<Token>,
    /// Source location including the angle brackets
    pub location: Location,
}

/// A function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// The return type
    pub return_type: TypeInstance,
    /// The function name
    pub name: Token,
    /// The parameter list
    pub parameters: ParameterDefinitionCollection,
    /// The body
    pub body: Block,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// An operator-overload definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    /// The return type
    pub return_type: TypeInstance,
    /// Which operator is overloaded
    pub operator: OperatorName,
    /// The parameter list
    pub parameters: ParameterDefinitionCollection,
    /// The body
    pub body: Block,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// The overloaded operator of an [`OperatorDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperatorName {
    /// A symbolic operator like `+` or `<<`
    Symbolic(Token),
    /// The call operator, written `()`
    Call {
        /// The `(` token
        open: Token,
        /// The `)` token
        close: Token,
    },
}

impl OperatorName {
    /// The operator's textual spelling.
    pub fn text(&self) -> String {
        match self {
            OperatorName::Symbolic(token) => token.content.clone(),
            OperatorName::Call { .. } => "()".to_string(),
        }
    }
}

/// A struct member whose identity is not an ordinary identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralFunctionDefinition {
    /// Which member this is
    pub kind: GeneralFunctionKind,
    /// The return type; absent for the destructor
    pub return_type: Option<TypeInstance>,
    /// The parameter list
    pub parameters: ParameterDefinitionCollection,
    /// The body
    pub body: Block,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// The closed set of general-function identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneralFunctionKind {
    /// `[]` — indexer get
    IndexerGet,
    /// `[]=` — indexer set
    IndexerSet,
    /// `~` — destructor
    Destructor,
}

impl GeneralFunctionKind {
    /// The member's textual spelling.
    pub fn text(&self) -> &'static str {
        match self {
            GeneralFunctionKind::IndexerGet => "[]",
            GeneralFunctionKind::IndexerSet => "[]=",
            GeneralFunctionKind::Destructor => "~",
        }
    }
}

/// A constructor definition, written `new (params) { … }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDefinition {
    /// The parameter list
    pub parameters: ParameterDefinitionCollection,
    /// The body
    pub body: Block,
    /// Attributes preceding the definition
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
}

/// A field member of a struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// The field type
    pub ty: TypeInstance,
    /// The field name
    pub name: Token,
    /// Attributes preceding the field
    pub attributes: Vec<AttributeUsage>,
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// Source location
    pub location: Location,
    /// Filled by the external semantic phase
    pub resolved_type: Option<TypeRef>,
}

/// A single parameter of a function-like definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Modifier tokens
    pub modifiers: Vec<Token>,
    /// The parameter type
    pub ty: TypeInstance,
    /// The parameter name
    pub name: Token,
    /// The default value, when present
    pub default_value: Option<Expr>,
    /// Source location
    pub location: Location,
    /// Filled by the external semantic phase
    pub resolved_type: Option<TypeRef>,
}

impl ParameterDefinition {
    /// Check for a specific modifier by its spelling.
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m.content == name)
    }
}

/// A parsed parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinitionCollection {
    /// The parameters, in source order
    pub parameters: Vec<ParameterDefinition>,
    /// Source location including the parentheses
    pub location: Location,
}

impl ParameterDefinitionCollection {
    /// Create an empty collection.
    pub fn empty(location: Location) -> Self {
        Self { parameters: Vec::new(), location }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check whether the collection has no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// An attribute usage: `@name` or `@name(args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUsage {
    /// The attribute name
    pub name: Token,
    /// The attribute arguments, possibly empty
    pub arguments: Vec<Expr>,
    /// Source location
    pub location: Location,
}

// ---------------------------------------------------------------------------
// Parse result
// ---------------------------------------------------------------------------

/// Everything a parse of one source file produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserResult {
    /// Free functions
    pub functions: Vec<FunctionDefinition>,
    /// Free operator overloads
    pub operators: Vec<OperatorDefinition>,
    /// Struct definitions
    pub structs: Vec<StructDefinition>,
    /// `using` imports
    pub usings: Vec<UsingDefinition>,
    /// Alias definitions
    pub aliases: Vec<AliasDefinition>,
    /// Statements outside any definition
    pub top_level_statements: Vec<Stmt>,
    /// The tokenizer's output, before any parser split
    pub original_tokens: Vec<Token>,
    /// The trivia-filtered working list, after parser splits
    pub filtered_tokens: Vec<Token>,
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for TypeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Simple { name, generics } => {
                write!(f, "{}", name.content)?;
                if !generics.is_empty() {
                    write!(f, "<")?;
                    for (i, g) in generics.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", g)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeKind::Pointer { inner } => write!(f, "{}*", inner),
            TypeKind::Function { ret, parameters, closure } => {
                if let Some(closure) = closure {
                    write!(f, "@{} ", closure.content)?;
                }
                write!(f, "{}(", ret)?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")
            }
            TypeKind::StackArray { element, length } => match length {
                Some(length) => write!(f, "{}[{}]", element, length),
                None => write!(f, "{}[]", element),
            },
            TypeKind::Missing(_) => write!(f, "<missing type>"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(literal) => write!(f, "{}", literal.token.content),
            ExprKind::Identifier(ident) => write!(f, "{}", ident.token.content),
            ExprKind::FieldAccess { value, field } => write!(f, "{}.{}", value, field.content),
            ExprKind::IndexCall { value, index, .. } => write!(f, "{}[{}]", value, index),
            ExprKind::AnyCall(call) => {
                write!(f, "{}(", call.value)?;
                for (i, a) in call.arguments.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            ExprKind::NewInstance(new) => {
                write!(f, "new {}", new.ty)?;
                if let Some(arguments) = &new.arguments {
                    write!(f, "(")?;
                    for (i, a) in arguments.arguments.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            ExprKind::Binary(binary) => {
                write!(f, "{} {} {}", binary.left, binary.operator.content, binary.right)
            }
            ExprKind::Unary { operator, operand, .. } => {
                write!(f, "{}{}", operator.content, operand)
            }
            ExprKind::Argument { modifiers, value } => {
                for m in modifiers {
                    write!(f, "{} ", m.content)?;
                }
                write!(f, "{}", value)
            }
            ExprKind::List(list) => {
                write!(f, "[")?;
                for (i, e) in list.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            ExprKind::Lambda(lambda) => {
                write!(f, "(")?;
                for (i, p) in lambda.parameters.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", p.ty, p.name.content)?;
                }
                write!(f, ") => ")?;
                match &lambda.body {
                    LambdaBody::Block(_) => write!(f, "{{ ... }}"),
                    LambdaBody::Expr(expr) => write!(f, "{}", expr),
                }
            }
            ExprKind::GetReference { operand, .. } => write!(f, "&{}", operand),
            ExprKind::Dereference { operand } => write!(f, "*{}", operand),
            ExprKind::TypeCast { target, value } => write!(f, "({}){}", target, value),
            ExprKind::Reinterpret { value, target } => write!(f, "{} as {}", value, target),
            ExprKind::Grouped(inner) => write!(f, "({})", inner),
            ExprKind::Missing(_) => write!(f, "<missing expression>"),
            ExprKind::MissingArgument(_) => write!(f, "<missing argument>"),
            ExprKind::MissingLiteral(_) => write!(f, "<missing literal>"),
            ExprKind::MissingIdentifier(_) => write!(f, "<missing identifier>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::{Token, TokenKind};
    use crate::utils::location::{Location, SourceLocation, Span};

    fn loc() -> Location {
        Location::new(Span::at(SourceLocation::start()), "test.rill")
    }

    fn ident(name: &str) -> Expr {
        Expr::new(
            ExprKind::Identifier(IdentifierExpr {
                token: Token::identifier(name, Span::UNKNOWN),
            }),
            loc(),
        )
    }

    #[test]
    fn test_missing_nodes_compare_identity_only() {
        let a = Expr::missing(loc());
        let b = Expr::missing(loc());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.is_missing());

        let a = TypeInstance::missing(loc());
        let b = TypeInstance::missing(loc());
        assert_ne!(a, b);

        let a = Stmt::missing(loc());
        let b = Stmt::missing(loc());
        assert_ne!(a, b);

        let a = Block::missing(loc());
        assert!(a.is_missing());
        assert!(!Block::new(Vec::new(), loc()).is_missing());
    }

    #[test]
    fn test_expr_display() {
        let sum = Expr::new(
            ExprKind::Binary(BinaryOperatorCall {
                operator: Token::new(TokenKind::Operator, "+", Span::UNKNOWN),
                left: Box::new(ident("a")),
                right: Box::new(ident("b")),
                reference: None,
            }),
            loc(),
        );
        assert_eq!(sum.to_string(), "a + b");

        let deref = Expr::new(
            ExprKind::Dereference { operand: Box::new(ident("p")) },
            loc(),
        );
        assert_eq!(deref.to_string(), "*p");
    }

    #[test]
    fn test_type_display() {
        let int = TypeInstance::new(
            TypeKind::Simple { name: Token::identifier("int", Span::UNKNOWN), generics: vec![] },
            loc(),
        );
        let list = TypeInstance::new(
            TypeKind::Simple {
                name: Token::identifier("List", Span::UNKNOWN),
                generics: vec![int.clone()],
            },
            loc(),
        );
        assert_eq!(list.to_string(), "List<int>");

        let ptr = TypeInstance::new(TypeKind::Pointer { inner: Box::new(int.clone()) }, loc());
        assert_eq!(ptr.to_string(), "int*");

        let func = TypeInstance::new(
            TypeKind::Function {
                ret: Box::new(int.clone()),
                parameters: vec![int.clone()],
                closure: Some(Token::identifier("closure", Span::UNKNOWN)),
            },
            loc(),
        );
        assert_eq!(func.to_string(), "@closure int(int)");

        let arr = TypeInstance::new(
            TypeKind::StackArray { element: Box::new(int), length: None },
            loc(),
        );
        assert_eq!(arr.to_string(), "int[]");
    }

    #[test]
    fn test_operator_name_text() {
        let plus = OperatorName::Symbolic(Token::new(TokenKind::Operator, "+", Span::UNKNOWN));
        assert_eq!(plus.text(), "+");
        let call = OperatorName::Call {
            open: Token::new(TokenKind::Operator, "(", Span::UNKNOWN),
            close: Token::new(TokenKind::Operator, ")", Span::UNKNOWN),
        };
        assert_eq!(call.text(), "()");
    }

    #[test]
    fn test_general_function_kind_text() {
        assert_eq!(GeneralFunctionKind::IndexerGet.text(), "[]");
        assert_eq!(GeneralFunctionKind::IndexerSet.text(), "[]=");
        assert_eq!(GeneralFunctionKind::Destructor.text(), "~");
    }

    #[test]
    fn test_node_ids_are_fresh() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }
}
