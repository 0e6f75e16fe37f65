//! Symbol interning for identifier tokens and keyword probes.
//!
//! Identifier-shaped tokens carry an interned [`Symbol`], and the keyword
//! catalogs are pre-interned so the parser can test keyword membership by
//! symbol comparison instead of string comparison.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;
use string_interner::{backend::StringBackend, DefaultSymbol, StringInterner, Symbol as SymbolTrait};

/// Type alias for our interner backend
type Backend = StringBackend<DefaultSymbol>;

/// A symbol representing an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    pub(crate) fn from_raw(index: u32) -> Self {
        Symbol(index)
    }

    /// The raw index of this symbol in the interner.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Global symbol interner (thread-safe).
static GLOBAL_INTERNER: Lazy<RwLock<StringInterner<Backend>>> =
    Lazy::new(|| RwLock::new(StringInterner::new()));

/// Intern a string in the global interner.
pub fn intern(s: &str) -> Symbol {
    let mut interner = GLOBAL_INTERNER.write().unwrap();
    let sym = interner.get_or_intern(s);
    Symbol::from_raw(sym.to_usize() as u32)
}

/// Resolve a symbol from the global interner.
pub fn resolve(sym: Symbol) -> Option<String> {
    let interner = GLOBAL_INTERNER.read().unwrap();
    let internal_sym = DefaultSymbol::try_from_usize(sym.0 as usize)?;
    interner.resolve(internal_sym).map(|s| s.to_string())
}

/// Look up a string without interning it.
pub fn get(s: &str) -> Option<Symbol> {
    let interner = GLOBAL_INTERNER.read().unwrap();
    interner.get(s).map(|sym| Symbol::from_raw(sym.to_usize() as u32))
}

/// The keyword catalogs of the language, pre-interned.
pub mod keywords {
    use super::Symbol;
    use once_cell::sync::Lazy;
    use std::collections::HashSet;

    /// Keywords that open a declaration.
    pub const DECLARATION: &[&str] = &["using", "struct", "alias"];

    /// Keywords that open or appear inside statements and expressions.
    pub const STATEMENT: &[&str] = &[
        "if", "else", "while", "for", "return", "yield", "goto", "break", "crash", "delete",
        "new", "as", "var", "this", "sizeof",
    ];

    /// Modifier keywords on definitions and parameters.
    pub const MODIFIER: &[&str] = &["inline", "const", "ref", "temp", "this"];

    /// Protection-level keywords.
    pub const PROTECTION: &[&str] = &["export", "private"];

    /// The closed list of builtin type names.
    pub const BUILTIN_TYPES: &[&str] = &[
        "any", "void", "bool", "int", "float", "char", "byte", "string", "u8", "u16", "u32",
        "u64", "i8", "i16", "i32", "i64", "f32", "f64",
    ];

    fn intern_all(catalog: &[&str]) -> HashSet<Symbol> {
        catalog.iter().map(|kw| super::intern(kw)).collect()
    }

    /// Declaration keywords as symbols.
    pub static DECLARATION_SYMS: Lazy<HashSet<Symbol>> = Lazy::new(|| intern_all(DECLARATION));
    /// Statement keywords as symbols.
    pub static STATEMENT_SYMS: Lazy<HashSet<Symbol>> = Lazy::new(|| intern_all(STATEMENT));
    /// Modifier keywords as symbols.
    pub static MODIFIER_SYMS: Lazy<HashSet<Symbol>> = Lazy::new(|| intern_all(MODIFIER));
    /// Protection keywords as symbols.
    pub static PROTECTION_SYMS: Lazy<HashSet<Symbol>> = Lazy::new(|| intern_all(PROTECTION));
    /// Builtin type names as symbols.
    pub static BUILTIN_TYPE_SYMS: Lazy<HashSet<Symbol>> = Lazy::new(|| intern_all(BUILTIN_TYPES));

    /// Check whether a symbol names any keyword of any catalog.
    pub fn is_keyword(sym: Symbol) -> bool {
        DECLARATION_SYMS.contains(&sym)
            || STATEMENT_SYMS.contains(&sym)
            || MODIFIER_SYMS.contains(&sym)
            || PROTECTION_SYMS.contains(&sym)
            || BUILTIN_TYPE_SYMS.contains(&sym)
    }

    pub static USING: Lazy<Symbol> = Lazy::new(|| super::intern("using"));
    pub static STRUCT: Lazy<Symbol> = Lazy::new(|| super::intern("struct"));
    pub static ALIAS: Lazy<Symbol> = Lazy::new(|| super::intern("alias"));
    pub static IF: Lazy<Symbol> = Lazy::new(|| super::intern("if"));
    pub static ELSE: Lazy<Symbol> = Lazy::new(|| super::intern("else"));
    pub static WHILE: Lazy<Symbol> = Lazy::new(|| super::intern("while"));
    pub static FOR: Lazy<Symbol> = Lazy::new(|| super::intern("for"));
    pub static RETURN: Lazy<Symbol> = Lazy::new(|| super::intern("return"));
    pub static YIELD: Lazy<Symbol> = Lazy::new(|| super::intern("yield"));
    pub static GOTO: Lazy<Symbol> = Lazy::new(|| super::intern("goto"));
    pub static BREAK: Lazy<Symbol> = Lazy::new(|| super::intern("break"));
    pub static CRASH: Lazy<Symbol> = Lazy::new(|| super::intern("crash"));
    pub static DELETE: Lazy<Symbol> = Lazy::new(|| super::intern("delete"));
    pub static NEW: Lazy<Symbol> = Lazy::new(|| super::intern("new"));
    pub static AS: Lazy<Symbol> = Lazy::new(|| super::intern("as"));
    pub static VAR: Lazy<Symbol> = Lazy::new(|| super::intern("var"));
    pub static THIS: Lazy<Symbol> = Lazy::new(|| super::intern("this"));
    pub static SIZEOF: Lazy<Symbol> = Lazy::new(|| super::intern("sizeof"));
}
