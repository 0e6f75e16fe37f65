//! Positioned diagnostics and the collections that gather them.
//!
//! Every stage of the front-end reports through a [`DiagnosticsCollection`]:
//! the tokenizer and parser append as they go, parsing attempts that may be
//! rolled back write into a scoped override, and competing failed parse
//! alternatives are ranked through [`OrderedDiagnosticCollection`] so only
//! the best-matching explanations survive.

use crate::source::{LoadOutcome, SourceProvider, SourceProviderSet};
use crate::utils::errors::FrontendError;
use crate::utils::location::{Location, SourceMap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// The input (or the compiler) is wrong; compilation cannot succeed
    Error,
    /// Legal but suspect input
    Warning,
    /// Informational message
    Information,
    /// Advisory hint
    Hint,
    /// A later pass applied an optimization
    OptimizationNotice,
    /// A later pass tried and failed to apply an optimization
    FailedOptimization,
}

impl Level {
    /// Get a human-readable name for this level.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Information => "INFO",
            Level::Hint => "HINT",
            Level::OptimizationNotice => "OPTIMIZED",
            Level::FailedOptimization => "NOT-OPTIMIZED",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A level-tagged message, optionally positioned, with nested sub-diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Message text
    pub message: String,
    /// Position and file, when the diagnostic points at source
    pub location: Option<Location>,
    /// Nested sub-diagnostics
    pub sub: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a new diagnostic with the given level.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), location: None, sub: Vec::new() }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Create a new informational diagnostic.
    pub fn information(message: impl Into<String>) -> Self {
        Self::new(Level::Information, message)
    }

    /// Create a new hint diagnostic.
    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(Level::Hint, message)
    }

    /// Create an error marked as internal to the compiler.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            Level::Error,
            format!("{} (this is an internal error)", message.into()),
        )
    }

    /// Attach a location to the diagnostic.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a sub-diagnostic.
    pub fn with_sub(mut self, sub: Diagnostic) -> Self {
        self.sub.push(sub);
        self
    }

    /// Check whether this diagnostic points at source.
    pub fn is_positioned(&self) -> bool {
        self.location.is_some()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} ({}): {}", self.level, loc, self.message),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// Opaque handle for a pushed override scope.
///
/// Must be handed back to exactly one of [`DiagnosticsCollection::commit_override`]
/// or [`DiagnosticsCollection::drop_override`], innermost first.
#[derive(Debug)]
#[must_use = "an override scope must be committed or dropped"]
pub struct OverrideScope(usize);

#[derive(Debug, Default)]
struct ScopeFrame {
    positioned: Vec<Diagnostic>,
    contextless: Vec<Diagnostic>,
}

/// An ordered, de-duplicating collection of diagnostics.
///
/// Positioned and context-less diagnostics are kept apart; context-less
/// ones print first. A parsing attempt that may be rolled back writes into
/// a scoped override which, on commit, flushes into its parent and is
/// otherwise discarded.
#[derive(Debug, Default)]
pub struct DiagnosticsCollection {
    positioned: Vec<Diagnostic>,
    contextless: Vec<Diagnostic>,
    scopes: Vec<ScopeFrame>,
}

fn push_dedup(list: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    if !list.contains(&diagnostic) {
        list.push(diagnostic);
    }
}

impl DiagnosticsCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic, silently dropping exact duplicates.
    ///
    /// While an override scope is active the diagnostic lands in that scope.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        let (positioned, contextless) = match self.scopes.last_mut() {
            Some(scope) => (&mut scope.positioned, &mut scope.contextless),
            None => (&mut self.positioned, &mut self.contextless),
        };
        if diagnostic.is_positioned() {
            push_dedup(positioned, diagnostic);
        } else {
            push_dedup(contextless, diagnostic);
        }
    }

    /// Start an override scope. Diagnostics added until the matching
    /// commit/drop are held apart from the parent.
    pub fn push_override(&mut self) -> OverrideScope {
        self.scopes.push(ScopeFrame::default());
        OverrideScope(self.scopes.len())
    }

    fn pop_scope(&mut self, scope: OverrideScope) -> ScopeFrame {
        assert_eq!(
            scope.0,
            self.scopes.len(),
            "override scope popped out of order"
        );
        self.scopes.pop().expect("override scope stack is empty")
    }

    /// Flush an override scope into its parent.
    pub fn commit_override(&mut self, scope: OverrideScope) {
        let frame = self.pop_scope(scope);
        for diagnostic in frame.contextless {
            self.add(diagnostic);
        }
        for diagnostic in frame.positioned {
            self.add(diagnostic);
        }
    }

    /// Discard an override scope and everything added inside it.
    pub fn drop_override(&mut self, scope: OverrideScope) {
        let _ = self.pop_scope(scope);
    }

    /// Discard an override scope, handing back what it held. Used by the
    /// parser to move a failed alternative's diagnostics into an
    /// [`OrderedDiagnosticCollection`].
    pub fn take_override(&mut self, scope: OverrideScope) -> Vec<Diagnostic> {
        let frame = self.pop_scope(scope);
        let mut taken = frame.contextless;
        taken.extend(frame.positioned);
        taken
    }

    /// Check whether any error-level diagnostic has been collected,
    /// including ones still held in active override scopes.
    pub fn has_errors(&self) -> bool {
        self.iter_all().any(|d| d.level == Level::Error)
    }

    /// Number of diagnostics visible at the top level (committed only).
    pub fn len(&self) -> usize {
        self.contextless.len() + self.positioned.len()
    }

    /// Check whether the committed collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate committed diagnostics, context-less first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.contextless.iter().chain(self.positioned.iter())
    }

    fn iter_all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().chain(
            self.scopes
                .iter()
                .flat_map(|s| s.contextless.iter().chain(s.positioned.iter())),
        )
    }

    /// Raise the first error-level diagnostic, if any.
    pub fn throw(&self) -> Result<(), FrontendError> {
        match self.iter_all().find(|d| d.level == Level::Error) {
            Some(d) => Err(FrontendError::Diagnostic(d.clone())),
            None => Ok(()),
        }
    }

    /// Write every committed diagnostic to `out`, rendering an annotated
    /// source snippet for positioned ones when a provider resolves the file.
    pub fn write_to<W: fmt::Write>(
        &self,
        out: &mut W,
        sources: Option<&SourceProviderSet>,
    ) -> fmt::Result {
        for diagnostic in self.iter() {
            write_one(out, diagnostic, sources, 0)?;
        }
        Ok(())
    }

    /// Write only the error-level diagnostics to `out`, without snippets.
    pub fn write_errors_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for diagnostic in self.iter().filter(|d| d.level == Level::Error) {
            writeln!(out, "{}", diagnostic)?;
        }
        Ok(())
    }

    /// Print every committed diagnostic to stdout.
    pub fn print(&self, sources: Option<&SourceProviderSet>) {
        let mut rendered = String::new();
        let _ = self.write_to(&mut rendered, sources);
        print!("{}", rendered);
    }
}

fn write_one<W: fmt::Write>(
    out: &mut W,
    diagnostic: &Diagnostic,
    sources: Option<&SourceProviderSet>,
    depth: usize,
) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(out, "{}{}", indent, diagnostic)?;
    if let (Some(location), Some(sources)) = (&diagnostic.location, sources) {
        if !location.span.is_unknown() {
            if let LoadOutcome::Loaded { source, .. } = sources.try_load(&location.file, None) {
                write_snippet(out, &source, location, &indent)?;
            }
        }
    }
    for sub in &diagnostic.sub {
        write_one(out, sub, sources, depth + 1)?;
    }
    Ok(())
}

fn write_snippet<W: fmt::Write>(
    out: &mut W,
    source: &str,
    location: &Location,
    indent: &str,
) -> fmt::Result {
    let map = SourceMap::new(source.to_string());
    let span = location.span;
    let Some(line) = map.line(span.start_line) else {
        return Ok(());
    };
    writeln!(out, "{}  | {}", indent, line)?;
    let caret_count = if span.start_line == span.end_line {
        (span.end_column.saturating_sub(span.start_column)).max(1)
    } else {
        1
    };
    writeln!(
        out,
        "{}  | {}{}",
        indent,
        " ".repeat(span.start_column.saturating_sub(1)),
        "^".repeat(caret_count)
    )
}

/// A diagnostic tagged with how promising the parse attempt that produced
/// it was.
///
/// The parser uses "how many tokens the alternative consumed before
/// failing" as the importance, so the alternatives that got furthest win.
#[derive(Debug, Clone)]
pub struct OrderedDiagnostic {
    /// How far the failed alternative advanced
    pub importance: usize,
    /// The failure description
    pub diagnostic: Diagnostic,
    /// Candidates nested under this one
    pub sub: Vec<OrderedDiagnostic>,
}

impl OrderedDiagnostic {
    /// Create an ordered diagnostic without nested candidates.
    pub fn new(importance: usize, diagnostic: Diagnostic) -> Self {
        Self { importance, diagnostic, sub: Vec::new() }
    }

    fn compile(self) -> Diagnostic {
        let mut diagnostic = self.diagnostic;
        let mut collection = OrderedDiagnosticCollection::new();
        for sub in self.sub {
            collection.add_ordered(sub);
        }
        diagnostic.sub.extend(collection.compile());
        diagnostic
    }
}

/// Collects the failure candidates of competing parse alternatives and, at
/// [`compile`](OrderedDiagnosticCollection::compile), keeps only the ones
/// tied for the maximum importance.
#[derive(Debug, Default)]
pub struct OrderedDiagnosticCollection {
    entries: Vec<OrderedDiagnostic>,
}

impl OrderedDiagnosticCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure candidate.
    pub fn add(&mut self, importance: usize, diagnostic: Diagnostic) {
        self.entries.push(OrderedDiagnostic::new(importance, diagnostic));
    }

    /// Record a failure candidate with nested candidates of its own.
    pub fn add_ordered(&mut self, entry: OrderedDiagnostic) {
        self.entries.push(entry);
    }

    /// Check whether any candidate was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The maximum importance recorded so far.
    pub fn max_importance(&self) -> Option<usize> {
        self.entries.iter().map(|e| e.importance).max()
    }

    /// Keep only the candidates tied for the maximum importance, in
    /// insertion order.
    pub fn compile(self) -> Vec<Diagnostic> {
        let Some(max) = self.entries.iter().map(|e| e.importance).max() else {
            return Vec::new();
        };
        self.entries
            .into_iter()
            .filter(|e| e.importance == max)
            .map(OrderedDiagnostic::compile)
            .collect()
    }

    /// Compile and append the surviving candidates to a collection.
    pub fn commit_into(self, diagnostics: &mut DiagnosticsCollection) {
        for diagnostic in self.compile() {
            diagnostics.add(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::location::{SourceLocation, Span};

    fn at(line: usize, column: usize, offset: usize) -> Location {
        Location::new(Span::at(SourceLocation::new(line, column, offset)), "test.rill")
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut collection = DiagnosticsCollection::new();
        let d = Diagnostic::error("boom").with_location(at(1, 1, 0));
        collection.add(d.clone());
        collection.add(d);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_positioned_sorted_after_contextless() {
        let mut collection = DiagnosticsCollection::new();
        collection.add(Diagnostic::error("positioned").with_location(at(1, 1, 0)));
        collection.add(Diagnostic::warning("contextless"));
        let messages: Vec<_> = collection.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["contextless", "positioned"]);
    }

    #[test]
    fn test_override_commit() {
        let mut collection = DiagnosticsCollection::new();
        let scope = collection.push_override();
        collection.add(Diagnostic::error("inner"));
        assert_eq!(collection.len(), 0);
        assert!(collection.has_errors());
        collection.commit_override(scope);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_override_drop() {
        let mut collection = DiagnosticsCollection::new();
        let scope = collection.push_override();
        collection.add(Diagnostic::error("inner"));
        collection.drop_override(scope);
        assert!(collection.is_empty());
        assert!(!collection.has_errors());
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn test_override_mismatch_panics() {
        let mut collection = DiagnosticsCollection::new();
        let outer = collection.push_override();
        let _inner = collection.push_override();
        collection.commit_override(outer);
    }

    #[test]
    fn test_throw_raises_first_error() {
        let mut collection = DiagnosticsCollection::new();
        collection.add(Diagnostic::warning("meh"));
        assert!(collection.throw().is_ok());
        collection.add(Diagnostic::error("first"));
        collection.add(Diagnostic::error("second"));
        let err = collection.throw().unwrap_err();
        assert!(format!("{}", err).contains("first"));
    }

    #[test]
    fn test_ordered_compile_keeps_max_only() {
        let mut collection = OrderedDiagnosticCollection::new();
        collection.add(1, Diagnostic::error("shallow"));
        collection.add(7, Diagnostic::error("deep a"));
        collection.add(7, Diagnostic::error("deep b"));
        collection.add(3, Diagnostic::error("middle"));
        let compiled = collection.compile();
        let messages: Vec<_> = compiled.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["deep a", "deep b"]);
    }

    #[test]
    fn test_ordered_compile_nested() {
        let mut inner = OrderedDiagnosticCollection::new();
        inner.add(2, Diagnostic::error("nested low"));
        inner.add(5, Diagnostic::error("nested high"));
        let mut entry = OrderedDiagnostic::new(9, Diagnostic::error("outer"));
        entry.sub = inner.entries;

        let mut collection = OrderedDiagnosticCollection::new();
        collection.add_ordered(entry);
        let compiled = collection.compile();
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].sub.len(), 1);
        assert_eq!(compiled[0].sub[0].message, "nested high");
    }

    #[test]
    fn test_display_format() {
        let d = Diagnostic::error("Expected a statement").with_location(at(3, 9, 40));
        assert_eq!(format!("{}", d), "ERROR (test.rill:3:9): Expected a statement");
        let d = Diagnostic::warning("empty statement");
        assert_eq!(format!("{}", d), "WARNING: empty statement");
    }
}
