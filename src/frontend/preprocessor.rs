//! The conditional-inclusion state machine embedded in the tokenizer.
//!
//! Directives (`#if`, `#elseif`, `#else`, `#endif`, `#define`, `#undefine`)
//! drive a stack of condition frames; every token scanned afterwards
//! consults [`Preprocessor::is_skipping`] and is re-typed
//! `PreprocessSkipped` while any enclosing condition is false.

use crate::utils::diagnostics::{Diagnostic, DiagnosticsCollection};
use crate::utils::location::Location;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Inside the `#if` / `#elseif` arms
    If,
    /// Inside the final `#else` arm
    Else,
}

#[derive(Debug)]
struct ConditionFrame {
    phase: Phase,
    /// One entry per arm seen so far; the last entry is the active arm's
    /// condition value.
    prior_conditions: Vec<bool>,
}

impl ConditionFrame {
    fn none_prior_true(&self) -> bool {
        !self.prior_conditions.iter().any(|c| *c)
    }

    fn active(&self) -> bool {
        *self.prior_conditions.last().unwrap_or(&true)
    }
}

/// The preprocessor state: the condition-frame stack plus the set of
/// currently defined variables.
#[derive(Debug)]
pub struct Preprocessor {
    frames: Vec<ConditionFrame>,
    defined: HashSet<String>,
}

impl Preprocessor {
    /// Create a preprocessor with the given initially-defined variables.
    pub fn new(initial_defines: &HashSet<String>) -> Self {
        Self { frames: Vec::new(), defined: initial_defines.clone() }
    }

    /// True while the active arm of any frame is false.
    pub fn is_skipping(&self) -> bool {
        self.frames.iter().any(|f| !f.active())
    }

    /// Like [`is_skipping`](Self::is_skipping), but ignoring the innermost
    /// frame. This is the skip state that applies to the directive tokens
    /// delimiting the innermost region itself.
    pub fn is_skipping_enclosing(&self) -> bool {
        let outer = self.frames.len().saturating_sub(1);
        self.frames[..outer].iter().any(|f| !f.active())
    }

    /// Check whether a variable is currently defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Apply a directive. `name` is the tag without the leading `#`;
    /// `argument` is the single-token argument when one was present.
    pub fn directive(
        &mut self,
        name: &str,
        argument: Option<&str>,
        location: Location,
        diagnostics: &mut DiagnosticsCollection,
    ) {
        match name {
            "if" => match argument {
                Some(var) => {
                    let condition = self.defined.contains(var);
                    self.frames.push(ConditionFrame {
                        phase: Phase::If,
                        prior_conditions: vec![condition],
                    });
                }
                None => diagnostics.add(
                    Diagnostic::error("Missing argument for #if").with_location(location),
                ),
            },
            "elseif" => {
                let Some(frame) = self.frames.last_mut() else {
                    diagnostics
                        .add(Diagnostic::error("#elseif without #if").with_location(location));
                    return;
                };
                if frame.phase == Phase::Else {
                    diagnostics
                        .add(Diagnostic::error("#elseif after #else").with_location(location));
                    return;
                }
                match argument {
                    Some(var) => {
                        let condition = frame.none_prior_true() && self.defined.contains(var);
                        frame.prior_conditions.push(condition);
                    }
                    None => diagnostics.add(
                        Diagnostic::error("Missing argument for #elseif").with_location(location),
                    ),
                }
            }
            "else" => {
                let Some(frame) = self.frames.last_mut() else {
                    diagnostics.add(Diagnostic::error("#else without #if").with_location(location));
                    return;
                };
                if frame.phase == Phase::Else {
                    diagnostics.add(Diagnostic::error("#else after #else").with_location(location));
                    return;
                }
                let condition = frame.none_prior_true();
                frame.prior_conditions.push(condition);
                frame.phase = Phase::Else;
            }
            "endif" => {
                if self.frames.pop().is_none() {
                    diagnostics
                        .add(Diagnostic::error("#endif without #if").with_location(location));
                }
            }
            "define" => match argument {
                Some(var) => {
                    if !self.is_skipping() {
                        self.defined.insert(var.to_string());
                    }
                }
                None => diagnostics.add(
                    Diagnostic::error("Missing argument for #define").with_location(location),
                ),
            },
            "undefine" => match argument {
                Some(var) => {
                    if !self.is_skipping() {
                        self.defined.remove(var);
                    }
                }
                None => diagnostics.add(
                    Diagnostic::error("Missing argument for #undefine").with_location(location),
                ),
            },
            other => diagnostics.add(
                Diagnostic::error(format!("Unknown preprocessor tag '#{}'", other))
                    .with_location(location),
            ),
        }
    }

    /// Report an unclosed `#if` at end of input.
    pub fn finish(&self, location: Location, diagnostics: &mut DiagnosticsCollection) {
        if !self.frames.is_empty() {
            diagnostics.add(
                Diagnostic::warning("Unclosed #if directive at end of file")
                    .with_location(location),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::location::Location;

    fn run(directives: &[(&str, Option<&str>)], defines: &[&str]) -> (Preprocessor, DiagnosticsCollection) {
        let initial: HashSet<String> = defines.iter().map(|s| s.to_string()).collect();
        let mut pre = Preprocessor::new(&initial);
        let mut diagnostics = DiagnosticsCollection::new();
        for (name, arg) in directives {
            pre.directive(name, *arg, Location::unknown(), &mut diagnostics);
        }
        (pre, diagnostics)
    }

    #[test]
    fn test_if_defined() {
        let (pre, diagnostics) = run(&[("if", Some("FEATURE"))], &["FEATURE"]);
        assert!(!pre.is_skipping());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_if_undefined_skips() {
        let (pre, _) = run(&[("if", Some("FEATURE"))], &[]);
        assert!(pre.is_skipping());
    }

    #[test]
    fn test_else_flips() {
        let (pre, _) = run(&[("if", Some("FEATURE")), ("else", None)], &[]);
        assert!(!pre.is_skipping());
        let (pre, _) = run(&[("if", Some("FEATURE")), ("else", None)], &["FEATURE"]);
        assert!(pre.is_skipping());
    }

    #[test]
    fn test_elseif_chain() {
        // #if A #elseif B #else — with only B defined the middle arm is live
        let steps: &[(&str, Option<&str>)] =
            &[("if", Some("A")), ("elseif", Some("B"))];
        let (pre, diagnostics) = run(steps, &["B"]);
        assert!(!pre.is_skipping());
        assert!(diagnostics.is_empty());

        // with A defined, the elseif arm is dead even though B is defined
        let (pre, _) = run(steps, &["A", "B"]);
        assert!(pre.is_skipping());
    }

    #[test]
    fn test_nested_skip_dominates() {
        // outer false, inner true: still skipping
        let (pre, _) = run(&[("if", Some("OUTER")), ("if", Some("INNER"))], &["INNER"]);
        assert!(pre.is_skipping());
        assert!(pre.is_skipping_enclosing());
    }

    #[test]
    fn test_define_gated_by_skip() {
        let (pre, _) = run(
            &[("if", Some("MISSING")), ("define", Some("X")), ("endif", None)],
            &[],
        );
        assert!(!pre.is_defined("X"));
        let (pre, _) = run(&[("define", Some("X"))], &[]);
        assert!(pre.is_defined("X"));
    }

    #[test]
    fn test_undefine() {
        let (pre, _) = run(&[("undefine", Some("A"))], &["A"]);
        assert!(!pre.is_defined("A"));
    }

    #[test]
    fn test_unbalanced_directives_error() {
        let (_, diagnostics) = run(&[("endif", None)], &[]);
        assert!(diagnostics.has_errors());
        let (_, diagnostics) = run(&[("else", None)], &[]);
        assert!(diagnostics.has_errors());
        let (_, diagnostics) = run(&[("if", Some("A")), ("else", None), ("else", None)], &[]);
        assert!(diagnostics.has_errors());
        let (_, diagnostics) =
            run(&[("if", Some("A")), ("else", None), ("elseif", Some("B"))], &[]);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_unknown_tag() {
        let (_, diagnostics) = run(&[("pragma", Some("x"))], &[]);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_missing_argument() {
        let (_, diagnostics) = run(&[("if", None)], &[]);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_unclosed_warns() {
        let (pre, mut diagnostics) = run(&[("if", Some("A"))], &[]);
        pre.finish(Location::unknown(), &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_errors());
    }
}
