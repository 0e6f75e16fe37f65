//! Source-file ingestion: the contract through which `using` imports are
//! resolved to source text.
//!
//! The front-end never reads files on its own; the embedder registers one
//! or more providers and resolution tries each in order. Providers come in
//! a synchronous and an asynchronous flavor; the asynchronous one accepts a
//! cancellation token that cancels only the I/O, never a parse.

use crate::utils::diagnostics::Diagnostic;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The outcome of a source-load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The provider resolved the request.
    Loaded {
        /// The source text
        source: String,
        /// The canonical URI of the loaded file
        uri: String,
    },
    /// The provider does not know the requested file; the next provider
    /// in the set is asked.
    NotExists,
    /// The provider knows the file but failed to load it; resolution stops.
    Error(Diagnostic),
}

/// A synchronous source provider.
pub trait SourceProvider {
    /// Try to resolve `requested` (as written in a `using`) to source text.
    /// `current` is the URI of the file containing the import, when known.
    fn try_load(&self, requested: &str, current: Option<&str>) -> LoadOutcome;
}

/// A token the embedder can trip to abandon in-flight loads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An asynchronous source provider.
///
/// Object-safe by returning a boxed future, so provider sets can hold
/// trait objects without committing the crate to an async runtime.
pub trait AsyncSourceProvider {
    /// Asynchronous counterpart of [`SourceProvider::try_load`].
    fn try_load<'a>(
        &'a self,
        requested: &'a str,
        current: Option<&'a str>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = LoadOutcome> + Send + 'a>>;
}

impl<T: SourceProvider + Sync> AsyncSourceProvider for T {
    fn try_load<'a>(
        &'a self,
        requested: &'a str,
        current: Option<&'a str>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = LoadOutcome> + Send + 'a>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return LoadOutcome::NotExists;
            }
            SourceProvider::try_load(self, requested, current)
        })
    }
}

/// An ordered set of providers; resolution asks each in turn.
#[derive(Default)]
pub struct SourceProviderSet {
    providers: Vec<Box<dyn SourceProvider>>,
}

impl SourceProviderSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Earlier providers win.
    pub fn register(&mut self, provider: Box<dyn SourceProvider>) {
        self.providers.push(provider);
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for SourceProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceProviderSet")
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl SourceProvider for SourceProviderSet {
    fn try_load(&self, requested: &str, current: Option<&str>) -> LoadOutcome {
        for provider in &self.providers {
            match provider.try_load(requested, current) {
                LoadOutcome::NotExists => continue,
                outcome => return outcome,
            }
        }
        LoadOutcome::NotExists
    }
}

/// A provider backed by an in-memory map, mainly for tests and for
/// diagnostics rendering of already-loaded buffers.
#[derive(Debug, Default)]
pub struct MemorySourceProvider {
    files: HashMap<String, String>,
}

impl MemorySourceProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, uri: impl Into<String>, source: impl Into<String>) {
        self.files.insert(uri.into(), source.into());
    }
}

impl SourceProvider for MemorySourceProvider {
    fn try_load(&self, requested: &str, _current: Option<&str>) -> LoadOutcome {
        match self.files.get(requested) {
            Some(source) => LoadOutcome::Loaded {
                source: source.clone(),
                uri: requested.to_string(),
            },
            None => LoadOutcome::NotExists,
        }
    }
}

/// A provider that resolves requests against the file system, relative to
/// the importing file's directory first and a configured root second.
#[derive(Debug)]
pub struct FileSourceProvider {
    root: PathBuf,
}

impl FileSourceProvider {
    /// Create a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn candidates(&self, requested: &str, current: Option<&str>) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(current) = current {
            if let Some(dir) = Path::new(current).parent() {
                out.push(dir.join(requested));
            }
        }
        out.push(self.root.join(requested));
        out
    }
}

impl SourceProvider for FileSourceProvider {
    fn try_load(&self, requested: &str, current: Option<&str>) -> LoadOutcome {
        for candidate in self.candidates(requested, current) {
            match std::fs::read_to_string(&candidate) {
                Ok(source) => {
                    return LoadOutcome::Loaded {
                        source,
                        uri: candidate.to_string_lossy().into_owned(),
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return LoadOutcome::Error(Diagnostic::error(format!(
                        "Failed to read '{}': {}",
                        candidate.display(),
                        e
                    )))
                }
            }
        }
        LoadOutcome::NotExists
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider() {
        let mut provider = MemorySourceProvider::new();
        provider.insert("a.rill", "int x;");
        assert!(matches!(
            SourceProvider::try_load(&provider, "a.rill", None),
            LoadOutcome::Loaded { .. }
        ));
        assert_eq!(
            SourceProvider::try_load(&provider, "b.rill", None),
            LoadOutcome::NotExists
        );
    }

    #[test]
    fn test_set_tries_in_order() {
        let mut first = MemorySourceProvider::new();
        first.insert("shared.rill", "from first");
        let mut second = MemorySourceProvider::new();
        second.insert("shared.rill", "from second");
        second.insert("only_second.rill", "int y;");

        let mut set = SourceProviderSet::new();
        set.register(Box::new(first));
        set.register(Box::new(second));

        match set.try_load("shared.rill", None) {
            LoadOutcome::Loaded { source, .. } => assert_eq!(source, "from first"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            set.try_load("only_second.rill", None),
            LoadOutcome::Loaded { .. }
        ));
        assert_eq!(set.try_load("missing.rill", None), LoadOutcome::NotExists);
    }

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
