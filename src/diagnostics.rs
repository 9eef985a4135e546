//! Diagnostics: recoverable data-quality reporting.
//!
//! Nothing in this crate fails on malformed documents. Every condition a
//! real file can trigger is a [`ResolveWarning`] handed to a caller
//! supplied [`WarningSink`], and processing continues.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::base::Guid;

// ============================================================================
// WARNINGS
// ============================================================================

/// A recoverable condition found while building or resolving a document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveWarning {
    /// An override entry has an empty `guid_path`; it was skipped.
    #[error("malformed override on instance {instance}: empty guid path")]
    MalformedOverride { instance: Guid },

    /// An instance's target symbol is neither in the document nor the cache.
    #[error("instance {instance} targets unknown symbol {}", display_target(.symbol))]
    UnresolvedSymbol {
        instance: Guid,
        /// `None` when the instance names no symbol at all.
        symbol: Option<Guid>,
    },

    /// Resolution would revisit a symbol already on the current path.
    #[error("instance {instance} re-enters symbol {symbol}; branch left unresolved")]
    CyclicInstanceGraph { instance: Guid, symbol: Guid },

    /// Nested resolution hit the configured depth bound.
    #[error("instance {instance} exceeds max depth {max_depth}; branch left unresolved")]
    DepthLimit { instance: Guid, max_depth: usize },

    /// Two records share an identifier; the later one was dropped.
    #[error("duplicate node {node}; later record dropped")]
    DuplicateNode { node: Guid },

    /// A record names a parent that does not exist; it became a root.
    #[error("node {node} has unknown parent {parent}; promoted to root")]
    OrphanNode { node: Guid, parent: Guid },
}

impl ResolveWarning {
    /// The stable diagnostic code for this warning.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveWarning::MalformedOverride { .. } => codes::MALFORMED_OVERRIDE,
            ResolveWarning::UnresolvedSymbol { .. } => codes::UNRESOLVED_SYMBOL,
            ResolveWarning::CyclicInstanceGraph { .. } | ResolveWarning::DepthLimit { .. } => {
                codes::CYCLIC_INSTANCE_GRAPH
            }
            ResolveWarning::DuplicateNode { .. } => codes::DUPLICATE_NODE,
            ResolveWarning::OrphanNode { .. } => codes::ORPHAN_NODE,
        }
    }

    /// Hitting the configured depth bound is expected for deep documents
    /// and only informational; everything else points at bad data.
    pub fn severity(&self) -> Severity {
        match self {
            ResolveWarning::DepthLimit { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// The node the warning is about.
    pub fn node(&self) -> Guid {
        match *self {
            ResolveWarning::MalformedOverride { instance }
            | ResolveWarning::UnresolvedSymbol { instance, .. }
            | ResolveWarning::CyclicInstanceGraph { instance, .. }
            | ResolveWarning::DepthLimit { instance, .. } => instance,
            ResolveWarning::DuplicateNode { node } | ResolveWarning::OrphanNode { node, .. } => {
                node
            }
        }
    }
}

fn display_target(symbol: &Option<Guid>) -> String {
    symbol.map_or_else(|| "<none>".to_string(), |guid| guid.to_string())
}

/// Standard diagnostic codes.
pub mod codes {
    /// Override entry with an empty path.
    pub const MALFORMED_OVERRIDE: &str = "W0001";
    /// Instance target symbol not found.
    pub const UNRESOLVED_SYMBOL: &str = "W0002";
    /// Nested instance cycle or depth exhaustion.
    pub const CYCLIC_INSTANCE_GRAPH: &str = "W0003";
    /// Duplicate node identifier.
    pub const DUPLICATE_NODE: &str = "W0004";
    /// Node with an unknown parent.
    pub const ORPHAN_NODE: &str = "W0005";
}

// ============================================================================
// SINKS
// ============================================================================

/// Receives warnings as they are found.
pub trait WarningSink {
    fn warn(&mut self, warning: ResolveWarning);
}

impl WarningSink for Vec<ResolveWarning> {
    fn warn(&mut self, warning: ResolveWarning) {
        self.push(warning);
    }
}

impl<S: WarningSink + ?Sized> WarningSink for &mut S {
    fn warn(&mut self, warning: ResolveWarning) {
        (**self).warn(warning);
    }
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Info,
}

/// A recorded diagnostic.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Diagnostic code (e.g., "W0002").
    pub code: &'static str,
    pub message: Arc<str>,
    /// The node the diagnostic is attached to.
    pub node: Guid,
    pub warning: ResolveWarning,
}

impl From<ResolveWarning> for Diagnostic {
    fn from(warning: ResolveWarning) -> Self {
        Self {
            severity: warning.severity(),
            code: warning.code(),
            message: Arc::from(warning.to_string()),
            node: warning.node(),
            warning,
        }
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a single-threaded pass.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get diagnostics attached to a specific node.
    pub fn diagnostics_for_node(&self, node: Guid) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.node == node).collect()
    }

    /// Get diagnostics with a given code.
    pub fn with_code(&self, code: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Move all diagnostics from another collector into this one.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

impl WarningSink for DiagnosticCollector {
    fn warn(&mut self, warning: ResolveWarning) {
        match warning.severity() {
            Severity::Warning => {
                tracing::warn!(code = warning.code(), node = %warning.node(), "{warning}")
            }
            Severity::Info => {
                tracing::info!(code = warning.code(), node = %warning.node(), "{warning}")
            }
        }
        self.add(Diagnostic::from(warning));
    }
}

/// A collector that can be shared across worker threads.
///
/// `&SharedDiagnostics` is itself a sink, so parallel tasks can each hold
/// a copy of the reference.
#[derive(Debug, Default)]
pub struct SharedDiagnostics {
    inner: Mutex<DiagnosticCollector>,
}

impl SharedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the shared collector.
    pub fn into_inner(self) -> DiagnosticCollector {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for &SharedDiagnostics {
    fn warn(&mut self, warning: ResolveWarning) {
        self.inner.lock().warn(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(session: u32, local: u32) -> Guid {
        Guid::new(session, local)
    }

    #[test]
    fn test_warning_codes() {
        let w = ResolveWarning::UnresolvedSymbol {
            instance: g(1, 1),
            symbol: Some(g(2, 2)),
        };
        assert_eq!(w.code(), codes::UNRESOLVED_SYMBOL);
        assert_eq!(w.node(), g(1, 1));

        let depth = ResolveWarning::DepthLimit {
            instance: g(1, 1),
            max_depth: 3,
        };
        assert_eq!(depth.code(), codes::CYCLIC_INSTANCE_GRAPH);
    }

    #[test]
    fn test_warning_message() {
        let w = ResolveWarning::UnresolvedSymbol {
            instance: g(1, 1),
            symbol: Some(g(2, 2)),
        };
        assert_eq!(w.to_string(), "instance 1:1 targets unknown symbol 2:2");

        let none = ResolveWarning::UnresolvedSymbol {
            instance: g(1, 1),
            symbol: None,
        };
        assert_eq!(none.to_string(), "instance 1:1 targets unknown symbol <none>");
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.warn(ResolveWarning::MalformedOverride { instance: g(1, 1) });
        collector.warn(ResolveWarning::MalformedOverride { instance: g(1, 2) });
        collector.warn(ResolveWarning::DuplicateNode { node: g(1, 1) });

        assert_eq!(collector.warning_count(), 3);
        assert_eq!(collector.with_code(codes::MALFORMED_OVERRIDE).len(), 2);
        assert_eq!(collector.diagnostics_for_node(g(1, 1)).len(), 2);
    }

    #[test]
    fn test_depth_limit_is_informational() {
        let mut collector = DiagnosticCollector::new();
        collector.warn(ResolveWarning::DepthLimit {
            instance: g(1, 1),
            max_depth: 3,
        });
        collector.warn(ResolveWarning::CyclicInstanceGraph {
            instance: g(1, 2),
            symbol: g(2, 0),
        });

        assert_eq!(collector.diagnostics().len(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert_eq!(collector.diagnostics()[0].severity, Severity::Info);
        assert_eq!(collector.with_code(codes::CYCLIC_INSTANCE_GRAPH).len(), 2);
    }

    #[test]
    fn test_collector_take() {
        let mut collector = DiagnosticCollector::new();
        collector.warn(ResolveWarning::DuplicateNode { node: g(1, 1) });
        let taken = collector.take();
        assert_eq!(taken.len(), 1);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_shared_diagnostics_from_threads() {
        let shared = SharedDiagnostics::new();
        std::thread::scope(|scope| {
            for i in 0..4 {
                let shared = &shared;
                scope.spawn(move || {
                    let mut sink = shared;
                    sink.warn(ResolveWarning::DuplicateNode { node: g(1, i) });
                });
            }
        });
        assert_eq!(shared.len(), 4);
        assert_eq!(shared.into_inner().warning_count(), 4);
    }

    #[test]
    fn test_vec_sink() {
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        warnings.warn(ResolveWarning::DuplicateNode { node: g(1, 1) });
        assert_eq!(warnings.len(), 1);
    }
}
