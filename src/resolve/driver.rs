//! Instance resolution: realizing an instance's children.
//!
//! For one instance: find its symbol, collect the symbol's descendants,
//! translate the override lists, and clone the symbol's children with the
//! overrides applied. Nested instances in the result are then resolved
//! the same way, one level deeper each time, until `max_depth` or a cycle
//! stops the descent.

use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::base::Guid;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, ResolveWarning, WarningSink};
use crate::node::{Node, NodeIndex, OverrideEntry};
use super::cache::ResolvedSymbolCache;
use super::clone::{CloneInputs, clone_symbol_children};
use super::descendants::collect_descendants;
use super::options::ResolveOptions;
use super::rewrite::translate_overrides;
use super::translate::build_translation_map;

// ============================================================================
// ERRORS & COLLABORATORS
// ============================================================================

/// Calling-convention violations. Document problems are warnings instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("node {guid} is a {kind} node, not an instance")]
    NotAnInstance { guid: Guid, kind: &'static str },
}

/// Picks the symbol an instance renders.
///
/// Variant and component-set selection lives outside this crate; hosts
/// plug it in here.
pub trait SymbolTargetResolver {
    fn effective_symbol_id(&self, instance: &Node) -> Option<Guid>;
}

/// Uses the symbol id stored on the instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoredTarget;

impl SymbolTargetResolver for StoredTarget {
    fn effective_symbol_id(&self, instance: &Node) -> Option<Guid> {
        instance.symbol_id
    }
}

impl<F> SymbolTargetResolver for F
where
    F: Fn(&Node) -> Option<Guid>,
{
    fn effective_symbol_id(&self, instance: &Node) -> Option<Guid> {
        self(instance)
    }
}

/// Outcome of resolving one instance in a batch.
#[derive(Clone, Debug)]
pub struct InstanceResolution {
    pub instance: Guid,
    pub children: Result<Vec<Node>, ResolveError>,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves instances against a read-only document snapshot.
#[derive(Clone, Debug)]
pub struct InstanceResolver<'a, T = StoredTarget> {
    index: &'a NodeIndex<'a>,
    cache: Option<&'a ResolvedSymbolCache>,
    options: ResolveOptions,
    target: T,
}

impl<'a> InstanceResolver<'a, StoredTarget> {
    /// Create a resolver with default options and stored symbol targets.
    pub fn new(index: &'a NodeIndex<'a>) -> Self {
        Self {
            index,
            cache: None,
            options: ResolveOptions::default(),
            target: StoredTarget,
        }
    }
}

impl<'a, T: SymbolTargetResolver> InstanceResolver<'a, T> {
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Consult a prebuilt cache for symbols and override-free nested instances.
    pub fn with_cache(mut self, cache: &'a ResolvedSymbolCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the effective-symbol picker.
    pub fn with_target<U: SymbolTargetResolver>(self, target: U) -> InstanceResolver<'a, U> {
        InstanceResolver {
            index: self.index,
            cache: self.cache,
            options: self.options,
            target,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub(crate) fn index(&self) -> &'a NodeIndex<'a> {
        self.index
    }

    pub(crate) fn effective_symbol_id(&self, instance: &Node) -> Option<Guid> {
        self.target.effective_symbol_id(instance)
    }

    /// Same resolver reading from `cache`, which may outlive it for less.
    pub(crate) fn scoped<'b>(&self, cache: &'b ResolvedSymbolCache) -> InstanceResolver<'b, T>
    where
        'a: 'b,
        T: Clone,
    {
        InstanceResolver {
            index: self.index,
            cache: Some(cache),
            options: self.options,
            target: self.target.clone(),
        }
    }

    /// Realize the children of `instance`.
    ///
    /// Unknown symbols, malformed entries, cycles and depth exhaustion are
    /// reported to `sink`; the instance then resolves to whatever could
    /// be realized. Only a non-instance argument is an error.
    pub fn resolve_instance(
        &self,
        instance: &Node,
        sink: &mut impl WarningSink,
    ) -> Result<Vec<Node>, ResolveError> {
        if !instance.is_instance() {
            return Err(ResolveError::NotAnInstance {
                guid: instance.guid,
                kind: instance.kind.display(),
            });
        }
        let mut visited = Vec::new();
        Ok(self.resolve_at(instance, 0, &mut visited, sink))
    }

    /// A copy of `root` with every instance below it (or itself) realized.
    pub fn realize(&self, root: &Node, sink: &mut impl WarningSink) -> Node {
        let mut out = root.clone();
        let mut visited = Vec::new();
        if out.is_instance() {
            self.realize_in_place(&mut out, 0, &mut visited, sink);
        } else {
            self.realize_nested(&mut out.children, 0, &mut visited, sink);
        }
        out
    }

    /// Children of `symbol` as an override-free instance at depth 0 sees them.
    pub(crate) fn realize_symbol(&self, symbol: &Node, sink: &mut impl WarningSink) -> Vec<Node> {
        let mut realized = symbol.children.clone();
        let mut visited = vec![symbol.guid];
        self.realize_nested(&mut realized, 1, &mut visited, sink);
        realized
    }

    /// Core resolution. `visited` holds the symbols on the current path.
    pub(crate) fn resolve_at(
        &self,
        instance: &Node,
        depth: usize,
        visited: &mut Vec<Guid>,
        sink: &mut impl WarningSink,
    ) -> Vec<Node> {
        let Some(symbol_id) = self.target.effective_symbol_id(instance) else {
            sink.warn(ResolveWarning::UnresolvedSymbol {
                instance: instance.guid,
                symbol: None,
            });
            return Vec::new();
        };
        let _span = tracing::debug_span!(
            "resolve_instance",
            instance = %instance.guid,
            symbol = %symbol_id,
            depth
        )
        .entered();

        let cached: Arc<[Node]>;
        let symbol_children: &[Node] = if let Some(symbol) = self.index.symbol(symbol_id) {
            symbol.children.as_slice()
        } else if let Some(hit) = self.cache.and_then(|cache| cache.get(symbol_id)) {
            cached = hit;
            &cached[..]
        } else {
            sink.warn(ResolveWarning::UnresolvedSymbol {
                instance: instance.guid,
                symbol: Some(symbol_id),
            });
            return Vec::new();
        };

        let derived = well_formed(instance.guid, &instance.overrides.derived_symbol_data, sink);
        let overrides = well_formed(instance.guid, &instance.overrides.symbol_overrides, sink);

        let descendants = collect_descendants(symbol_children);
        let map = build_translation_map(&descendants, &derived, &overrides, &self.options);
        tracing::debug!(
            descendants = descendants.len(),
            translated = map.len(),
            "translation map built"
        );
        let derived = translate_overrides(&derived, &map);
        let overrides = translate_overrides(&overrides, &map);

        let mut realized = clone_symbol_children(
            symbol_children,
            &CloneInputs {
                symbol_overrides: &overrides,
                derived_symbol_data: &derived,
                component_prop_assignments: &instance.component_prop_assignments,
            },
        );

        visited.push(symbol_id);
        self.realize_nested(&mut realized, depth + 1, visited, sink);
        visited.pop();
        realized
    }

    fn realize_nested(
        &self,
        nodes: &mut [Node],
        depth: usize,
        visited: &mut Vec<Guid>,
        sink: &mut impl WarningSink,
    ) {
        for node in nodes {
            if node.is_instance() {
                self.realize_in_place(node, depth, visited, sink);
            } else {
                self.realize_nested(&mut node.children, depth, visited, sink);
            }
        }
    }

    fn realize_in_place(
        &self,
        node: &mut Node,
        depth: usize,
        visited: &mut Vec<Guid>,
        sink: &mut impl WarningSink,
    ) {
        if depth > self.options.max_depth {
            sink.warn(ResolveWarning::DepthLimit {
                instance: node.guid,
                max_depth: self.options.max_depth,
            });
            return;
        }
        if let Some(symbol_id) = self.target.effective_symbol_id(node) {
            if visited.contains(&symbol_id) {
                sink.warn(ResolveWarning::CyclicInstanceGraph {
                    instance: node.guid,
                    symbol: symbol_id,
                });
                return;
            }
            let untouched =
                node.overrides.is_empty() && node.component_prop_assignments.is_empty();
            if untouched {
                let max_depth = self.options.max_depth;
                let hit = self
                    .cache
                    .and_then(|cache| cache.entry(symbol_id))
                    .filter(|entry| entry.fits(depth, max_depth, visited.as_slice()));
                if let Some(entry) = hit {
                    node.children = entry.children().to_vec();
                    return;
                }
            }
        }
        node.children = self.resolve_at(&*node, depth, visited, sink);
    }
}

impl<T: SymbolTargetResolver + Sync> InstanceResolver<'_, T> {
    /// Resolve many instances in parallel.
    ///
    /// Each result carries the diagnostics of its own resolution, in input
    /// order.
    pub fn resolve_all(&self, instances: &[&Node]) -> Vec<InstanceResolution> {
        instances
            .par_iter()
            .map(|instance| {
                let mut collector = DiagnosticCollector::new();
                let children = self.resolve_instance(instance, &mut collector);
                InstanceResolution {
                    instance: instance.guid,
                    children,
                    diagnostics: collector.take(),
                }
            })
            .collect()
    }
}

/// Copy out the entries with a non-empty path, reporting the rest.
fn well_formed(
    instance: Guid,
    entries: &[OverrideEntry],
    sink: &mut impl WarningSink,
) -> Vec<OverrideEntry> {
    entries
        .iter()
        .filter(|entry| {
            if entry.is_malformed() {
                sink.warn(ResolveWarning::MalformedOverride { instance });
                return false;
            }
            true
        })
        .cloned()
        .collect()
}
