//! Resolved symbol cache.
//!
//! Every symbol realized once, the way an override-free instance of it
//! would be. Built bottom-up before any parallel work starts and never
//! written afterwards, so resolvers on many threads can share it.
//!
//! An entry records how many instance levels its realization spans and
//! which symbols it entered. A resolver only takes an entry when both fit
//! its own remaining depth and visited path, so cached and uncached
//! resolution produce the same trees and the same warnings.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::Guid;
use crate::diagnostics::{ResolveWarning, WarningSink};
use crate::node::{Node, NodeIndex};
use super::driver::{InstanceResolver, SymbolTargetResolver};
use super::options::ResolveOptions;

/// One symbol realized from an empty path at depth 0.
#[derive(Clone, Debug)]
pub(crate) struct CachedSymbol {
    children: Arc<[Node]>,
    /// Deepest instance level inside `children`, 0 when there are none.
    height: usize,
    /// Every symbol an instance inside `children` resolved to.
    reaches: FxHashSet<Guid>,
}

impl CachedSymbol {
    /// Whether an instance at `depth` on the `visited` path would realize
    /// to exactly these children.
    pub(crate) fn fits(&self, depth: usize, max_depth: usize, visited: &[Guid]) -> bool {
        depth + self.height <= max_depth && !visited.iter().any(|id| self.reaches.contains(id))
    }

    pub(crate) fn children(&self) -> &[Node] {
        &self.children
    }
}

/// Realized children per symbol.
#[derive(Clone, Debug, Default)]
pub struct ResolvedSymbolCache {
    symbols: FxHashMap<Guid, CachedSymbol>,
}

impl ResolvedSymbolCache {
    /// Realize every symbol in `index` with stored symbol targets.
    ///
    /// Same as [`build_for`](Self::build_for) with
    /// `InstanceResolver::new(index).with_options(*options)`.
    pub fn build(
        index: &NodeIndex<'_>,
        options: &ResolveOptions,
        sink: &mut impl WarningSink,
    ) -> Self {
        Self::build_for(&InstanceResolver::new(index).with_options(*options), sink)
    }

    /// Realize every symbol `resolver` can see, using its options and its
    /// target picker.
    ///
    /// Symbols referenced by nested instances are realized first and
    /// reused. A symbol whose realization hits a cycle, the depth bound or
    /// an unknown symbol is reported to `sink` and left out; instances of
    /// it resolve through the full pipeline instead.
    pub fn build_for<T>(resolver: &InstanceResolver<'_, T>, sink: &mut impl WarningSink) -> Self
    where
        T: SymbolTargetResolver + Clone,
    {
        let index = resolver.index();
        let _span =
            tracing::debug_span!("build_symbol_cache", symbols = index.symbols().len()).entered();

        let mut order = Vec::with_capacity(index.symbols().len());
        let mut seen = FxHashSet::default();
        for &symbol in index.symbols() {
            dependencies_first(resolver, symbol, &mut seen, &mut order);
        }

        let mut cache = Self::default();
        for symbol in order {
            let mut warnings: Vec<ResolveWarning> = Vec::new();
            let children = resolver
                .scoped(&cache)
                .realize_symbol(symbol, &mut warnings);
            if !warnings.is_empty() {
                tracing::debug!(symbol = %symbol.guid, warnings = warnings.len(), "not cached");
                warnings.into_iter().for_each(|warning| sink.warn(warning));
                continue;
            }
            let mut height = 0;
            let mut reaches = FxHashSet::default();
            measure(resolver, &children, 1, &mut height, &mut reaches);
            cache.symbols.insert(
                symbol.guid,
                CachedSymbol {
                    children: children.into(),
                    height,
                    reaches,
                },
            );
        }
        tracing::debug!(cached = cache.symbols.len(), "symbol cache built");
        cache
    }

    /// Realized children of `symbol`, if cached.
    pub fn get(&self, symbol: Guid) -> Option<Arc<[Node]>> {
        self.symbols.get(&symbol).map(|entry| Arc::clone(&entry.children))
    }

    pub(crate) fn entry(&self, symbol: Guid) -> Option<&CachedSymbol> {
        self.symbols.get(&symbol)
    }

    pub fn contains(&self, symbol: Guid) -> bool {
        self.symbols.contains_key(&symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Post-order walk of the symbol graph so dependencies are cached first.
fn dependencies_first<'a, T: SymbolTargetResolver>(
    resolver: &InstanceResolver<'a, T>,
    symbol: &'a Node,
    seen: &mut FxHashSet<Guid>,
    order: &mut Vec<&'a Node>,
) {
    if !seen.insert(symbol.guid) {
        return;
    }
    let mut targets = Vec::new();
    for child in &symbol.children {
        child.walk(&mut |node: &Node| {
            if node.is_instance() {
                targets.extend(resolver.effective_symbol_id(node));
            }
        });
    }
    for target in targets {
        if let Some(dependency) = resolver.index().symbol(target) {
            dependencies_first(resolver, dependency, seen, order);
        }
    }
    order.push(symbol);
}

fn measure<T: SymbolTargetResolver>(
    resolver: &InstanceResolver<'_, T>,
    nodes: &[Node],
    level: usize,
    height: &mut usize,
    reaches: &mut FxHashSet<Guid>,
) {
    for node in nodes {
        if node.is_instance() {
            *height = (*height).max(level);
            reaches.extend(resolver.effective_symbol_id(node));
            measure(resolver, &node.children, level + 1, height, reaches);
        } else {
            measure(resolver, &node.children, level, height, reaches);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticCollector, codes};
    use crate::node::{NodeType, OverrideEntry, OverrideInputs};

    fn g(session: u32, local: u32) -> Guid {
        Guid::new(session, local)
    }

    fn icon() -> Node {
        Node::new(g(1, 0), NodeType::Symbol)
            .with_children(vec![Node::new(g(1, 1), NodeType::Vector).with_size(16.0, 16.0)])
    }

    fn button() -> Node {
        Node::new(g(2, 0), NodeType::Symbol).with_children(vec![
            Node::new(g(2, 1), NodeType::Text).with_text("OK"),
            Node::instance(g(2, 2), g(1, 0)),
        ])
    }

    fn symbol_with_instance(symbol: Guid, instance: Guid, target: Guid) -> Node {
        Node::new(symbol, NodeType::Symbol).with_children(vec![Node::instance(instance, target)])
    }

    #[test]
    fn test_nested_symbols_realized() {
        let forest = vec![button(), icon()];
        let index = NodeIndex::new(&forest);
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let cache = ResolvedSymbolCache::build(&index, &ResolveOptions::default(), &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(cache.len(), 2);
        let children = cache.get(g(2, 0)).unwrap();
        assert_eq!(children[1].children.len(), 1);
        assert_eq!(children[1].children[0].guid, g(1, 1));
    }

    #[test]
    fn test_entry_height_and_reach() {
        let forest = vec![button(), icon()];
        let index = NodeIndex::new(&forest);
        let cache = ResolvedSymbolCache::build(
            &index,
            &ResolveOptions::default(),
            &mut Vec::<ResolveWarning>::new(),
        );

        let button = cache.entry(g(2, 0)).unwrap();
        assert_eq!(button.height, 1);
        assert!(button.reaches.contains(&g(1, 0)));
        assert!(button.fits(3, 4, &[]));
        assert!(!button.fits(4, 4, &[]));
        assert!(!button.fits(0, 10, &[g(1, 0)]));

        let icon = cache.entry(g(1, 0)).unwrap();
        assert_eq!(icon.height, 0);
        assert!(icon.fits(4, 4, &[g(2, 0)]));
    }

    #[test]
    fn test_cyclic_symbols_left_out() {
        let forest = vec![
            symbol_with_instance(g(1, 0), g(1, 1), g(2, 0)),
            symbol_with_instance(g(2, 0), g(2, 1), g(1, 0)),
        ];
        let index = NodeIndex::new(&forest);
        let mut collector = DiagnosticCollector::new();
        let cache = ResolvedSymbolCache::build(&index, &ResolveOptions::default(), &mut collector);

        assert!(cache.is_empty());
        // Each symbol reports its own truncated realization
        assert_eq!(collector.with_code(codes::CYCLIC_INSTANCE_GRAPH).len(), 2);
    }

    #[test]
    fn test_depth_bound_applies_while_building() {
        let forest = vec![
            symbol_with_instance(g(1, 0), g(1, 1), g(2, 0)),
            symbol_with_instance(g(2, 0), g(2, 1), g(3, 0)),
            Node::new(g(3, 0), NodeType::Symbol)
                .with_children(vec![Node::new(g(3, 1), NodeType::Rectangle)]),
        ];
        let index = NodeIndex::new(&forest);
        let options = ResolveOptions::default().with_max_depth(1);
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let cache = ResolvedSymbolCache::build(&index, &options, &mut warnings);

        assert!(cache.contains(g(3, 0)));
        assert!(cache.contains(g(2, 0)));
        assert!(!cache.contains(g(1, 0)));
        assert_eq!(
            warnings,
            vec![ResolveWarning::DepthLimit {
                instance: g(2, 1),
                max_depth: 1,
            }]
        );
    }

    #[test]
    fn test_overridden_nested_instance_resolved() {
        let card = Node::new(g(3, 0), NodeType::Symbol).with_children(vec![
            Node::instance(g(3, 1), g(1, 0)).with_overrides(OverrideInputs {
                symbol_overrides: vec![OverrideEntry::new(vec![g(1, 1)]).with_visible(false)],
                derived_symbol_data: Vec::new(),
            }),
        ]);
        let forest = vec![card, icon()];
        let index = NodeIndex::new(&forest);
        let cache = ResolvedSymbolCache::build(
            &index,
            &ResolveOptions::default(),
            &mut Vec::<ResolveWarning>::new(),
        );

        let children = cache.get(g(3, 0)).unwrap();
        assert!(!children[0].children[0].visible);
        // The shared icon entry stays pristine
        assert!(cache.get(g(1, 0)).unwrap()[0].visible);
    }

    #[test]
    fn test_target_picker_used_while_building() {
        let forest = vec![
            symbol_with_instance(g(3, 0), g(3, 1), g(1, 0)),
            icon(),
            Node::new(g(2, 0), NodeType::Symbol)
                .with_children(vec![Node::new(g(2, 1), NodeType::Ellipse)]),
        ];
        let index = NodeIndex::new(&forest);
        let swap = |node: &Node| node.symbol_id.map(|id| if id == g(1, 0) { g(2, 0) } else { id });
        let resolver = InstanceResolver::new(&index).with_target(swap);
        let cache = ResolvedSymbolCache::build_for(&resolver, &mut Vec::<ResolveWarning>::new());

        let children = cache.get(g(3, 0)).unwrap();
        assert_eq!(children[0].children[0].guid, g(2, 1));
        assert!(cache.entry(g(3, 0)).unwrap().reaches.contains(&g(2, 0)));
    }

    #[test]
    fn test_missing_symbol_warns() {
        let forest = vec![symbol_with_instance(g(1, 0), g(1, 1), g(9, 0))];
        let index = NodeIndex::new(&forest);
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let cache = ResolvedSymbolCache::build(&index, &ResolveOptions::default(), &mut warnings);

        assert!(!cache.contains(g(1, 0)));
        assert_eq!(
            warnings,
            vec![ResolveWarning::UnresolvedSymbol {
                instance: g(1, 1),
                symbol: Some(g(9, 0)),
            }]
        );
    }
}
