//! Non-owning identifier lookup over a node forest.

use rustc_hash::FxHashMap;

use crate::base::Guid;
use super::tree::Node;

/// A `Guid → &Node` table over a forest.
///
/// This is the "symbol map" of the document: it lets an instance find
/// its symbol (or any node) in O(1). The forest keeps ownership; the
/// index only borrows, so it can never outlive or free a node.
#[derive(Clone, Debug, Default)]
pub struct NodeIndex<'a> {
    by_guid: FxHashMap<Guid, &'a Node>,
    /// Symbols in document order.
    symbols: Vec<&'a Node>,
}

impl<'a> NodeIndex<'a> {
    /// Index every node reachable from `roots`.
    ///
    /// If an identifier occurs twice the first occurrence (preorder) wins.
    pub fn new(roots: &'a [Node]) -> Self {
        let mut index = Self::default();
        for root in roots {
            root.walk(&mut |node| {
                if index.by_guid.contains_key(&node.guid) {
                    return;
                }
                index.by_guid.insert(node.guid, node);
                if node.is_symbol() {
                    index.symbols.push(node);
                }
            });
        }
        index
    }

    /// Look up any node.
    pub fn get(&self, guid: Guid) -> Option<&'a Node> {
        self.by_guid.get(&guid).copied()
    }

    /// Look up a node only if it is a symbol.
    pub fn symbol(&self, guid: Guid) -> Option<&'a Node> {
        self.get(guid).filter(|node| node.is_symbol())
    }

    /// All symbols, in document order.
    pub fn symbols(&self) -> &[&'a Node] {
        &self.symbols
    }

    pub fn contains(&self, guid: Guid) -> bool {
        self.by_guid.contains_key(&guid)
    }

    /// Get the total number of indexed nodes.
    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }
}
