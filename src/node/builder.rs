//! Node tree builder: flat records to an owned forest.
//!
//! The binary decoder hands over one record per node, each naming its
//! parent and a position string. Siblings are ordered by that string
//! (the format uses fractional-index keys, which sort lexicographically).

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::Guid;
use crate::diagnostics::{ResolveWarning, WarningSink};
use super::tree::Node;

#[cfg(feature = "interchange")]
use serde::{Deserialize, Serialize};

/// Where a record sits under its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct ParentIndex {
    pub guid: Guid,
    pub position: SmolStr,
}

/// One decoded node record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct NodeRecord {
    /// The node itself; any children it carries are kept ahead of
    /// record-linked children.
    pub node: Node,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub parent: Option<ParentIndex>,
}

impl NodeRecord {
    pub fn root(node: Node) -> Self {
        Self { node, parent: None }
    }

    pub fn child(node: Node, parent: Guid, position: impl Into<SmolStr>) -> Self {
        Self {
            node,
            parent: Some(ParentIndex {
                guid: parent,
                position: position.into(),
            }),
        }
    }
}

/// Assemble records into a forest.
///
/// Duplicate identifiers keep the first record. Records whose parent is
/// unknown become roots. Records caught in a parent cycle are never
/// reachable from a root; the first of them (in record order) is promoted
/// to a root so nothing is lost.
pub fn build_forest(records: Vec<NodeRecord>, sink: &mut impl WarningSink) -> Vec<Node> {
    let mut nodes: IndexMap<Guid, NodeRecord> = IndexMap::with_capacity(records.len());
    for record in records {
        let guid = record.node.guid;
        if nodes.contains_key(&guid) {
            sink.warn(ResolveWarning::DuplicateNode { node: guid });
            continue;
        }
        nodes.insert(guid, record);
    }

    // Parent → children, in (position, record order).
    let mut children_of: FxHashMap<Guid, Vec<(SmolStr, usize, Guid)>> = FxHashMap::default();
    let mut roots: Vec<Guid> = Vec::new();
    for (order, (guid, record)) in nodes.iter().enumerate() {
        match &record.parent {
            None => roots.push(*guid),
            Some(parent) if parent.guid == *guid || !nodes.contains_key(&parent.guid) => {
                sink.warn(ResolveWarning::OrphanNode {
                    node: *guid,
                    parent: parent.guid,
                });
                roots.push(*guid);
            }
            Some(parent) => children_of.entry(parent.guid).or_default().push((
                parent.position.clone(),
                order,
                *guid,
            )),
        }
    }
    for siblings in children_of.values_mut() {
        siblings.sort();
    }

    let mut placed: FxHashSet<Guid> = FxHashSet::default();
    mark_reachable(&roots, &children_of, &mut placed);

    // Anything not reachable sits on a parent cycle.
    let stranded: Vec<Guid> = nodes
        .keys()
        .filter(|guid| !placed.contains(*guid))
        .copied()
        .collect();
    for guid in stranded {
        if placed.contains(&guid) {
            continue;
        }
        if let Some(parent) = nodes.get(&guid).and_then(|r| r.parent.as_ref()) {
            sink.warn(ResolveWarning::OrphanNode {
                node: guid,
                parent: parent.guid,
            });
        }
        // Detach from the cycle so assembly below cannot loop.
        for siblings in children_of.values_mut() {
            siblings.retain(|(_, _, child)| *child != guid);
        }
        roots.push(guid);
        mark_reachable(&[guid], &children_of, &mut placed);
    }

    let mut forest = Vec::with_capacity(roots.len());
    for guid in roots {
        if let Some(node) = assemble(guid, &mut nodes, &children_of) {
            forest.push(node);
        }
    }
    forest
}

fn mark_reachable(
    from: &[Guid],
    children_of: &FxHashMap<Guid, Vec<(SmolStr, usize, Guid)>>,
    placed: &mut FxHashSet<Guid>,
) {
    let mut stack: Vec<Guid> = from.to_vec();
    while let Some(guid) = stack.pop() {
        if !placed.insert(guid) {
            continue;
        }
        if let Some(children) = children_of.get(&guid) {
            stack.extend(children.iter().map(|(_, _, child)| *child));
        }
    }
}

fn assemble(
    guid: Guid,
    nodes: &mut IndexMap<Guid, NodeRecord>,
    children_of: &FxHashMap<Guid, Vec<(SmolStr, usize, Guid)>>,
) -> Option<Node> {
    let mut node = nodes.swap_remove(&guid)?.node;
    if let Some(children) = children_of.get(&guid) {
        for (_, _, child) in children {
            if let Some(child) = assemble(*child, nodes, children_of) {
                node.children.push(child);
            }
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    fn g(session: u32, local: u32) -> Guid {
        Guid::new(session, local)
    }

    fn frame(local: u32) -> Node {
        Node::new(g(1, local), NodeType::Frame)
    }

    #[test]
    fn test_build_orders_siblings_by_position() {
        let records = vec![
            NodeRecord::root(frame(0)),
            NodeRecord::child(frame(2), g(1, 0), "b"),
            NodeRecord::child(frame(1), g(1, 0), "a"),
            NodeRecord::child(frame(3), g(1, 0), "c"),
        ];
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let forest = build_forest(records, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(forest.len(), 1);
        let order: Vec<_> = forest[0].children.iter().map(|n| n.guid.local_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_build_equal_positions_keep_record_order() {
        let records = vec![
            NodeRecord::root(frame(0)),
            NodeRecord::child(frame(5), g(1, 0), "a"),
            NodeRecord::child(frame(4), g(1, 0), "a"),
        ];
        let forest = build_forest(records, &mut Vec::<ResolveWarning>::new());
        let order: Vec<_> = forest[0].children.iter().map(|n| n.guid.local_id).collect();
        assert_eq!(order, vec![5, 4]);
    }

    #[test]
    fn test_build_duplicate_dropped() {
        let records = vec![
            NodeRecord::root(frame(0).with_name("kept")),
            NodeRecord::root(frame(0).with_name("dropped")),
        ];
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let forest = build_forest(records, &mut warnings);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "kept");
        assert_eq!(warnings, vec![ResolveWarning::DuplicateNode { node: g(1, 0) }]);
    }

    #[test]
    fn test_build_orphan_becomes_root() {
        let records = vec![
            NodeRecord::root(frame(0)),
            NodeRecord::child(frame(1), g(9, 9), "a"),
        ];
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let forest = build_forest(records, &mut warnings);

        assert_eq!(forest.len(), 2);
        assert_eq!(
            warnings,
            vec![ResolveWarning::OrphanNode {
                node: g(1, 1),
                parent: g(9, 9)
            }]
        );
    }

    #[test]
    fn test_build_parent_cycle_terminates() {
        let records = vec![
            NodeRecord::child(frame(1), g(1, 2), "a"),
            NodeRecord::child(frame(2), g(1, 1), "a"),
        ];
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let forest = build_forest(records, &mut warnings);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 2);
        assert_eq!(warnings.len(), 1);
    }
}
