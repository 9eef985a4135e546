//! Flattened view of a symbol's subtree.

use crate::base::{Guid, Size};
use crate::node::{Node, NodeType};

/// What the translation engine needs to know about one symbol descendant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescendantInfo {
    pub guid: Guid,
    pub kind: NodeType,
    pub visible: bool,
    pub size: Size,
}

impl DescendantInfo {
    pub fn new(guid: Guid, kind: NodeType, visible: bool, size: Size) -> Self {
        Self {
            guid,
            kind,
            visible,
            size,
        }
    }
}

impl From<&Node> for DescendantInfo {
    fn from(node: &Node) -> Self {
        Self::new(node.guid, node.kind, node.visible, node.size)
    }
}

/// Walk `roots` and every node below them in preorder.
pub fn collect_descendants(roots: &[Node]) -> Vec<DescendantInfo> {
    let mut out = Vec::new();
    for root in roots {
        root.walk(&mut |node| out.push(DescendantInfo::from(node)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_empty() {
        assert!(collect_descendants(&[]).is_empty());
    }

    #[test]
    fn test_collect_visits_every_depth() {
        let roots = vec![
            Node::new(Guid::new(10, 1), NodeType::Frame)
                .with_size(100.0, 40.0)
                .with_children(vec![
                    Node::new(Guid::new(10, 2), NodeType::Text).with_visible(false),
                    Node::instance(Guid::new(10, 3), Guid::new(5, 0)),
                ]),
            Node::new(Guid::new(10, 4), NodeType::Vector),
        ];
        let infos = collect_descendants(&roots);

        let ids: Vec<_> = infos.iter().map(|d| d.guid.local_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(infos[0].size, Size::new(100.0, 40.0));
        assert!(!infos[1].visible);
        assert_eq!(infos[2].kind, NodeType::Instance);
    }
}
