//! Owned node trees.

use smol_str::SmolStr;

use crate::base::{Affine, Guid, Size};
use super::kind::NodeType;
use super::overrides::{
    ComponentPropAssignment, ComponentPropRef, OverrideInputs, Paint, TextData,
};

#[cfg(feature = "interchange")]
use serde::{Deserialize, Serialize};

/// A document node.
///
/// Each node owns its children outright. Cross references between nodes
/// (an instance naming its symbol, for example) are plain [`Guid`]s looked
/// up through a [`super::NodeIndex`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct Node {
    pub guid: Guid,
    pub kind: NodeType,
    pub name: SmolStr,
    pub visible: bool,
    pub opacity: f64,
    pub size: Size,
    pub transform: Affine,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub fills: Vec<Paint>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub text: Option<TextData>,
    /// Fields of this node driven by component properties.
    #[cfg_attr(feature = "interchange", serde(default))]
    pub component_prop_refs: Vec<ComponentPropRef>,
    /// Component-property assignments this node makes (instances).
    #[cfg_attr(feature = "interchange", serde(default))]
    pub component_prop_assignments: Vec<ComponentPropAssignment>,
    /// The symbol an instance renders.
    #[cfg_attr(feature = "interchange", serde(default))]
    pub symbol_id: Option<Guid>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub overrides: OverrideInputs,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a visible, childless node with identity transform and zero size.
    pub fn new(guid: Guid, kind: NodeType) -> Self {
        Self {
            guid,
            kind,
            name: SmolStr::default(),
            visible: true,
            opacity: 1.0,
            size: Size::ZERO,
            transform: Affine::IDENTITY,
            fills: Vec::new(),
            text: None,
            component_prop_refs: Vec::new(),
            component_prop_assignments: Vec::new(),
            symbol_id: None,
            overrides: OverrideInputs::default(),
            children: Vec::new(),
        }
    }

    /// Create an instance node rendering `symbol_id`.
    pub fn instance(guid: Guid, symbol_id: Guid) -> Self {
        Self {
            symbol_id: Some(symbol_id),
            ..Self::new(guid, NodeType::Instance)
        }
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        self.kind == NodeType::Instance
    }

    #[inline]
    pub fn is_symbol(&self) -> bool {
        self.kind == NodeType::Symbol
    }

    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_text(mut self, characters: impl Into<String>) -> Self {
        self.text = Some(TextData::new(characters));
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideInputs) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_prop_ref(mut self, prop_ref: ComponentPropRef) -> Self {
        self.component_prop_refs.push(prop_ref);
        self
    }

    pub fn with_assignments(mut self, assignments: Vec<ComponentPropAssignment>) -> Self {
        self.component_prop_assignments = assignments;
        self
    }

    /// Visit this node and every descendant in preorder.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Find a node by identifier in this subtree.
    pub fn find(&self, guid: Guid) -> Option<&Node> {
        if self.guid == guid {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(guid))
    }

    /// Count this node and all of its descendants.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new(Guid::new(1, 0), NodeType::Frame).with_children(vec![
            Node::new(Guid::new(1, 1), NodeType::Text).with_text("a"),
            Node::new(Guid::new(1, 2), NodeType::Group)
                .with_children(vec![Node::new(Guid::new(1, 3), NodeType::Vector)]),
        ])
    }

    #[test]
    fn test_walk_is_preorder() {
        let root = sample();
        let mut seen = Vec::new();
        root.walk(&mut |n| seen.push(n.guid.local_id));
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_find_and_len() {
        let root = sample();
        assert_eq!(root.subtree_len(), 4);
        assert_eq!(root.find(Guid::new(1, 3)).map(|n| n.kind), Some(NodeType::Vector));
        assert!(root.find(Guid::new(9, 9)).is_none());
    }

    #[test]
    fn test_instance_constructor() {
        let node = Node::instance(Guid::new(2, 1), Guid::new(1, 0));
        assert!(node.is_instance());
        assert_eq!(node.symbol_id, Some(Guid::new(1, 0)));
        assert!(node.visible);
    }
}
