//! A parsed document snapshot.

use crate::diagnostics::WarningSink;
use super::builder::{NodeRecord, build_forest};
use super::index::NodeIndex;
use super::tree::Node;

/// An immutable forest of nodes, as produced by the tree builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    roots: Vec<Node>,
}

impl Document {
    /// Wrap an already assembled forest.
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    /// Build a document from decoded records.
    pub fn from_records(records: Vec<NodeRecord>, sink: &mut impl WarningSink) -> Self {
        Self::new(build_forest(records, sink))
    }

    /// Load records from their JSON interchange form.
    #[cfg(feature = "interchange")]
    pub fn from_json(
        json: &str,
        sink: &mut impl WarningSink,
    ) -> Result<Self, InterchangeError> {
        let records: Vec<NodeRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records, sink))
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Build the identifier lookup table for this document.
    pub fn index(&self) -> NodeIndex<'_> {
        NodeIndex::new(&self.roots)
    }

    /// Every instance node in the document, in preorder.
    pub fn instances(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.walk(&mut |node| {
                if node.is_instance() {
                    out.push(node);
                }
            });
        }
        out
    }
}

/// Errors from loading the JSON interchange form.
#[cfg(feature = "interchange")]
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Guid;
    #[cfg(feature = "interchange")]
    use crate::diagnostics::ResolveWarning;
    use crate::node::NodeType;

    #[test]
    fn test_document_instances() {
        let doc = Document::new(vec![
            Node::new(Guid::new(0, 0), NodeType::Canvas).with_children(vec![
                Node::new(Guid::new(1, 0), NodeType::Symbol),
                Node::instance(Guid::new(2, 0), Guid::new(1, 0)),
                Node::new(Guid::new(3, 0), NodeType::Frame)
                    .with_children(vec![Node::instance(Guid::new(3, 1), Guid::new(1, 0))]),
            ]),
        ]);

        let instances: Vec<_> = doc.instances().iter().map(|n| n.guid).collect();
        assert_eq!(instances, vec![Guid::new(2, 0), Guid::new(3, 1)]);
        assert_eq!(doc.index().symbols().len(), 1);
    }

    #[cfg(feature = "interchange")]
    #[test]
    fn test_document_from_json() {
        let json = r#"[
            {"node": {"guid": {"session_id": 0, "local_id": 0}, "kind": "CANVAS",
                      "name": "Page", "visible": true, "opacity": 1.0,
                      "size": {"width": 0.0, "height": 0.0},
                      "transform": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]}},
            {"node": {"guid": {"session_id": 1, "local_id": 0}, "kind": "SYMBOL",
                      "name": "Button", "visible": true, "opacity": 1.0,
                      "size": {"width": 80.0, "height": 24.0},
                      "transform": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]},
             "parent": {"guid": {"session_id": 0, "local_id": 0}, "position": "a"}}
        ]"#;
        let mut warnings: Vec<ResolveWarning> = Vec::new();
        let doc = Document::from_json(json, &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(doc.roots().len(), 1);
        assert_eq!(doc.roots()[0].children[0].kind, NodeType::Symbol);
    }
}
