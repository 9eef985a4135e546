//! Node type tags.

/// The closed set of node types the resolver distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "interchange",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum NodeType {
    Document,
    Canvas,
    Frame,
    Group,
    Section,
    Text,
    Instance,
    Symbol,
    Vector,
    Rectangle,
    Ellipse,
    Line,
    Star,
    RegularPolygon,
    BooleanOperation,
    Slice,
    Other,
}

impl NodeType {
    /// Whether a CONTAINER override hint may land on this node.
    ///
    /// Only frames and instances own children that overrides can reach
    /// through a longer path.
    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Frame | NodeType::Instance)
    }

    /// Get a display string for this type.
    pub fn display(self) -> &'static str {
        match self {
            NodeType::Document => "DOCUMENT",
            NodeType::Canvas => "CANVAS",
            NodeType::Frame => "FRAME",
            NodeType::Group => "GROUP",
            NodeType::Section => "SECTION",
            NodeType::Text => "TEXT",
            NodeType::Instance => "INSTANCE",
            NodeType::Symbol => "SYMBOL",
            NodeType::Vector => "VECTOR",
            NodeType::Rectangle => "RECTANGLE",
            NodeType::Ellipse => "ELLIPSE",
            NodeType::Line => "LINE",
            NodeType::Star => "STAR",
            NodeType::RegularPolygon => "REGULAR_POLYGON",
            NodeType::BooleanOperation => "BOOLEAN_OPERATION",
            NodeType::Slice => "SLICE",
            NodeType::Other => "OTHER",
        }
    }
}
