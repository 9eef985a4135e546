//! Document model: nodes, override entries, and the tree builder.
//!
//! - [`Node`] - An owned node tree
//! - [`NodeIndex`] - Non-owning `Guid → &Node` lookup ("symbol map")
//! - [`OverrideEntry`], [`OverrideInputs`] - Instance overrides
//! - [`build_forest`] - Flat records to an owned forest

mod builder;
mod document;
mod index;
mod kind;
mod overrides;
mod tree;

pub use builder::{NodeRecord, ParentIndex, build_forest};
#[cfg(feature = "interchange")]
pub use document::InterchangeError;
pub use document::Document;
pub use index::NodeIndex;
pub use kind::NodeType;
pub use overrides::{
    Color, ComponentPropAssignment, ComponentPropField, ComponentPropRef, ComponentPropValue,
    OverrideEntry, OverrideInputs, Paint, TextData,
};
pub use tree::Node;
