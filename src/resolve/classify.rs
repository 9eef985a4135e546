//! Type hints for override identifiers.
//!
//! Override entries never say what kind of node they target, but the
//! fields they carry give it away: a text edit lands on TEXT, component
//! property assignments land on an INSTANCE, and a longer path means the
//! target has children of its own.

use indexmap::IndexMap;

use crate::base::{Guid, Size};
use crate::node::{NodeType, OverrideEntry};

/// Expected node category for an override identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeHint {
    Text,
    Instance,
    /// A frame or instance, something with children.
    Container,
    Unknown,
}

impl TypeHint {
    /// Whether a node of `kind` satisfies this hint.
    pub fn agrees_with(self, kind: NodeType) -> bool {
        match self {
            TypeHint::Text => kind == NodeType::Text,
            TypeHint::Instance => kind == NodeType::Instance,
            TypeHint::Container => kind.is_container(),
            TypeHint::Unknown => false,
        }
    }

    /// Whether a node of `kind` belongs to this hint's candidate pool.
    ///
    /// Unlike [`TypeHint::agrees_with`], an unknown hint accepts anything.
    pub fn admits(self, kind: NodeType) -> bool {
        match self {
            TypeHint::Unknown => true,
            hint => hint.agrees_with(kind),
        }
    }
}

/// Everything the entries reveal about one first-level identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideFacts {
    has_text: bool,
    has_component_props: bool,
    has_deeper: bool,
    /// First size carried by a depth-1 entry.
    pub size: Option<Size>,
    /// Some entry switches the target to another symbol.
    pub swaps_symbol: bool,
}

impl OverrideFacts {
    pub fn hint(&self) -> TypeHint {
        if self.has_text && !self.has_deeper {
            TypeHint::Text
        } else if self.has_component_props {
            TypeHint::Instance
        } else if self.has_deeper {
            TypeHint::Container
        } else {
            TypeHint::Unknown
        }
    }

    fn absorb(&mut self, entry: &OverrideEntry) {
        let depth_one = entry.depth() == 1;
        if depth_one && entry.text.is_some() {
            self.has_text = true;
        }
        if entry.component_props.is_some() {
            self.has_component_props = true;
        }
        if entry.depth() > 1 {
            self.has_deeper = true;
        }
        if depth_one && self.size.is_none() {
            self.size = entry.size;
        }
        if entry.overridden_symbol_id.is_some() {
            self.swaps_symbol = true;
        }
    }
}

/// Per-identifier facts for an instance's override lists.
#[derive(Clone, Debug, Default)]
pub struct OverrideProfile {
    /// Keyed by first-level identifier, in order of first appearance.
    facts: IndexMap<Guid, OverrideFacts>,
}

impl OverrideProfile {
    /// Classify the union of both lists, derived data first.
    ///
    /// Entries with an empty path are ignored.
    pub fn classify(
        derived_symbol_data: &[OverrideEntry],
        symbol_overrides: &[OverrideEntry],
    ) -> Self {
        let mut facts: IndexMap<Guid, OverrideFacts> = IndexMap::new();
        for entry in derived_symbol_data.iter().chain(symbol_overrides) {
            let Some(head) = entry.head() else { continue };
            facts.entry(head).or_default().absorb(entry);
        }
        Self { facts }
    }

    /// First-level identifiers, in order of first appearance.
    pub fn ids(&self) -> impl Iterator<Item = Guid> + '_ {
        self.facts.keys().copied()
    }

    pub fn facts(&self, guid: Guid) -> Option<&OverrideFacts> {
        self.facts.get(&guid)
    }

    pub fn hint(&self, guid: Guid) -> TypeHint {
        self.facts
            .get(&guid)
            .map_or(TypeHint::Unknown, OverrideFacts::hint)
    }

    /// The depth-1 size carried for `guid`, if any.
    pub fn size(&self, guid: Guid) -> Option<Size> {
        self.facts.get(&guid).and_then(|f| f.size)
    }

    pub fn swaps_symbol(&self, guid: Guid) -> bool {
        self.facts.get(&guid).is_some_and(|f| f.swaps_symbol)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
