//! Override entries and the payloads they carry.
//!
//! An [`OverrideEntry`] addresses a node through a `guid_path`. The first
//! element names a node inside the subtree the override list is attached
//! to; further elements cross into nested instances one level at a time.
//! All payload fields are optional and only the ones present are applied.

use smol_str::SmolStr;

use crate::base::{Affine, Guid, Size};

#[cfg(feature = "interchange")]
use serde::{Deserialize, Serialize};

/// An RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// A fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub enum Paint {
    Solid(Color),
    /// An image fill, referenced by the content hash of its blob.
    Image { hash: SmolStr },
}

/// Text content of a TEXT node, or a text edit carried by an override.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct TextData {
    pub characters: String,
    pub font_size: Option<f64>,
}

impl TextData {
    pub fn new(characters: impl Into<String>) -> Self {
        Self {
            characters: characters.into(),
            font_size: None,
        }
    }
}

/// The value assigned to a component property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub enum ComponentPropValue {
    Bool(bool),
    Text(String),
    /// Swap the targeted instance to another symbol.
    InstanceSwap(Guid),
}

/// A component-property assignment made by an instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct ComponentPropAssignment {
    /// The property definition this assignment targets.
    pub def_id: Guid,
    pub value: ComponentPropValue,
}

impl ComponentPropAssignment {
    pub fn new(def_id: Guid, value: ComponentPropValue) -> Self {
        Self { def_id, value }
    }
}

/// Which field of a node a component property drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub enum ComponentPropField {
    Visible,
    TextCharacters,
    OverriddenSymbolId,
}

/// A reference from a node inside a symbol to a component property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize))]
pub struct ComponentPropRef {
    pub def_id: Guid,
    pub field: ComponentPropField,
}

/// One localized override attached to an instance.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize), serde(default))]
pub struct OverrideEntry {
    /// Target path. Well-formed entries have at least one element.
    pub guid_path: Vec<Guid>,
    pub size: Option<Size>,
    pub transform: Option<Affine>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub name: Option<SmolStr>,
    pub fills: Option<Vec<Paint>>,
    /// Text-edit payload.
    pub text: Option<TextData>,
    pub component_props: Option<Vec<ComponentPropAssignment>>,
    /// Variant switch: the targeted nested instance renders this symbol.
    pub overridden_symbol_id: Option<Guid>,
}

impl OverrideEntry {
    /// Create an entry with the given path and no payload.
    pub fn new(guid_path: impl Into<Vec<Guid>>) -> Self {
        Self {
            guid_path: guid_path.into(),
            ..Self::default()
        }
    }

    /// The first path element, if any.
    #[inline]
    pub fn head(&self) -> Option<Guid> {
        self.guid_path.first().copied()
    }

    /// Number of path elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.guid_path.len()
    }

    /// Whether the entry has an empty path and cannot address anything.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        self.guid_path.is_empty()
    }

    /// A copy of this entry addressed one nesting level down.
    ///
    /// Returns `None` for depth-1 or malformed entries.
    pub fn demoted(&self) -> Option<Self> {
        if self.guid_path.len() < 2 {
            return None;
        }
        Some(Self {
            guid_path: self.guid_path[1..].to_vec(),
            ..self.clone()
        })
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fills(mut self, fills: Vec<Paint>) -> Self {
        self.fills = Some(fills);
        self
    }

    pub fn with_text(mut self, characters: impl Into<String>) -> Self {
        self.text = Some(TextData::new(characters));
        self
    }

    pub fn with_component_props(mut self, props: Vec<ComponentPropAssignment>) -> Self {
        self.component_props = Some(props);
        self
    }

    pub fn with_overridden_symbol(mut self, symbol_id: Guid) -> Self {
        self.overridden_symbol_id = Some(symbol_id);
        self
    }
}

/// The two override lists a node may carry.
///
/// On an instance these are its own lists. On any realized node they
/// also hold entries demoted from an enclosing instance, waiting for the
/// node to be resolved itself.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "interchange", derive(Serialize, Deserialize), serde(default))]
pub struct OverrideInputs {
    /// Property overrides.
    pub symbol_overrides: Vec<OverrideEntry>,
    /// Layout-only overrides computed by the authoring tool.
    pub derived_symbol_data: Vec<OverrideEntry>,
}

impl OverrideInputs {
    pub fn is_empty(&self) -> bool {
        self.symbol_overrides.is_empty() && self.derived_symbol_data.is_empty()
    }

    /// Iterate both lists, derived data first.
    pub fn iter(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.derived_symbol_data
            .iter()
            .chain(self.symbol_overrides.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(session: u32, local: u32) -> Guid {
        Guid::new(session, local)
    }

    #[test]
    fn test_entry_depth_and_head() {
        let entry = OverrideEntry::new(vec![g(20, 1), g(20, 2)]);
        assert_eq!(entry.depth(), 2);
        assert_eq!(entry.head(), Some(g(20, 1)));
        assert!(!entry.is_malformed());
        assert!(OverrideEntry::default().is_malformed());
    }

    #[test]
    fn test_entry_demoted_strips_head() {
        let entry = OverrideEntry::new(vec![g(20, 1), g(30, 2), g(40, 3)]).with_text("hi");
        let demoted = entry.demoted().unwrap();
        assert_eq!(demoted.guid_path, vec![g(30, 2), g(40, 3)]);
        assert_eq!(demoted.text, entry.text);
    }

    #[test]
    fn test_entry_demoted_depth_one_is_none() {
        assert!(OverrideEntry::new(vec![g(1, 1)]).demoted().is_none());
        assert!(OverrideEntry::default().demoted().is_none());
    }

    #[test]
    fn test_inputs_iter_derived_first() {
        let inputs = OverrideInputs {
            symbol_overrides: vec![OverrideEntry::new(vec![g(1, 1)])],
            derived_symbol_data: vec![OverrideEntry::new(vec![g(1, 2)])],
        };
        let heads: Vec<_> = inputs.iter().filter_map(|e| e.head()).collect();
        assert_eq!(heads, vec![g(1, 2), g(1, 1)]);
        assert!(!inputs.is_empty());
        assert!(OverrideInputs::default().is_empty());
    }
}
