//! Subtree cloning and override application.
//!
//! The symbol's children are deep-copied and the (already translated)
//! override entries are applied to the copy. Entries with a longer path
//! cannot be applied yet: their target lives inside a nested instance
//! that has not been realized. Those are demoted onto the node their
//! first element names and wait in its [`OverrideInputs`].
//!
//! [`OverrideInputs`]: crate::node::OverrideInputs

use rustc_hash::FxHashMap;

use crate::base::Guid;
use crate::node::{
    ComponentPropAssignment, ComponentPropField, ComponentPropValue, Node, NodeType, OverrideEntry,
    TextData,
};

/// What an instance brings to the clone of its symbol.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloneInputs<'a> {
    /// Translated property overrides.
    pub symbol_overrides: &'a [OverrideEntry],
    /// Translated layout overrides.
    pub derived_symbol_data: &'a [OverrideEntry],
    pub component_prop_assignments: &'a [ComponentPropAssignment],
}

/// Overrides grouped by the node they land on.
#[derive(Default)]
struct Targeted<'e> {
    properties: Vec<&'e OverrideEntry>,
    layout: Vec<&'e OverrideEntry>,
    demoted_properties: Vec<OverrideEntry>,
    demoted_layout: Vec<OverrideEntry>,
}

fn group_by_target<'e>(inputs: &CloneInputs<'e>) -> FxHashMap<Guid, Targeted<'e>> {
    let mut targets: FxHashMap<Guid, Targeted<'e>> = FxHashMap::default();
    for entry in inputs.symbol_overrides {
        let Some(head) = entry.head() else { continue };
        let slot = targets.entry(head).or_default();
        match entry.demoted() {
            Some(demoted) => slot.demoted_properties.push(demoted),
            None => slot.properties.push(entry),
        }
    }
    for entry in inputs.derived_symbol_data {
        let Some(head) = entry.head() else { continue };
        let slot = targets.entry(head).or_default();
        match entry.demoted() {
            Some(demoted) => slot.demoted_layout.push(demoted),
            None => slot.layout.push(entry),
        }
    }
    targets
}

/// Deep-copy `symbol_children` and apply an instance's overrides.
///
/// The source nodes are never modified. Component-property assignments
/// are applied first, so an explicit override on the same field wins.
/// Entries naming a node that is not in the copy are dropped.
pub fn clone_symbol_children(symbol_children: &[Node], inputs: &CloneInputs<'_>) -> Vec<Node> {
    let mut cloned = symbol_children.to_vec();
    if !inputs.component_prop_assignments.is_empty() {
        for node in &mut cloned {
            apply_component_props(node, inputs.component_prop_assignments);
        }
    }
    let mut targets = group_by_target(inputs);
    if !targets.is_empty() {
        for node in &mut cloned {
            apply_overrides(node, &mut targets);
        }
    }
    cloned
}

fn apply_overrides(node: &mut Node, targets: &mut FxHashMap<Guid, Targeted<'_>>) {
    if let Some(targeted) = targets.remove(&node.guid) {
        for entry in targeted.properties {
            apply_properties(node, entry);
        }
        for entry in targeted.layout {
            apply_layout(node, entry);
        }
        // After the node's own entries, so the enclosing instance wins.
        node.overrides
            .symbol_overrides
            .extend(targeted.demoted_properties);
        node.overrides
            .derived_symbol_data
            .extend(targeted.demoted_layout);
    }
    if targets.is_empty() {
        return;
    }
    for child in &mut node.children {
        apply_overrides(child, targets);
    }
}

fn apply_properties(node: &mut Node, entry: &OverrideEntry) {
    if let Some(name) = &entry.name {
        node.name = name.clone();
    }
    if let Some(visible) = entry.visible {
        node.visible = visible;
    }
    if let Some(opacity) = entry.opacity {
        node.opacity = opacity;
    }
    if let Some(fills) = &entry.fills {
        node.fills = fills.clone();
    }
    if let Some(edit) = &entry.text {
        let text = node.text.get_or_insert_with(TextData::default);
        text.characters = edit.characters.clone();
        if edit.font_size.is_some() {
            text.font_size = edit.font_size;
        }
    }
    if let Some(props) = &entry.component_props {
        for prop in props {
            match node
                .component_prop_assignments
                .iter_mut()
                .find(|existing| existing.def_id == prop.def_id)
            {
                Some(existing) => existing.value = prop.value.clone(),
                None => node.component_prop_assignments.push(prop.clone()),
            }
        }
    }
    if let Some(symbol_id) = entry.overridden_symbol_id {
        if node.is_instance() {
            node.symbol_id = Some(symbol_id);
        }
    }
    apply_layout(node, entry);
}

fn apply_layout(node: &mut Node, entry: &OverrideEntry) {
    if let Some(size) = entry.size {
        node.size = size;
    }
    if let Some(transform) = entry.transform {
        node.transform = transform;
    }
}

/// Push component-property values into every node that references them.
fn apply_component_props(node: &mut Node, assignments: &[ComponentPropAssignment]) {
    for prop_ref in &node.component_prop_refs {
        // Later assignments win.
        let Some(assignment) = assignments.iter().rev().find(|a| a.def_id == prop_ref.def_id) else {
            continue;
        };
        match (prop_ref.field, &assignment.value) {
            (ComponentPropField::Visible, ComponentPropValue::Bool(visible)) => {
                node.visible = *visible;
            }
            (ComponentPropField::TextCharacters, ComponentPropValue::Text(characters)) => {
                node.text.get_or_insert_with(TextData::default).characters = characters.clone();
            }
            (ComponentPropField::OverriddenSymbolId, ComponentPropValue::InstanceSwap(symbol)) => {
                if node.kind == NodeType::Instance {
                    node.symbol_id = Some(*symbol);
                }
            }
            _ => {}
        }
    }
    for child in &mut node.children {
        apply_component_props(child, assignments);
    }
}
