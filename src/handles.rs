//! Default-handle generation and elision.
//!
//! Both directions of every conversion go through this module: importers use
//! [`backfill_defaults`] to reconstruct the handle set a compact document
//! left implicit, exporters use [`is_default`] to elide handles that carry no
//! information beyond the node type's canonical layout.

use crate::model::{DataType, Handle, HandleDirection, HandleId, HandlePosition, NodeId, NodeType};
use crate::registry::{HandleTemplate, default_handle_templates};
use tracing::warn;

/// Name of the conventional default output handle.
pub const DEFAULT_OUTPUT_LABELS: [&str; 2] = ["output", "default"];

fn instantiate(node_id: &NodeId, template: &HandleTemplate) -> Handle {
    Handle {
        id: HandleId::compose(node_id, template.label),
        node_id: node_id.clone(),
        label: template.label.to_string(),
        direction: template.direction,
        data_type: template.data_type,
        position: Some(template.position),
        max_connections: template.max_connections,
    }
}

/// Instantiates the full default handle set for a concrete node.
///
/// Unknown node types yield an empty set; the caller is then expected to rely
/// on explicitly declared handles.
pub fn defaults_for(node_id: &NodeId, node_type: &NodeType) -> Vec<Handle> {
    default_handle_templates(node_type)
        .iter()
        .map(|template| instantiate(node_id, template))
        .collect()
}

/// Appends every default handle of `node_type` that the document did not
/// already declare, matching declarations by `(nodeId, label)`.
pub fn backfill_defaults(handles: &mut Vec<Handle>, node_id: &NodeId, node_type: &NodeType) {
    for template in default_handle_templates(node_type) {
        let declared = handles
            .iter()
            .any(|h| &h.node_id == node_id && h.label == template.label);
        if !declared {
            handles.push(instantiate(node_id, template));
        }
    }
}

/// Whether `handle` is fully described by its node type's canonical layout,
/// compared field-by-field on label, direction, data type and position.
///
/// Handles of unknown node types are never default: without a registry entry
/// there is nothing to elide against.
pub fn is_default(handle: &Handle, node_type: &NodeType) -> bool {
    default_handle_templates(node_type).iter().any(|template| {
        template.label == handle.label
            && template.direction == handle.direction
            && template.data_type == handle.data_type
            && Some(template.position) == handle.position
    })
}

/// Resolves the node's default output handle: the output literally named
/// `output` or `default`, or else the first output in declaration order.
///
/// The embedded format applies this rule identically when deciding whether a
/// source handle name needs to be written and when resolving an omitted one;
/// keeping one implementation is what makes the inference round-trip stable.
pub fn default_output<'a>(handles: &'a [Handle], node_id: &NodeId) -> Option<&'a Handle> {
    let outputs: Vec<&Handle> = handles
        .iter()
        .filter(|h| &h.node_id == node_id && h.direction == HandleDirection::Output)
        .collect();
    outputs
        .iter()
        .find(|h| DEFAULT_OUTPUT_LABELS.contains(&h.label.as_str()))
        .copied()
        .or_else(|| outputs.first().copied())
}

/// Ensures a handle referenced by a connection exists, creating a permissive
/// `any`-typed handle when the document never declared it.
///
/// An existing handle of the opposite direction is reused as-is with a
/// warning; the resulting diagram is still reported by
/// [`crate::model::Diagram::check_integrity`].
pub fn ensure_endpoint(
    handles: &mut Vec<Handle>,
    node_id: &NodeId,
    label: &str,
    direction: HandleDirection,
) -> HandleId {
    let id = HandleId::compose(node_id, label);
    match handles
        .iter()
        .find(|h| &h.node_id == node_id && h.label == label)
    {
        Some(handle) => {
            if handle.direction != direction {
                warn!(
                    handle = %id,
                    expected = ?direction,
                    "connection endpoint names a handle of the opposite direction"
                );
            }
        }
        None => {
            handles.push(Handle {
                id: id.clone(),
                node_id: node_id.clone(),
                label: label.to_string(),
                direction,
                data_type: DataType::Any,
                position: Some(match direction {
                    HandleDirection::Output => HandlePosition::Right,
                    HandleDirection::Input => HandlePosition::Left,
                }),
                max_connections: None,
            });
        }
    }
    id
}
