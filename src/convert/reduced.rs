//! The compact label-keyed dialect: nodes keyed by display label, a flat
//! connection list, and every default (handles, sampling parameters, node
//! data fields) elided.

use crate::convert::context::LabelContext;
use crate::convert::docs::{
    ApiKeyDoc, HandleDoc, PersonDoc, export_node_props, import_node_data, split_endpoint,
};
use crate::convert::{DiagramConverter, DiagramFormat, check_version, parse_yaml};
use crate::error::{ExportError, ImportError};
use crate::handles;
use crate::model::{
    ApiKeyId, Arrow, ArrowId, ContentType, Diagram, DiagramMetadata, Handle, HandleDirection,
    HandleId, Node, NodeId, NodeType, PersonId, Vec2,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReducedDoc {
    #[serde(default)]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    api_keys: BTreeMap<String, ApiKeyDoc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    persons: BTreeMap<String, PersonDoc>,
    #[serde(default)]
    nodes: BTreeMap<String, NodeDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    connections: Vec<ConnectionDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    handles: Vec<HandleDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    person: Option<String>,
    #[serde(flatten)]
    props: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDoc {
    from: String,
    to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<ContentType>,
    #[serde(flatten)]
    data: Map<String, Value>,
}

pub struct ReducedYamlConverter;

impl DiagramConverter for ReducedYamlConverter {
    fn format(&self) -> DiagramFormat {
        DiagramFormat::Reduced
    }

    fn serialize(&self, diagram: &Diagram) -> Result<String, ExportError> {
        let mut ctx = LabelContext::new();
        let doc = build_doc(diagram, &mut ctx)?;
        serde_yaml::to_string(&doc).map_err(|err| ExportError::Emit(err.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<Diagram, ImportError> {
        let doc: ReducedDoc = parse_yaml(text)?;
        check_version(doc.version.as_deref(), DiagramFormat::Reduced)?;
        validate(&doc)?;
        build_diagram(doc)
    }
}

/// Formats an arrow endpoint as `"nodeLabel:handleName"`, or reports the
/// defensive error for an endpoint whose node vanished from the diagram.
fn format_endpoint(
    arrow: &Arrow,
    endpoint: &HandleId,
    ctx: &LabelContext,
) -> Result<String, ExportError> {
    let dangling = || ExportError::DanglingEndpoint {
        arrow_id: arrow.id.clone(),
        handle_id: endpoint.clone(),
    };
    let (node_id, handle) = endpoint.split().ok_or_else(dangling)?;
    let label = ctx.node_label(&node_id).ok_or_else(dangling)?;
    Ok(format!("{label}:{handle}"))
}

fn build_doc(diagram: &Diagram, ctx: &mut LabelContext) -> Result<ReducedDoc, ExportError> {
    let mut api_keys = BTreeMap::new();
    for key in &diagram.api_keys {
        let label = ctx.claim_api_key_label(&key.label, &key.id);
        api_keys.insert(label, ApiKeyDoc::from_api_key(key));
    }

    let mut persons = BTreeMap::new();
    for person in &diagram.persons {
        let label = ctx.claim_person_label(&person.label, &person.id);
        persons.insert(label, PersonDoc::from_person(person, ctx));
    }

    let mut nodes = BTreeMap::new();
    for node in &diagram.nodes {
        let base = node
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| node.node_type.display_name());
        let label = ctx.claim_node_label(&base, &node.id);
        nodes.insert(
            label.clone(),
            NodeDoc {
                label: Some(label),
                node_type: Some(node.node_type.clone()),
                position: Some(node.position.rounded()),
                person: node
                    .person_id()
                    .and_then(|id| ctx.person_label(&id))
                    .map(str::to_string),
                props: export_node_props(node),
            },
        );
    }

    let mut connections = Vec::new();
    for arrow in &diagram.arrows {
        connections.push(ConnectionDoc {
            from: format_endpoint(arrow, &arrow.source, ctx)?,
            to: format_endpoint(arrow, &arrow.target, ctx)?,
            label: arrow.label.clone(),
            content_type: arrow.content_type,
            data: arrow.data.clone().unwrap_or_default(),
        });
    }

    // Only handles the registry cannot reconstruct are written out.
    let mut handle_docs = Vec::new();
    for handle in &diagram.handles {
        let node = diagram.node(&handle.node_id);
        let is_default = node
            .map(|n| handles::is_default(handle, &n.node_type))
            .unwrap_or(false);
        if !is_default {
            let label = ctx
                .node_label(&handle.node_id)
                .ok_or_else(|| ExportError::OrphanHandle {
                    handle_id: handle.id.clone(),
                })?;
            handle_docs.push(HandleDoc::from_handle(handle, label));
        }
    }

    let (name, description) = diagram
        .metadata
        .as_ref()
        .map(|m| (m.name.clone(), m.description.clone()))
        .unwrap_or((None, None));

    Ok(ReducedDoc {
        version: Some(DiagramFormat::Reduced.version_tag().to_string()),
        name,
        description,
        api_keys,
        persons,
        nodes,
        connections,
        handles: handle_docs,
    })
}

/// Pre-conversion structural pass: every problem is collected so a document
/// can be fixed in one round.
fn validate(doc: &ReducedDoc) -> Result<(), ImportError> {
    let mut issues = Vec::new();
    for (label, node) in &doc.nodes {
        if node.node_type.is_none() {
            issues.push(format!("node '{label}' is missing required field 'type'"));
        }
        if node.position.is_none() {
            issues.push(format!("node '{label}' is missing required field 'position'"));
        }
    }
    for (index, conn) in doc.connections.iter().enumerate() {
        for (field, raw) in [("from", &conn.from), ("to", &conn.to)] {
            if split_endpoint(raw).is_none() {
                issues.push(format!(
                    "connection #{index} has malformed '{field}' endpoint '{raw}', expected 'label:handle'"
                ));
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ImportError::Validation { issues })
    }
}

fn build_diagram(doc: ReducedDoc) -> Result<Diagram, ImportError> {
    let mut ctx = LabelContext::new();

    let mut api_keys = Vec::new();
    for (index, (label, key_doc)) in doc.api_keys.into_iter().enumerate() {
        let id = ApiKeyId::new(format!("apikey_{index}"));
        ctx.bind_api_key(&label, id.clone());
        api_keys.push(key_doc.into_api_key(id, &label));
    }

    let mut persons = Vec::new();
    for (index, (label, person_doc)) in doc.persons.into_iter().enumerate() {
        let id = PersonId::new(format!("person_{index}"));
        ctx.bind_person(&label, id.clone());
        persons.push(person_doc.into_person(id, &label, &ctx));
    }

    let mut nodes = Vec::new();
    for (index, (label, node_doc)) in doc.nodes.into_iter().enumerate() {
        let id = NodeId::new(format!("node_{index}"));
        ctx.bind_node(&label, id.clone());
        // Presence was checked by the validation pass.
        let node_type = node_doc.node_type.unwrap_or(NodeType::Other(String::new()));
        let position = node_doc.position.unwrap_or(Vec2::new(0.0, 0.0));
        let person_id = match &node_doc.person {
            Some(person_label) => Some(ctx.require_person_id(person_label)?.clone()),
            None => None,
        };
        let data = import_node_data(&node_type, &label, node_doc.props, person_id.as_ref());
        nodes.push(Node {
            id,
            node_type,
            position,
            data,
        });
    }

    // Declared handles go in first so a customized handle that reuses a
    // default's name (e.g. a retyped `output`) wins over the backfill.
    let mut handles: Vec<Handle> = Vec::new();
    for handle_doc in doc.handles {
        let handle = handle_doc.resolve(&ctx)?;
        let duplicate = handles
            .iter()
            .any(|h| h.node_id == handle.node_id && h.label == handle.label);
        if duplicate {
            debug!(handle = %handle.id, "skipping duplicate handle declaration");
        } else {
            handles.push(handle);
        }
    }

    for node in &nodes {
        handles::backfill_defaults(&mut handles, &node.id, &node.node_type);
    }

    let mut arrows = Vec::new();
    for (index, conn) in doc.connections.into_iter().enumerate() {
        // Separator presence was checked by the validation pass.
        let (from_label, from_handle) =
            split_endpoint(&conn.from).unwrap_or((conn.from.as_str(), ""));
        let (to_label, to_handle) = split_endpoint(&conn.to).unwrap_or((conn.to.as_str(), ""));
        let source_node = ctx.require_node_id(from_label)?.clone();
        let target_node = ctx.require_node_id(to_label)?.clone();
        let source = handles::ensure_endpoint(
            &mut handles,
            &source_node,
            from_handle,
            HandleDirection::Output,
        );
        let target =
            handles::ensure_endpoint(&mut handles, &target_node, to_handle, HandleDirection::Input);
        arrows.push(Arrow {
            id: ArrowId::new(format!("arrow_{index}")),
            source,
            target,
            content_type: conn.content_type,
            label: conn.label,
            data: (!conn.data.is_empty()).then_some(conn.data),
        });
    }

    let metadata = DiagramMetadata {
        name: doc.name,
        description: doc.description,
        ..DiagramMetadata::stamped()
    };

    Ok(Diagram {
        nodes,
        handles,
        arrows,
        persons,
        api_keys,
        metadata: Some(metadata),
    })
}
