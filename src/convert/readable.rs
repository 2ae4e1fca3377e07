//! The embedded label-keyed dialect: each node of the `workflow` map carries
//! its own outgoing connections inline, and a connection may leave the source
//! handle implicit when it is the node's default output.

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
struct ReadableDoc {
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
    workflow: BTreeMap<String, WorkflowNodeDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    handles: Vec<HandleDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkflowNodeDoc {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    person: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    connections: Vec<InlineConnectionDoc>,
    #[serde(flatten)]
    props: Map<String, Value>,
}

/// One outgoing connection of a workflow node. `handle` names the source
/// handle and is omitted when the connection leaves from the node's default
/// output.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineConnectionDoc {
    to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<ContentType>,
    #[serde(flatten)]
    data: Map<String, Value>,
}

pub struct ReadableYamlConverter;

impl DiagramConverter for ReadableYamlConverter {
    fn format(&self) -> DiagramFormat {
        DiagramFormat::Readable
    }

    fn serialize(&self, diagram: &Diagram) -> Result<String, ExportError> {
        let mut ctx = LabelContext::new();
        let doc = build_doc(diagram, &mut ctx)?;
        serde_yaml::to_string(&doc).map_err(|err| ExportError::Emit(err.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<Diagram, ImportError> {
        let doc: ReadableDoc = parse_yaml(text)?;
        check_version(doc.version.as_deref(), DiagramFormat::Readable)?;
        validate(&doc)?;
        build_diagram(doc)
    }
}

fn build_doc(diagram: &Diagram, ctx: &mut LabelContext) -> Result<ReadableDoc, ExportError> {
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

    // Labels are claimed for every node before any connection is formatted,
    // since arrows may point at nodes not yet visited.
    for node in &diagram.nodes {
        let base = node
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| node.node_type.display_name());
        ctx.claim_node_label(&base, &node.id);
    }

    let mut outgoing: BTreeMap<&NodeId, Vec<InlineConnectionDoc>> = BTreeMap::new();
    for arrow in &diagram.arrows {
        let dangling = |handle_id: &HandleId| ExportError::DanglingEndpoint {
            arrow_id: arrow.id.clone(),
            handle_id: handle_id.clone(),
        };
        let (source_node, source_handle) =
            arrow.source.split().ok_or_else(|| dangling(&arrow.source))?;
        let (target_node, target_handle) =
            arrow.target.split().ok_or_else(|| dangling(&arrow.target))?;
        let target_label = ctx
            .node_label(&target_node)
            .ok_or_else(|| dangling(&arrow.target))?;
        if ctx.node_label(&source_node).is_none() {
            return Err(dangling(&arrow.source));
        }

        // The source handle is left implicit exactly when the default-output
        // rule would resolve it back; the same rule runs on import.
        let implicit = handles::default_output(&diagram.handles, &source_node)
            .is_some_and(|default| default.label == source_handle);
        let source_key = diagram
            .node(&source_node)
            .map(|n| &n.id)
            .ok_or_else(|| dangling(&arrow.source))?;
        outgoing.entry(source_key).or_default().push(InlineConnectionDoc {
            to: format!("{target_label}:{target_handle}"),
            handle: (!implicit).then(|| source_handle.to_string()),
            label: arrow.label.clone(),
            content_type: arrow.content_type,
            data: arrow.data.clone().unwrap_or_default(),
        });
    }

    let mut workflow = BTreeMap::new();
    for node in &diagram.nodes {
        let label = ctx
            .node_label(&node.id)
            .map(str::to_string)
            .unwrap_or_default();
        workflow.insert(
            label,
            WorkflowNodeDoc {
                node_type: Some(node.node_type.clone()),
                position: Some(node.position.rounded()),
                person: node
                    .person_id()
                    .and_then(|id| ctx.person_label(&id))
                    .map(str::to_string),
                connections: outgoing.remove(&node.id).unwrap_or_default(),
                props: export_node_props(node),
            },
        );
    }

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

    Ok(ReadableDoc {
        version: Some(DiagramFormat::Readable.version_tag().to_string()),
        name,
        description,
        api_keys,
        persons,
        workflow,
        handles: handle_docs,
    })
}

fn validate(doc: &ReadableDoc) -> Result<(), ImportError> {
    let mut issues = Vec::new();
    for (label, node) in &doc.workflow {
        if node.node_type.is_none() {
            issues.push(format!("node '{label}' is missing required field 'type'"));
        }
        if node.position.is_none() {
            issues.push(format!("node '{label}' is missing required field 'position'"));
        }
        for (index, conn) in node.connections.iter().enumerate() {
            if split_endpoint(&conn.to).is_none() {
                issues.push(format!(
                    "connection #{index} of node '{label}' has malformed 'to' endpoint '{}', expected 'label:handle'",
                    conn.to
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

fn build_diagram(doc: ReadableDoc) -> Result<Diagram, ImportError> {
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
    let mut inline: Vec<(String, Vec<InlineConnectionDoc>)> = Vec::new();
    for (index, (label, node_doc)) in doc.workflow.into_iter().enumerate() {
        let id = NodeId::new(format!("node_{index}"));
        ctx.bind_node(&label, id.clone());
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
        if !node_doc.connections.is_empty() {
            inline.push((label, node_doc.connections));
        }
    }

    // Declared handles go in first so a customized handle that reuses a
    // default's name (e.g. a retyped `output`) wins over the backfill.
    let mut handles_vec: Vec<Handle> = Vec::new();
    for handle_doc in doc.handles {
        let handle = handle_doc.resolve(&ctx)?;
        let duplicate = handles_vec
            .iter()
            .any(|h| h.node_id == handle.node_id && h.label == handle.label);
        if duplicate {
            debug!(handle = %handle.id, "skipping duplicate handle declaration");
        } else {
            handles_vec.push(handle);
        }
    }

    for node in &nodes {
        handles::backfill_defaults(&mut handles_vec, &node.id, &node.node_type);
    }

    // Connections are resolved only after the full handle set exists, so an
    // omitted source handle can fall back on the default output.
    let mut arrows = Vec::new();
    let mut arrow_index = 0usize;
    for (source_label, connections) in inline {
        let source_node = ctx.require_node_id(&source_label)?.clone();
        for conn in connections {
            let (to_label, to_handle) = split_endpoint(&conn.to).unwrap_or((conn.to.as_str(), ""));
            let target_node = ctx.require_node_id(to_label)?.clone();
            let source_handle = match &conn.handle {
                Some(name) => name.clone(),
                None => handles::default_output(&handles_vec, &source_node)
                    .map(|h| h.label.clone())
                    .ok_or_else(|| ImportError::NoDefaultOutput {
                        label: source_label.clone(),
                    })?,
            };
            let source = handles::ensure_endpoint(
                &mut handles_vec,
                &source_node,
                &source_handle,
                HandleDirection::Output,
            );
            let target = handles::ensure_endpoint(
                &mut handles_vec,
                &target_node,
                to_handle,
                HandleDirection::Input,
            );
            arrows.push(Arrow {
                id: ArrowId::new(format!("arrow_{arrow_index}")),
                source,
                target,
                content_type: conn.content_type,
                label: conn.label,
                data: (!conn.data.is_empty()).then_some(conn.data),
            });
            arrow_index += 1;
        }
    }

    let metadata = DiagramMetadata {
        name: doc.name,
        description: doc.description,
        ..DiagramMetadata::stamped()
    };

    Ok(Diagram {
        nodes,
        handles: handles_vec,
        arrows,
        persons,
        api_keys,
        metadata: Some(metadata),
    })
}
