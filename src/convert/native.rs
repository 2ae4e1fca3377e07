//! The identifier-preserving dialect: a direct JSON projection of the graph
//! model, intended for machine-to-machine transfer where ids must survive.

use crate::convert::{DiagramConverter, DiagramFormat, check_version};
use crate::error::{ExportError, ImportError};
use crate::model::{ApiKey, Arrow, Diagram, DiagramMetadata, Handle, Node, Person};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeDoc {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    handles: Vec<Handle>,
    #[serde(default)]
    arrows: Vec<Arrow>,
    #[serde(default)]
    persons: Vec<Person>,
    #[serde(default)]
    api_keys: Vec<ApiKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<DiagramMetadata>,
}

pub struct NativeJsonConverter;

impl DiagramConverter for NativeJsonConverter {
    fn format(&self) -> DiagramFormat {
        DiagramFormat::Native
    }

    fn serialize(&self, diagram: &Diagram) -> Result<String, ExportError> {
        let doc = NativeDoc {
            version: Some(DiagramFormat::Native.version_tag().to_string()),
            nodes: diagram.nodes.clone(),
            handles: diagram.handles.clone(),
            arrows: diagram.arrows.clone(),
            persons: diagram.persons.clone(),
            api_keys: diagram.api_keys.clone(),
            metadata: diagram.metadata.clone(),
        };
        serde_json::to_string_pretty(&doc).map_err(|err| ExportError::Emit(err.to_string()))
    }

    /// Reconstructs the diagram verbatim, then checks the full set of graph
    /// invariants. Unlike the label-keyed dialects, every reference here is
    /// by raw id, so a broken credential link is a hard error too.
    fn deserialize(&self, text: &str) -> Result<Diagram, ImportError> {
        let doc: NativeDoc =
            serde_json::from_str(text).map_err(|err| ImportError::Syntax(err.to_string()))?;
        check_version(doc.version.as_deref(), DiagramFormat::Native)?;
        let diagram = Diagram {
            nodes: doc.nodes,
            handles: doc.handles,
            arrows: doc.arrows,
            persons: doc.persons,
            api_keys: doc.api_keys,
            metadata: doc.metadata,
        };
        diagram.check_integrity()?;
        Ok(diagram)
    }
}
