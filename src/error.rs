use crate::model::{ApiKeyId, ArrowId, DataType, HandleDirection, HandleId, NodeId, PersonId};
use itertools::Itertools;
use thiserror::Error;

/// Violations of the graph invariants, found while checking a fully
/// constructed diagram (e.g. on identity-format import).
#[derive(Error, Debug, Clone)]
pub enum IntegrityError {
    #[error("handle id '{handle_id}' is not derivable from its node id and label")]
    MalformedHandleId { handle_id: HandleId },

    #[error("handle '{handle_id}' belongs to node '{node_id}', which is not in the diagram")]
    MissingNode {
        handle_id: HandleId,
        node_id: NodeId,
    },

    #[error("handle '{handle_id}' is declared more than once")]
    DuplicateHandle { handle_id: HandleId },

    #[error("arrow '{arrow_id}' references handle '{handle_id}', which is not in the diagram")]
    MissingHandle {
        arrow_id: ArrowId,
        handle_id: HandleId,
    },

    #[error(
        "arrow '{arrow_id}' endpoint '{handle_id}' has the wrong direction, expected {expected:?}"
    )]
    WrongDirection {
        arrow_id: ArrowId,
        handle_id: HandleId,
        expected: HandleDirection,
    },

    #[error("arrow '{arrow_id}' connects incompatible data types {source_type:?} -> {target_type:?}")]
    IncompatibleDataTypes {
        arrow_id: ArrowId,
        source_type: DataType,
        target_type: DataType,
    },

    #[error("node '{node_id}' references person '{person_id}', which is not in the diagram")]
    MissingPerson {
        node_id: NodeId,
        person_id: PersonId,
    },

    #[error("person '{person_id}' references api key '{api_key_id}', which is not in the diagram")]
    MissingApiKey {
        person_id: PersonId,
        api_key_id: ApiKeyId,
    },
}

/// Errors that can occur while deserializing a text document into a diagram.
///
/// Structural problems are collected into a single [`ImportError::Validation`]
/// listing every issue found, so a document can be fixed in one pass.
/// Reference errors abort the conversion immediately and name the label that
/// failed to resolve.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to parse document: {0}")]
    Syntax(String),

    #[error("document is missing the required 'version' tag")]
    MissingVersion,

    #[error("unrecognized document version '{found}', expected '{expected}'")]
    UnsupportedVersion {
        found: String,
        expected: &'static str,
    },

    #[error("document failed validation with {} issue(s):\n  - {}", issues.len(), issues.iter().join("\n  - "))]
    Validation { issues: Vec<String> },

    #[error("connection references unknown node label '{label}'")]
    UnknownNodeLabel { label: String },

    #[error("node references unknown person label '{label}'")]
    UnknownPersonLabel { label: String },

    #[error("node '{label}' has no output handle to use as a default connection source")]
    NoDefaultOutput { label: String },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Errors that can occur while serializing a diagram.
///
/// Serialization is total over well-formed diagrams; these only surface
/// emitter failures or caller bugs such as arrows whose endpoint node is no
/// longer part of the diagram.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to emit document: {0}")]
    Emit(String),

    #[error("arrow '{arrow_id}' endpoint '{handle_id}' does not resolve to a node in the diagram")]
    DanglingEndpoint {
        arrow_id: ArrowId,
        handle_id: HandleId,
    },

    #[error("handle '{handle_id}' belongs to a node that is not in the diagram")]
    OrphanHandle { handle_id: HandleId },
}

/// Either side of a format-to-format conversion can fail.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
