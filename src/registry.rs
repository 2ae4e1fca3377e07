//! Static node-type registry: the canonical handle layout and default data
//! field values for every known node type.
//!
//! The registry is the single source of truth for what "default" means. The
//! converters route all handle backfilling and elision through it so that a
//! compact document omitting handle declarations reconstructs exactly the
//! handle set a full export would have carried.

use crate::model::{DataType, HandleDirection, HandlePosition, NodeType};
use serde_json::{Map, Value};

/// One entry of a node type's canonical handle layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleTemplate {
    pub label: &'static str,
    pub direction: HandleDirection,
    pub data_type: DataType,
    pub position: HandlePosition,
    pub max_connections: Option<u32>,
}

impl HandleTemplate {
    const fn input(label: &'static str) -> Self {
        Self {
            label,
            direction: HandleDirection::Input,
            data_type: DataType::Any,
            position: HandlePosition::Left,
            max_connections: None,
        }
    }

    const fn output(label: &'static str) -> Self {
        Self {
            label,
            direction: HandleDirection::Output,
            data_type: DataType::Any,
            position: HandlePosition::Right,
            max_connections: None,
        }
    }

    const fn limited(self, max: u32) -> Self {
        Self {
            max_connections: Some(max),
            ..self
        }
    }
}

/// A default value for a node data field, elided from compact exports and
/// restored on import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Str(s) => Value::from(s),
            DefaultValue::Int(i) => Value::from(i),
            DefaultValue::Bool(b) => Value::from(b),
        }
    }
}

/// The registry record for one node type.
#[derive(Debug, Clone, Copy)]
pub struct NodeTypeSpec {
    pub handles: &'static [HandleTemplate],
    pub default_data: &'static [(&'static str, DefaultValue)],
}

const START: NodeTypeSpec = NodeTypeSpec {
    handles: &[HandleTemplate::output("output")],
    default_data: &[("trigger_mode", DefaultValue::Str("manual"))],
};

const PERSON_JOB: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::input("first").limited(1),
        HandleTemplate::output("output"),
    ],
    default_data: &[("max_iteration", DefaultValue::Int(1))],
};

const CONDITION: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("true"),
        HandleTemplate::output("false"),
    ],
    default_data: &[],
};

const CODE_JOB: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("output"),
    ],
    default_data: &[("language", DefaultValue::Str("python"))],
};

const API_JOB: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("output"),
    ],
    default_data: &[("method", DefaultValue::Str("GET"))],
};

const ENDPOINT: NodeTypeSpec = NodeTypeSpec {
    handles: &[HandleTemplate::input("input")],
    default_data: &[("save_to_file", DefaultValue::Bool(false))],
};

const DB: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("output"),
    ],
    default_data: &[("operation", DefaultValue::Str("read"))],
};

const USER_RESPONSE: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("output"),
    ],
    default_data: &[],
};

const HOOK: NodeTypeSpec = NodeTypeSpec {
    handles: &[
        HandleTemplate::input("input"),
        HandleTemplate::output("output"),
    ],
    default_data: &[],
};

/// The single typed accessor into the registry.
///
/// Returns `None` for node types unknown to this build (forward
/// compatibility): such nodes have no default handles, so a document must
/// declare their handles explicitly, and exporters skip elision for them.
pub fn spec_of(node_type: &NodeType) -> Option<&'static NodeTypeSpec> {
    match node_type {
        NodeType::Start => Some(&START),
        NodeType::PersonJob => Some(&PERSON_JOB),
        NodeType::Condition => Some(&CONDITION),
        NodeType::CodeJob => Some(&CODE_JOB),
        NodeType::ApiJob => Some(&API_JOB),
        NodeType::Endpoint => Some(&ENDPOINT),
        NodeType::Db => Some(&DB),
        NodeType::UserResponse => Some(&USER_RESPONSE),
        NodeType::Hook => Some(&HOOK),
        NodeType::Other(_) => None,
    }
}

/// Default handle templates for `node_type`; empty for unknown types.
pub fn default_handle_templates(node_type: &NodeType) -> &'static [HandleTemplate] {
    spec_of(node_type).map(|spec| spec.handles).unwrap_or(&[])
}

/// Default data field values for `node_type` as a field bag.
pub fn default_data(node_type: &NodeType) -> Map<String, Value> {
    spec_of(node_type)
        .map(|spec| {
            spec.default_data
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_value()))
                .collect()
        })
        .unwrap_or_default()
}
