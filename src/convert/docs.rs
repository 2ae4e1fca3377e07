//! Document vocabulary shared by the label-keyed dialects.
//!
//! The compact and embedded formats differ in how nodes and connections are
//! arranged, but they share the same persons, api keys and custom-handles
//! sections, the same `label:handle` endpoint syntax and the same
//! default-elision rules. That shared half lives here.

use crate::convert::context::LabelContext;
use crate::error::ImportError;
use crate::model::{
    ApiKey, ApiKeyId, DEFAULT_FREQUENCY_PENALTY, DEFAULT_MAX_TOKENS, DEFAULT_PRESENCE_PENALTY,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P, DataType, Handle, HandleDirection, HandleId,
    HandlePosition, LABEL_KEY, LlmService, Node, NodeType, PERSON_KEY, Person, PersonId,
};
use crate::registry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Splits a connection endpoint of the form `"nodeLabel:handleName"`.
///
/// Returns `None` when the separator is missing; the converters report that
/// as a structural validation issue before conversion begins.
pub fn split_endpoint(raw: &str) -> Option<(&str, &str)> {
    raw.split_once(':')
        .filter(|(label, handle)| !label.is_empty() && !handle.is_empty())
}

/// A person as written in the label-keyed formats: addressed by label, with
/// the credential reference by label and every sampling parameter omitted
/// when it equals the documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonDoc {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<LlmService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

fn elide<T: PartialEq>(value: T, default: T) -> Option<T> {
    (value != default).then_some(value)
}

impl PersonDoc {
    pub fn from_person(person: &Person, ctx: &LabelContext) -> Self {
        Self {
            model: person.model.clone(),
            service: elide(person.service, LlmService::default()),
            api_key: person
                .api_key_id
                .as_ref()
                .and_then(|id| ctx.api_key_label(id))
                .map(str::to_string),
            system_prompt: person.system_prompt.clone(),
            temperature: elide(person.temperature, DEFAULT_TEMPERATURE),
            max_tokens: elide(person.max_tokens, DEFAULT_MAX_TOKENS),
            top_p: elide(person.top_p, DEFAULT_TOP_P),
            frequency_penalty: elide(person.frequency_penalty, DEFAULT_FREQUENCY_PENALTY),
            presence_penalty: elide(person.presence_penalty, DEFAULT_PRESENCE_PENALTY),
        }
    }

    /// Reconstructs the person, restoring elided defaults.
    ///
    /// A credential label that was never declared leaves `api_key_id` unset
    /// rather than failing the import; the secret reference is advisory and
    /// resolvable later, unlike graph topology.
    pub fn into_person(self, id: PersonId, label: &str, ctx: &LabelContext) -> Person {
        let api_key_id = match &self.api_key {
            Some(key_label) => {
                let resolved = ctx.api_key_id(key_label).cloned();
                if resolved.is_none() {
                    warn!(label = %key_label, "person references undeclared api key, leaving unset");
                }
                resolved
            }
            None => None,
        };
        Person {
            id,
            label: label.to_string(),
            model: self.model,
            service: self.service.unwrap_or_default(),
            api_key_id,
            system_prompt: self.system_prompt,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            frequency_penalty: self.frequency_penalty.unwrap_or(DEFAULT_FREQUENCY_PENALTY),
            presence_penalty: self.presence_penalty.unwrap_or(DEFAULT_PRESENCE_PENALTY),
        }
    }
}

/// A credential reference as written in the label-keyed formats. Only the
/// provider tag survives serialization; the secret never enters the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyDoc {
    pub service: LlmService,
}

impl ApiKeyDoc {
    pub fn from_api_key(api_key: &ApiKey) -> Self {
        Self {
            service: api_key.service,
        }
    }

    pub fn into_api_key(self, id: ApiKeyId, label: &str) -> ApiKey {
        ApiKey {
            id,
            label: label.to_string(),
            service: self.service,
        }
    }
}

/// An explicitly declared (non-default) handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDoc {
    pub node: String,
    pub name: String,
    pub direction: HandleDirection,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<HandlePosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

impl HandleDoc {
    pub fn from_handle(handle: &Handle, node_label: &str) -> Self {
        Self {
            node: node_label.to_string(),
            name: handle.label.clone(),
            direction: handle.direction,
            data_type: handle.data_type,
            position: handle.position,
            max_connections: handle.max_connections,
        }
    }

    /// Resolves the declaration against the imported nodes. Fails with a
    /// reference error when the node label was never declared.
    pub fn resolve(self, ctx: &LabelContext) -> Result<Handle, ImportError> {
        let node_id = ctx.require_node_id(&self.node)?.clone();
        Ok(Handle {
            id: HandleId::compose(&node_id, &self.name),
            node_id,
            label: self.name,
            direction: self.direction,
            data_type: self.data_type,
            position: self.position,
            max_connections: self.max_connections,
        })
    }
}

/// Exports the flattened data fields of a node: everything in the bag except
/// the label and person reference (written separately), values equal to the
/// node type's registry defaults, and nulls.
pub fn export_node_props(node: &Node) -> Map<String, Value> {
    let defaults = registry::default_data(&node.node_type);
    node.data
        .iter()
        .filter(|(key, value)| {
            key.as_str() != LABEL_KEY
                && key.as_str() != PERSON_KEY
                && !value.is_null()
                && defaults.get(key.as_str()) != Some(value)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Rebuilds a node's data bag from flattened document fields: declared props
/// win, then the registry defaults are backfilled, then the display label and
/// resolved person reference are recorded.
pub fn import_node_data(
    node_type: &NodeType,
    label: &str,
    props: Map<String, Value>,
    person_id: Option<&PersonId>,
) -> Map<String, Value> {
    let mut data = props;
    for (key, value) in registry::default_data(node_type) {
        data.entry(key).or_insert(value);
    }
    data.insert(LABEL_KEY.to_string(), Value::from(label));
    if let Some(person_id) = person_id {
        data.insert(PERSON_KEY.to_string(), Value::from(person_id.as_str()));
    }
    data
}
