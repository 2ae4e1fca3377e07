use crate::error::ImportError;
use crate::model::{ApiKeyId, NodeId, PersonId};
use ahash::AHashMap;

/// Per-call bidirectional mapping between internal identifiers and the
/// human-readable labels used by the label-keyed text formats.
///
/// A context is constructed at the entry of every `serialize`/`deserialize`
/// call and discarded at exit; it is deliberately a plain value threaded
/// through the conversion steps instead of converter state, so concurrent
/// calls on the same converter can never observe each other's maps.
#[derive(Debug, Default)]
pub struct LabelContext {
    node_by_label: AHashMap<String, NodeId>,
    label_by_node: AHashMap<NodeId, String>,
    person_by_label: AHashMap<String, PersonId>,
    label_by_person: AHashMap<PersonId, String>,
    api_key_by_label: AHashMap<String, ApiKeyId>,
    label_by_api_key: AHashMap<ApiKeyId, String>,
}

/// Picks a label unique within `taken`, disambiguating with `~1`, `~2`, ...
/// suffixes. The base is sanitized so it cannot collide with the
/// `label:handle` endpoint syntax.
fn unique_label<V>(taken: &AHashMap<String, V>, base: &str) -> String {
    let base = base.trim().replace(':', " ");
    let base = if base.is_empty() { "Untitled" } else { &base };
    let mut label = base.to_string();
    let mut suffix = 1;
    while taken.contains_key(&label) {
        label = format!("{base}~{suffix}");
        suffix += 1;
    }
    label
}

impl LabelContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node under a unique display label, returning the label
    /// actually claimed.
    pub fn claim_node_label(&mut self, base: &str, id: &NodeId) -> String {
        let label = unique_label(&self.node_by_label, base);
        self.node_by_label.insert(label.clone(), id.clone());
        self.label_by_node.insert(id.clone(), label.clone());
        label
    }

    pub fn claim_person_label(&mut self, base: &str, id: &PersonId) -> String {
        let label = unique_label(&self.person_by_label, base);
        self.person_by_label.insert(label.clone(), id.clone());
        self.label_by_person.insert(id.clone(), label.clone());
        label
    }

    pub fn claim_api_key_label(&mut self, base: &str, id: &ApiKeyId) -> String {
        let label = unique_label(&self.api_key_by_label, base);
        self.api_key_by_label.insert(label.clone(), id.clone());
        self.label_by_api_key.insert(id.clone(), label.clone());
        label
    }

    /// Binds an imported label to a freshly generated node id.
    pub fn bind_node(&mut self, label: &str, id: NodeId) {
        self.node_by_label.insert(label.to_string(), id.clone());
        self.label_by_node.insert(id, label.to_string());
    }

    pub fn bind_person(&mut self, label: &str, id: PersonId) {
        self.person_by_label.insert(label.to_string(), id.clone());
        self.label_by_person.insert(id, label.to_string());
    }

    pub fn bind_api_key(&mut self, label: &str, id: ApiKeyId) {
        self.api_key_by_label.insert(label.to_string(), id.clone());
        self.label_by_api_key.insert(id, label.to_string());
    }

    pub fn node_id(&self, label: &str) -> Option<&NodeId> {
        self.node_by_label.get(label)
    }

    pub fn node_label(&self, id: &NodeId) -> Option<&str> {
        self.label_by_node.get(id).map(String::as_str)
    }

    /// Like [`LabelContext::node_id`], but produces the reference error the
    /// converters report for a dangling connection endpoint.
    pub fn require_node_id(&self, label: &str) -> Result<&NodeId, ImportError> {
        self.node_id(label).ok_or_else(|| ImportError::UnknownNodeLabel {
            label: label.to_string(),
        })
    }

    pub fn person_id(&self, label: &str) -> Option<&PersonId> {
        self.person_by_label.get(label)
    }

    pub fn person_label(&self, id: &PersonId) -> Option<&str> {
        self.label_by_person.get(id).map(String::as_str)
    }

    pub fn require_person_id(&self, label: &str) -> Result<&PersonId, ImportError> {
        self.person_id(label)
            .ok_or_else(|| ImportError::UnknownPersonLabel {
                label: label.to_string(),
            })
    }

    pub fn api_key_id(&self, label: &str) -> Option<&ApiKeyId> {
        self.api_key_by_label.get(label)
    }

    pub fn api_key_label(&self, id: &ApiKeyId) -> Option<&str> {
        self.label_by_api_key.get(id).map(String::as_str)
    }
}
