use crate::error::IntegrityError;
use crate::model::ids::{ApiKeyId, ArrowId, HandleId, NodeId, PersonId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Schema version stamped into freshly created diagram metadata.
pub const DIAGRAM_SCHEMA_VERSION: &str = "1.0";

/// Node data key holding the human-readable display label.
pub const LABEL_KEY: &str = "label";
/// Node data key holding the id of the person executing the node.
pub const PERSON_KEY: &str = "personId";

/// Documented defaults for person sampling parameters. Values equal to these
/// are elided by the label-keyed text formats and restored on import.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_FREQUENCY_PENALTY: f64 = 0.0;
pub const DEFAULT_PRESENCE_PENALTY: f64 = 0.0;

/// The closed set of node type tags known to the registry, plus an escape
/// hatch for tags introduced by newer editors. Unknown tags are carried
/// through conversions untouched; they simply have no default handle layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Start,
    PersonJob,
    Condition,
    CodeJob,
    ApiJob,
    Endpoint,
    Db,
    UserResponse,
    Hook,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Start => "start",
            NodeType::PersonJob => "person_job",
            NodeType::Condition => "condition",
            NodeType::CodeJob => "code_job",
            NodeType::ApiJob => "api_job",
            NodeType::Endpoint => "endpoint",
            NodeType::Db => "db",
            NodeType::UserResponse => "user_response",
            NodeType::Hook => "hook",
            NodeType::Other(tag) => tag,
        }
    }

    /// Fallback display label for nodes that never carried one, e.g.
    /// `person_job` becomes `Person Job`.
    pub fn display_name(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for NodeType {
    type Err = std::convert::Infallible;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag {
            "start" => NodeType::Start,
            "person_job" => NodeType::PersonJob,
            "condition" => NodeType::Condition,
            "code_job" => NodeType::CodeJob,
            "api_job" => NodeType::ApiJob,
            "endpoint" => NodeType::Endpoint,
            "db" => NodeType::Db,
            "user_response" => NodeType::UserResponse,
            "hook" => NodeType::Hook,
            other => NodeType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(tag.parse().unwrap_or(NodeType::Other(tag)))
    }
}

/// The payload type a handle accepts or produces. `Any` is a wildcard that is
/// compatible with everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Any,
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl DataType {
    pub fn is_compatible_with(self, other: DataType) -> bool {
        self == DataType::Any || other == DataType::Any || self == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleDirection {
    Input,
    Output,
}

/// Visual side hint for where a handle is drawn on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    Left,
    Right,
    Top,
    Bottom,
}

/// Semantic tag describing what kind of content an arrow transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    RawText,
    ConversationState,
    Object,
    Empty,
    Variable,
    Binary,
}

/// LLM provider tag used by persons and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmService {
    #[default]
    Openai,
    Anthropic,
    Google,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Positions are rounded to whole canvas units when written to the
    /// human-authorable formats.
    pub fn rounded(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }
}

/// A typed unit of work or state in the workflow graph.
///
/// `data` is an open field bag whose meaningful keys depend on `node_type`;
/// unknown keys are preserved opaquely and never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: Vec2,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Node {
    /// The display label carried in the data bag, if any.
    pub fn label(&self) -> Option<&str> {
        self.data.get(LABEL_KEY).and_then(Value::as_str)
    }

    /// The person executing this node, if one is assigned in the data bag.
    pub fn person_id(&self) -> Option<PersonId> {
        self.data
            .get(PERSON_KEY)
            .and_then(Value::as_str)
            .map(PersonId::from)
    }
}

/// A named, directional connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handle {
    pub id: HandleId,
    pub node_id: NodeId,
    pub label: String,
    pub direction: HandleDirection,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<HandlePosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// A directed connection from an output handle to an input handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub id: ArrowId,
    pub source: HandleId,
    pub target: HandleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// A named configuration of an LLM agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub label: String,
    pub model: String,
    #[serde(default)]
    pub service: LlmService,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<ApiKeyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f64,
    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f64,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}
fn default_frequency_penalty() -> f64 {
    DEFAULT_FREQUENCY_PENALTY
}
fn default_presence_penalty() -> f64 {
    DEFAULT_PRESENCE_PENALTY
}

impl Person {
    /// Creates a person with every sampling parameter at its documented default.
    pub fn new(id: impl Into<PersonId>, label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            model: model.into(),
            service: LlmService::default(),
            api_key_id: None,
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
        }
    }
}

/// A named reference to a secret held outside the model. The secret value
/// itself is never part of the serializable graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub label: String,
    pub service: LlmService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    pub created: String,
    pub modified: String,
}

impl DiagramMetadata {
    /// A fresh metadata block, version stamped and timestamps set to now.
    pub fn stamped() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name: None,
            description: None,
            version: DIAGRAM_SCHEMA_VERSION.to_string(),
            created: now.clone(),
            modified: now,
        }
    }
}

/// The aggregate workflow graph: the canonical in-memory representation every
/// format converter reads from and reconstructs into.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub handles: Vec<Handle>,
    pub arrows: Vec<Arrow>,
    pub persons: Vec<Person>,
    pub api_keys: Vec<ApiKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DiagramMetadata>,
}

impl Diagram {
    /// Creates a diagram with empty collections and a freshly stamped
    /// metadata block.
    pub fn empty() -> Self {
        Self {
            metadata: Some(DiagramMetadata::stamped()),
            ..Self::default()
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn handle(&self, id: &HandleId) -> Option<&Handle> {
        self.handles.iter().find(|h| &h.id == id)
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| &p.id == id)
    }

    pub fn api_key(&self, id: &ApiKeyId) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| &k.id == id)
    }

    /// All handles owned by `node_id`, in declaration order.
    pub fn handles_of(&self, node_id: &NodeId) -> impl Iterator<Item = &Handle> {
        self.handles.iter().filter(move |h| &h.node_id == node_id)
    }

    /// Checks every referential invariant of the graph, reporting the first
    /// violation found.
    ///
    /// - handle ids must be reconstructible from `(nodeId, label)` and point
    ///   at nodes present in the diagram;
    /// - no handle id may be declared twice, which also rules out two handles
    ///   sharing a `(nodeId, label)` pair;
    /// - arrows must connect an existing output handle to an existing input
    ///   handle with compatible data types (`any` is a wildcard);
    /// - person references in node data and credential references in persons
    ///   must resolve.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let mut seen = AHashSet::with_capacity(self.handles.len());
        for handle in &self.handles {
            if !seen.insert(&handle.id) {
                return Err(IntegrityError::DuplicateHandle {
                    handle_id: handle.id.clone(),
                });
            }
        }

        for handle in &self.handles {
            let Some((node_id, label)) = handle.id.split() else {
                return Err(IntegrityError::MalformedHandleId {
                    handle_id: handle.id.clone(),
                });
            };
            if node_id != handle.node_id || label != handle.label {
                return Err(IntegrityError::MalformedHandleId {
                    handle_id: handle.id.clone(),
                });
            }
            if self.node(&handle.node_id).is_none() {
                return Err(IntegrityError::MissingNode {
                    handle_id: handle.id.clone(),
                    node_id: handle.node_id.clone(),
                });
            }
        }

        for arrow in &self.arrows {
            let source = self.handle(&arrow.source).ok_or_else(|| {
                IntegrityError::MissingHandle {
                    arrow_id: arrow.id.clone(),
                    handle_id: arrow.source.clone(),
                }
            })?;
            let target = self.handle(&arrow.target).ok_or_else(|| {
                IntegrityError::MissingHandle {
                    arrow_id: arrow.id.clone(),
                    handle_id: arrow.target.clone(),
                }
            })?;
            if source.direction != HandleDirection::Output {
                return Err(IntegrityError::WrongDirection {
                    arrow_id: arrow.id.clone(),
                    handle_id: arrow.source.clone(),
                    expected: HandleDirection::Output,
                });
            }
            if target.direction != HandleDirection::Input {
                return Err(IntegrityError::WrongDirection {
                    arrow_id: arrow.id.clone(),
                    handle_id: arrow.target.clone(),
                    expected: HandleDirection::Input,
                });
            }
            if !source.data_type.is_compatible_with(target.data_type) {
                return Err(IntegrityError::IncompatibleDataTypes {
                    arrow_id: arrow.id.clone(),
                    source_type: source.data_type,
                    target_type: target.data_type,
                });
            }
        }

        for node in &self.nodes {
            if let Some(person_id) = node.person_id() {
                if self.person(&person_id).is_none() {
                    return Err(IntegrityError::MissingPerson {
                        node_id: node.id.clone(),
                        person_id,
                    });
                }
            }
        }

        for person in &self.persons {
            if let Some(api_key_id) = &person.api_key_id {
                if self.api_key(api_key_id).is_none() {
                    return Err(IntegrityError::MissingApiKey {
                        person_id: person.id.clone(),
                        api_key_id: api_key_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
