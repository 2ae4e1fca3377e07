//! Common test utilities for building diagrams.
use diaflow::handles;
use diaflow::model::*;
use diaflow::registry;
use serde_json::Value;

/// Creates a node whose data bag carries its label plus the registry defaults
/// for its type, matching what an import would reconstruct.
#[allow(dead_code)]
pub fn node(id: &str, node_type: NodeType, label: &str, x: f64, y: f64) -> Node {
    let mut data = registry::default_data(&node_type);
    data.insert(LABEL_KEY.to_string(), Value::from(label));
    Node {
        id: NodeId::new(id),
        node_type,
        position: Vec2::new(x, y),
        data,
    }
}

/// Creates an arrow between two named handles.
#[allow(dead_code)]
pub fn connect(index: usize, source: &Node, source_handle: &str, target: &Node, target_handle: &str) -> Arrow {
    Arrow {
        id: ArrowId::new(format!("arrow_{index}")),
        source: HandleId::compose(&source.id, source_handle),
        target: HandleId::compose(&target.id, target_handle),
        content_type: None,
        label: None,
        data: None,
    }
}

/// Instantiates the full default handle set for every node given.
#[allow(dead_code)]
pub fn default_handles(nodes: &[Node]) -> Vec<Handle> {
    let mut handles = Vec::new();
    for node in nodes {
        handles::backfill_defaults(&mut handles, &node.id, &node.node_type);
    }
    handles
}

/// A minimal two-node workflow: `Start -> Done`.
#[allow(dead_code)]
pub fn create_linear_diagram() -> Diagram {
    let start = node("node_0", NodeType::Start, "Start", 0.0, 0.0);
    let done = node("node_1", NodeType::Endpoint, "Done", 300.0, 0.0);
    let arrows = vec![connect(0, &start, "output", &done, "input")];
    let nodes = vec![start, done];
    let handles = default_handles(&nodes);
    Diagram {
        nodes,
        handles,
        arrows,
        persons: Vec::new(),
        api_keys: Vec::new(),
        metadata: Some(DiagramMetadata::stamped()),
    }
}

/// A workflow with an agent: `Start -> Ask` where `Ask` is a person_job node
/// executed by a person backed by a declared credential.
#[allow(dead_code)]
pub fn create_person_diagram() -> Diagram {
    let api_key = ApiKey {
        id: ApiKeyId::new("apikey_0"),
        label: "Main Key".to_string(),
        service: LlmService::Openai,
    };
    let mut person = Person::new("person_0", "Assistant", "gpt-4o");
    person.api_key_id = Some(api_key.id.clone());

    let start = node("node_0", NodeType::Start, "Start", 0.0, 0.0);
    let mut ask = node("node_1", NodeType::PersonJob, "Ask", 300.0, 0.0);
    ask.data.insert(
        PERSON_KEY.to_string(),
        Value::from(person.id.as_str()),
    );
    ask.data
        .insert("default_prompt".to_string(), Value::from("Summarize {{input}}"));

    let mut arrow = connect(0, &start, "output", &ask, "first");
    arrow.content_type = Some(ContentType::RawText);
    let nodes = vec![start, ask];
    let handles = default_handles(&nodes);
    Diagram {
        nodes,
        handles,
        arrows: vec![arrow],
        persons: vec![person],
        api_keys: vec![api_key],
        metadata: Some(DiagramMetadata::stamped()),
    }
}

/// A branching workflow: `Start -> Check` with the two condition branches
/// feeding separate endpoints.
#[allow(dead_code)]
pub fn create_condition_diagram() -> Diagram {
    let start = node("node_0", NodeType::Start, "Start", 0.0, 0.0);
    let check = node("node_1", NodeType::Condition, "Check", 250.0, 0.0);
    let yes = node("node_2", NodeType::Endpoint, "Yes", 500.0, -100.0);
    let no = node("node_3", NodeType::Endpoint, "No", 500.0, 100.0);
    let arrows = vec![
        connect(0, &start, "output", &check, "input"),
        connect(1, &check, "true", &yes, "input"),
        connect(2, &check, "false", &no, "input"),
    ];
    let nodes = vec![start, check, yes, no];
    let handles = default_handles(&nodes);
    Diagram {
        nodes,
        handles,
        arrows,
        persons: Vec::new(),
        api_keys: Vec::new(),
        metadata: Some(DiagramMetadata::stamped()),
    }
}

/// A workflow whose code node carries a non-default `errors` output handle in
/// addition to its canonical layout.
#[allow(dead_code)]
pub fn create_custom_handle_diagram() -> Diagram {
    let start = node("node_0", NodeType::Start, "Start", 0.0, 0.0);
    let run = node("node_1", NodeType::CodeJob, "Run", 300.0, 0.0);
    let done = node("node_2", NodeType::Endpoint, "Done", 600.0, 0.0);
    let arrows = vec![
        connect(0, &start, "output", &run, "input"),
        connect(1, &run, "output", &done, "input"),
    ];
    let nodes = vec![start, run, done];
    let mut handles = default_handles(&nodes);
    handles.push(Handle {
        id: HandleId::compose(&nodes[1].id, "errors"),
        node_id: nodes[1].id.clone(),
        label: "errors".to_string(),
        direction: HandleDirection::Output,
        data_type: DataType::String,
        position: Some(HandlePosition::Bottom),
        max_connections: None,
    });
    Diagram {
        nodes,
        handles,
        arrows,
        persons: Vec::new(),
        api_keys: Vec::new(),
        metadata: Some(DiagramMetadata::stamped()),
    }
}
