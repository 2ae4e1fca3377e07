//! Unit tests for the model vocabulary, registry and handle rules.
mod common;

use diaflow::convert::DiagramFormat;
use diaflow::error::IntegrityError;
use diaflow::handles;
use diaflow::model::*;
use diaflow::registry;

#[test]
fn test_node_type_tags_round_trip() {
    assert_eq!("person_job".parse::<NodeType>().unwrap(), NodeType::PersonJob);
    assert_eq!(NodeType::PersonJob.to_string(), "person_job");
    assert_eq!(NodeType::Start.display_name(), "Start");
    assert_eq!(NodeType::PersonJob.display_name(), "Person Job");
}

#[test]
fn test_unknown_node_type_tags_are_carried_through() {
    let parsed: NodeType = "shiny_new_node".parse().unwrap();
    assert_eq!(parsed, NodeType::Other("shiny_new_node".to_string()));
    assert_eq!(parsed.to_string(), "shiny_new_node");
    assert!(registry::spec_of(&parsed).is_none());
}

#[test]
fn test_handle_id_compose_and_split() {
    let node_id = NodeId::new("node_7");
    let handle_id = HandleId::compose(&node_id, "output");
    assert_eq!(handle_id.as_str(), "node_7:output");

    let (split_node, label) = handle_id.split().unwrap();
    assert_eq!(split_node, node_id);
    assert_eq!(label, "output");

    assert!(HandleId::new("no-separator").split().is_none());
}

#[test]
fn test_data_type_compatibility() {
    assert!(DataType::Any.is_compatible_with(DataType::Number));
    assert!(DataType::String.is_compatible_with(DataType::Any));
    assert!(DataType::Object.is_compatible_with(DataType::Object));
    assert!(!DataType::String.is_compatible_with(DataType::Number));
}

#[test]
fn test_registry_layouts() {
    let start = registry::default_handle_templates(&NodeType::Start);
    assert_eq!(start.len(), 1);
    assert_eq!(start[0].label, "output");
    assert_eq!(start[0].direction, HandleDirection::Output);

    let person_job = registry::default_handle_templates(&NodeType::PersonJob);
    let first = person_job.iter().find(|t| t.label == "first").unwrap();
    assert_eq!(first.max_connections, Some(1));

    let condition = registry::default_handle_templates(&NodeType::Condition);
    let outputs: Vec<&str> = condition
        .iter()
        .filter(|t| t.direction == HandleDirection::Output)
        .map(|t| t.label)
        .collect();
    assert_eq!(outputs, vec!["true", "false"]);

    assert_eq!(
        registry::default_data(&NodeType::CodeJob).get("language"),
        Some(&serde_json::Value::from("python"))
    );
}

#[test]
fn test_backfill_skips_declared_handles() {
    let node_id = NodeId::new("node_0");
    let mut handles_vec = vec![Handle {
        id: HandleId::compose(&node_id, "output"),
        node_id: node_id.clone(),
        label: "output".to_string(),
        direction: HandleDirection::Output,
        data_type: DataType::String,
        position: Some(HandlePosition::Bottom),
        max_connections: None,
    }];
    handles::backfill_defaults(&mut handles_vec, &node_id, &NodeType::Start);

    // The declared handle shadows the default of the same name.
    assert_eq!(handles_vec.len(), 1);
    assert_eq!(handles_vec[0].data_type, DataType::String);
}

#[test]
fn test_default_output_prefers_conventional_names() {
    let node_id = NodeId::new("node_0");
    let make = |label: &str| Handle {
        id: HandleId::compose(&node_id, label),
        node_id: node_id.clone(),
        label: label.to_string(),
        direction: HandleDirection::Output,
        data_type: DataType::Any,
        position: Some(HandlePosition::Right),
        max_connections: None,
    };

    // "output" wins even when declared after another output.
    let handles_vec = vec![make("errors"), make("output")];
    assert_eq!(
        handles::default_output(&handles_vec, &node_id).unwrap().label,
        "output"
    );

    // Without a conventional name, declaration order decides.
    let handles_vec = vec![make("true"), make("false")];
    assert_eq!(
        handles::default_output(&handles_vec, &node_id).unwrap().label,
        "true"
    );

    assert!(handles::default_output(&[], &node_id).is_none());
}

#[test]
fn test_is_default_compares_the_full_template() {
    let node_id = NodeId::new("node_0");
    let mut handle = handles::defaults_for(&node_id, &NodeType::Start)
        .into_iter()
        .next()
        .unwrap();
    assert!(handles::is_default(&handle, &NodeType::Start));

    handle.data_type = DataType::String;
    assert!(!handles::is_default(&handle, &NodeType::Start));
}

#[test]
fn test_format_detection() {
    assert_eq!(
        DiagramFormat::detect("version: reduced\nnodes: {}\n"),
        Some(DiagramFormat::Reduced)
    );
    assert_eq!(
        DiagramFormat::detect("version: readable\nworkflow: {}\n"),
        Some(DiagramFormat::Readable)
    );
    assert_eq!(
        DiagramFormat::detect(r#"{"version": "native", "nodes": []}"#),
        Some(DiagramFormat::Native)
    );
    assert_eq!(DiagramFormat::detect("version: carrier-pigeon\n"), None);
    assert_eq!(DiagramFormat::detect("not: a: diagram"), None);
}

#[test]
fn test_format_tags_parse_back() {
    for format in [
        DiagramFormat::Reduced,
        DiagramFormat::Readable,
        DiagramFormat::Native,
    ] {
        assert_eq!(format.version_tag().parse(), Ok(format));
    }
}

#[test]
fn test_vec2_rounding() {
    let position = Vec2::new(100.4, -7.6);
    let rounded = position.rounded();
    assert_eq!(rounded.x, 100.0);
    assert_eq!(rounded.y, -8.0);
}

#[test]
fn test_empty_diagram_passes_integrity() {
    assert!(Diagram::empty().check_integrity().is_ok());
}

#[test]
fn test_integrity_error_display() {
    let err = IntegrityError::IncompatibleDataTypes {
        arrow_id: ArrowId::new("arrow_3"),
        source_type: DataType::String,
        target_type: DataType::Number,
    };
    assert!(err.to_string().contains("arrow_3"));
    assert!(err.to_string().contains("String"));
    assert!(err.to_string().contains("Number"));
    // The variant carries data types, not a wrapped error to chain to.
    assert!(std::error::Error::source(&err).is_none());
}
