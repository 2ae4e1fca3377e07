//! Tests for the identifier-preserving JSON dialect.
mod common;

use common::*;
use diaflow::convert::{DiagramConverter, NativeJsonConverter};
use diaflow::error::{ImportError, IntegrityError};
use diaflow::model::*;

#[test]
fn test_round_trip_is_identity() {
    let converter = NativeJsonConverter;
    let original = create_person_diagram();
    let text = converter.serialize(&original).unwrap();
    let diagram = converter.deserialize(&text).unwrap();

    // Unlike the label-keyed dialects, raw ids and metadata survive verbatim.
    assert_eq!(diagram, original);
}

#[test]
fn test_ids_are_preserved() {
    let converter = NativeJsonConverter;
    let text = converter.serialize(&create_linear_diagram()).unwrap();
    let diagram = converter.deserialize(&text).unwrap();

    assert!(diagram.node(&NodeId::new("node_0")).is_some());
    assert!(diagram.node(&NodeId::new("node_1")).is_some());
    assert_eq!(diagram.arrows[0].id, ArrowId::new("arrow_0"));
}

#[test]
fn test_missing_arrow_handle_is_rejected() {
    let mut diagram = create_linear_diagram();
    diagram.arrows[0].source = HandleId::new("node_0:nonexistent");
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::MissingHandle { .. })
    ));
}

#[test]
fn test_wrong_arrow_direction_is_rejected() {
    let mut diagram = create_linear_diagram();
    // Point the arrow source at the endpoint's input handle.
    diagram.arrows[0].source = HandleId::compose(&NodeId::new("node_1"), "input");
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    match err {
        ImportError::Integrity(IntegrityError::WrongDirection { expected, .. }) => {
            assert_eq!(expected, HandleDirection::Output);
        }
        other => panic!("expected WrongDirection, got: {other}"),
    }
}

#[test]
fn test_incompatible_data_types_are_rejected() {
    let mut diagram = create_linear_diagram();
    for handle in &mut diagram.handles {
        if handle.label == "output" {
            handle.data_type = DataType::String;
        } else {
            handle.data_type = DataType::Number;
        }
    }
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::IncompatibleDataTypes { .. })
    ));
}

#[test]
fn test_any_is_a_wildcard() {
    let mut diagram = create_linear_diagram();
    for handle in &mut diagram.handles {
        if handle.label == "input" {
            handle.data_type = DataType::Object;
        }
    }
    // Source stays `any`, which is compatible with everything.
    let text = NativeJsonConverter.serialize(&diagram).unwrap();
    assert!(NativeJsonConverter.deserialize(&text).is_ok());
}

#[test]
fn test_broken_credential_reference_is_a_hard_error() {
    let mut diagram = create_person_diagram();
    diagram.api_keys.clear();
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::MissingApiKey { .. })
    ));
}

#[test]
fn test_broken_person_reference_is_rejected() {
    let mut diagram = create_person_diagram();
    diagram.persons.clear();
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::MissingPerson { .. })
    ));
}

#[test]
fn test_handle_id_must_match_its_fields() {
    let mut diagram = create_linear_diagram();
    diagram.handles[0].id = HandleId::new("somewhere_else:output");
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::MalformedHandleId { .. })
    ));
}

#[test]
fn test_duplicate_handles_are_rejected() {
    let mut diagram = create_linear_diagram();
    let duplicate = diagram.handles[0].clone();
    diagram.handles.push(duplicate);
    let text = NativeJsonConverter.serialize(&diagram).unwrap();

    let err = NativeJsonConverter.deserialize(&text).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Integrity(IntegrityError::DuplicateHandle { .. })
    ));
}

#[test]
fn test_missing_version_is_rejected() {
    let err = NativeJsonConverter
        .deserialize(r#"{"nodes": []}"#)
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingVersion));
}

#[test]
fn test_invalid_json_is_a_syntax_error() {
    let err = NativeJsonConverter.deserialize("version: native").unwrap_err();
    assert!(matches!(err, ImportError::Syntax(_)));
}
