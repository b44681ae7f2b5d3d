use hk_project::{ProjectError, ValidationError, from_json_str, from_yaml_str};

fn validation_error(yaml: &str) -> ValidationError {
    match from_yaml_str(yaml) {
        Err(ProjectError::Validation(err)) => err,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn minimal_json_config() {
    let config = from_json_str(
        r#"{"simulationParams": {"totalTime": 0.0, "dt": 1.0}, "components": {}}"#,
    )
    .unwrap();
    assert_eq!(config.total_ticks().unwrap(), 0);
}

#[test]
fn partial_final_step_rounds_up() {
    let config = from_yaml_str("simulationParams: { totalTime: 2.5, dt: 1.0 }").unwrap();
    assert_eq!(config.total_ticks().unwrap(), 3);
    let config = from_yaml_str("simulationParams: { totalTime: 1.0, dt: 0.1 }").unwrap();
    assert_eq!(config.total_ticks().unwrap(), 10);
}

#[test]
fn missing_simulation_params_is_a_parse_error() {
    let err = from_yaml_str("components: {}").unwrap_err();
    assert!(matches!(err, ProjectError::Yaml(_)));
}

#[test]
fn rejects_bad_time_step() {
    let err = validation_error("simulationParams: { totalTime: 1.0, dt: 0.0 }");
    assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "simulationParams.dt"));

    let err = validation_error("simulationParams: { totalTime: -1.0, dt: 1.0 }");
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}

#[test]
fn rejects_malformed_and_dangling_references() {
    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: constant, properties: { value: 1.0 } }
connections:
  - { source: \"A\", target: \"B.input\" }
",
    );
    assert!(matches!(err, ValidationError::InvalidValue { .. }));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: constant, properties: { value: 1.0 } }
connections:
  - { source: \"A.output\", target: \"B.input\" }
",
    );
    assert_eq!(
        err,
        ValidationError::MissingReference {
            id: "B".to_string(),
            context: "connections[0].target".to_string()
        }
    );
}

#[test]
fn rejects_bad_ids_and_orders() {
    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  \"has space\": { type: dummy }
",
    );
    assert!(matches!(err, ValidationError::InvalidValue { .. }));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: dummy }
executionOrder: [A, [A]]
",
    );
    assert!(matches!(err, ValidationError::DuplicateId { .. }));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: dummy }
executionOrder: [A, Z]
",
    );
    assert!(matches!(err, ValidationError::MissingReference { .. }));
}

#[test]
fn rejects_bad_events_datasets_and_logger() {
    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  A: { type: constant, properties: { value: 1.0 } }
events:
  - { time: 0.5, target: \"Q.value\", value: 2.0 }
",
    );
    assert!(matches!(err, ValidationError::MissingReference { .. }));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
components:
  s: { type: series, properties: { dataset: missing } }
",
    );
    assert!(matches!(err, ValidationError::MissingReference { ref id, .. } if id == "missing"));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
datasets: { empty: [] }
",
    );
    assert!(matches!(err, ValidationError::InvalidValue { .. }));

    let err = validation_error(
        "
simulationParams: { totalTime: 1.0, dt: 1.0 }
loggerConfig: { recordEvery: 0 }
",
    );
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}
