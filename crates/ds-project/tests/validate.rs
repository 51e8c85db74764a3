use ds_project::schema::*;
use ds_project::{ValidationError, load_yaml, validate_project};

fn sample() -> ProjectDef {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../projects/seven_assembly_core.yaml");
    load_yaml(&path).unwrap()
}

#[test]
fn rejects_newer_version() {
    let mut project = sample();
    project.version = 2;
    assert_eq!(
        validate_project(&project),
        Err(ValidationError::UnsupportedVersion { version: 2 })
    );
}

#[test]
fn rejects_duplicate_names_and_positions() {
    let mut project = sample();
    project.assemblies[1].name = project.assemblies[0].name.clone();
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::DuplicateId { context, .. }) if context == "assemblies"
    ));

    let mut project = sample();
    project.assemblies[1].position = project.assemblies[0].position;
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::DuplicateId { context, .. }) if context == "assembly positions"
    ));
}

#[test]
fn rejects_unknown_type() {
    let mut project = sample();
    project.assemblies[2].type_id = "blanket".to_string();
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::MissingReference { id, .. }) if id == "blanket"
    ));
}

#[test]
fn rejects_bad_numbers() {
    let mut project = sample();
    project.assemblies[0].flow_kg_s = 0.0;
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::InvalidValue { .. })
    ));

    let mut project = sample();
    project.length_m = -1.0;
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::InvalidValue { field, .. }) if field == "length_m"
    ));

    let mut project = sample();
    project.solver.duct_relaxation = 1.5;
    assert!(validate_project(&project).is_err());
}

#[test]
fn rejects_unknown_correlation_set() {
    let mut project = sample();
    project.solver.correlation_set = "upwind".to_string();
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::InvalidValue { field, .. }) if field == "solver.correlation_set"
    ));
}

#[test]
fn rejects_empty_core() {
    let mut project = sample();
    project.assemblies.clear();
    assert!(validate_project(&project).is_err());
}
