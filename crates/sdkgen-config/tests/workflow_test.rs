use sdkgen_config::api::{load_valid_workflow, load_workflow, save_workflow};
use sdkgen_config::workflow::validate_source_dependencies;
use sdkgen_config::{
    ConfigEnv, ConfigError, DEFAULT_SUPPORTED_TARGETS, Workflow, checksum_bytes,
    parse_registry_location,
};
use std::fs;
use std::path::Path;

fn write_workspace_file(root: &Path, name: &str, contents: &str) {
    let dir = root.join(".speakeasy");
    fs::create_dir_all(&dir).expect("create .speakeasy");
    fs::write(dir.join(name), contents).expect("write workspace file");
}

const BASE: &str = r#"workflowVersion: 1.0.0
speakeasyVersion: latest
sources:
  testSource:
    inputs:
      - location: ./openapi.yaml
    registry:
      location: reg/x/y/api
targets:
  typescript:
    target: typescript
    source: testSource
    codeSamples:
      output: codeSamples.yaml
      blocking: false
"#;

const LOCAL: &str = r#"workflowVersion: 1.0.0
sources:
  testSource:
    registry:
      location: OVERRIDE
targets:
  typescript:
    target: typescript
    source: testSource
    codeSamples:
      blocking: true
"#;

#[test]
fn local_overrides_are_merged_without_rewriting_the_local_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_workspace_file(dir.path(), "workflow.yaml", BASE);
    write_workspace_file(dir.path(), "workflow.local.yaml", LOCAL);
    let nested = dir.path().join("packages/sdk");
    fs::create_dir_all(&nested).unwrap();

    let (workflow, path) = load_workflow(&ConfigEnv::default(), &nested).unwrap();
    assert_eq!(path, dir.path().join(".speakeasy/workflow.yaml"));

    let source = &workflow.sources["testSource"];
    assert_eq!(source.registry.as_ref().unwrap().location, "OVERRIDE");
    assert_eq!(source.inputs[0].location, "./openapi.yaml");

    let samples = workflow.targets["typescript"].code_samples.as_ref().unwrap();
    assert_eq!(samples.blocking, Some(true));
    assert_eq!(samples.output.as_deref(), Some("codeSamples.yaml"));

    let local = fs::read_to_string(dir.path().join(".speakeasy/workflow.local.yaml")).unwrap();
    assert_eq!(local, LOCAL);
    let base = fs::read_to_string(dir.path().join(".speakeasy/workflow.yaml")).unwrap();
    assert_eq!(base, BASE);
}

#[test]
fn cyclic_sources_fail_validation() {
    let workflow = Workflow::from_yaml(
        r#"workflowVersion: 1.0.0
sources:
  a:
    inputs:
      - location: source:b
  b:
    inputs:
      - location: source:a
"#,
    )
    .unwrap();

    let err = validate_source_dependencies(&workflow.sources).unwrap_err();
    assert!(matches!(err, ConfigError::DependencyCycle(_)));
    let message = err.to_string();
    assert!(message.contains("circular source dependency detected:"));
    assert!(message.contains("a -> b -> a") || message.contains("b -> a -> b"));
}

#[test]
fn validated_workflow_resolves_local_target_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("openapi.yaml"), "openapi: 3.1.0\n").unwrap();
    write_workspace_file(
        dir.path(),
        "workflow.yaml",
        "workflowVersion: 1.0.0\ntargets:\n  go:\n    target: go\n    source: openapi.yaml\n",
    );

    let env = ConfigEnv::default();
    load_valid_workflow(&env, dir.path(), DEFAULT_SUPPORTED_TARGETS).unwrap();

    fs::remove_file(dir.path().join("openapi.yaml")).unwrap();
    let err = load_valid_workflow(&env, dir.path(), DEFAULT_SUPPORTED_TARGETS).unwrap_err();
    assert!(err.to_string().contains("does not exist as a local file"));
}

#[test]
fn saved_workflow_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workflow = Workflow::from_yaml(BASE).unwrap();
    let env = ConfigEnv::default();

    let path = save_workflow(&env, dir.path(), &workflow).unwrap();
    assert_eq!(path, dir.path().join(".speakeasy/workflow.yaml"));

    let (loaded, _) = load_workflow(&env, dir.path()).unwrap();
    assert_eq!(loaded, workflow);
}

#[test]
fn missing_workflow_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_workflow(&ConfigEnv::default(), dir.path()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn registry_locations_parse_references() {
    let digest = parse_registry_location("registry.speakeasyapi.dev/acme/prod/sdk@sha256:deadbeef")
        .unwrap();
    assert_eq!(digest.organization_slug, "acme");
    assert_eq!(digest.workspace_slug, "prod");
    assert_eq!(digest.namespace_name, "sdk");
    assert_eq!(digest.reference, "sha256:deadbeef");

    let tagged = parse_registry_location("registry.speakeasyapi.dev/acme/prod/sdk:main").unwrap();
    assert_eq!(tagged.reference, "main");

    let bare = parse_registry_location("https://registry.speakeasyapi.dev/acme/prod/sdk").unwrap();
    assert_eq!(bare.reference, "latest");
    assert_eq!(bare.namespace_id(), "acme/prod/sdk");
}

#[test]
fn checksums_ignore_line_endings_and_bom() {
    let expected = checksum_bytes("hello\nworld\n");
    assert!(expected.starts_with("sha1:"));
    assert_eq!(checksum_bytes("hello\r\nworld\n"), expected);
    assert_eq!(checksum_bytes("hello\nworld"), expected);
    assert_eq!(checksum_bytes("\u{FEFF}hello\nworld\n"), expected);
    assert_ne!(checksum_bytes("hello\nworld\n\n"), expected);
}
