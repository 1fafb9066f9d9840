use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sdkgen-config"))
}

fn write_workflow(root: &Path, contents: &str) {
    let dir = root.join(".speakeasy");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("workflow.yaml"), contents).unwrap();
}

#[test]
fn validate_reports_sources_and_targets() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("openapi.yaml"), "openapi: 3.1.0\n")?;
    write_workflow(
        temp.path(),
        r#"workflowVersion: 1.0.0
sources:
  api:
    inputs:
      - location: ./openapi.yaml
targets:
  ts:
    target: typescript
    source: api
"#,
    );

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["workflow", "validate"]);

    cmd.assert()
        .success()
        .stdout(contains("Workflow OK"))
        .stdout(contains("ts (typescript) <- api"));
    Ok(())
}

#[test]
fn validate_rejects_source_cycles_with_data_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write_workflow(
        temp.path(),
        r#"workflowVersion: 1.0.0
sources:
  a:
    inputs:
      - location: source:b
  b:
    inputs:
      - location: source:a
"#,
    );

    let mut cmd = cli();
    cmd.args(["workflow", "validate", "--dir", temp.path().to_str().unwrap()]);

    cmd.assert()
        .failure()
        .code(65)
        .stderr(contains("circular source dependency detected:"));
    Ok(())
}

#[test]
fn validate_rejects_unknown_workflow_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write_workflow(temp.path(), "workflowVersion: 9.9.9\ntargets: {}\n");

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["workflow", "validate"]);

    cmd.assert().failure().code(78);
    Ok(())
}

#[test]
fn validate_without_workflow_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["workflow", "validate"]);

    cmd.assert()
        .failure()
        .code(64)
        .stderr(contains("workflow.yaml"));
    Ok(())
}

#[test]
fn migrate_adds_code_samples_registry() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    write_workflow(
        temp.path(),
        r#"workflowVersion: 1.0.0
sources:
  api:
    inputs:
      - location: ./openapi.yaml
    registry:
      location: registry.speakeasyapi.dev/acme/prod/api
targets:
  typescript:
    target: typescript
    source: api
"#,
    );

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["workflow", "migrate"]);
    cmd.assert().success().stdout(contains("Migrated workflow"));

    let migrated = fs::read_to_string(temp.path().join(".speakeasy/workflow.yaml"))?;
    assert!(migrated.contains("registry.speakeasyapi.dev/acme/prod/api-typescript-code-samples"));
    assert!(migrated.contains("Typescript (SDK)"));

    let mut again = cli();
    again.current_dir(temp.path()).args(["workflow", "migrate"]);
    again.assert().success().stdout(contains("already up to date"));
    Ok(())
}

#[test]
fn schema_is_draft_2020_12() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cli();
    cmd.arg("schema");

    cmd.assert()
        .success()
        .stdout(contains("https://json-schema.org/draft/2020-12/schema"))
        .stdout(contains("workflowVersion"));
    Ok(())
}

#[test]
fn migrate_rewrites_gen_workspace_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let gen_dir = temp.path().join(".gen");
    fs::create_dir_all(&gen_dir)?;
    fs::write(
        gen_dir.join("workflow.yaml"),
        r#"workflowVersion: 1.0.0
sources:
  api:
    inputs:
      - location: ./openapi.yaml
    registry:
      location: registry.speakeasyapi.dev/acme/prod/api
targets:
  go:
    target: go
    source: api
"#,
    )?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["workflow", "migrate"]);
    cmd.assert().code(0).stdout(contains(".gen"));

    let migrated = fs::read_to_string(gen_dir.join("workflow.yaml"))?;
    assert!(migrated.contains("registry.speakeasyapi.dev/acme/prod/api-go-code-samples"));
    assert!(!temp.path().join(".speakeasy").exists());

    let mut again = cli();
    again
        .current_dir(temp.path())
        .args(["--json", "workflow", "migrate"]);
    again.assert().code(0).stdout(contains("\"changed\":false"));
    Ok(())
}

#[test]
fn schema_output_matches_committed_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    let mut cmd = cli();
    cmd.current_dir(temp.path())
        .args(["schema", "--output", "workflow.schema.json"]);
    cmd.assert().success().stdout(contains("Wrote workflow schema"));

    let written = fs::read_to_string(temp.path().join("workflow.schema.json"))?;
    assert_eq!(written, sdkgen_config::COMMITTED_WORKFLOW_SCHEMA);
    Ok(())
}
