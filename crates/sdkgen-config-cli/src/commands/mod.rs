use serde::Serialize;

pub mod fixtures;
pub mod genconfig;
pub mod gitignore;
pub mod lint;
pub mod lockfile;
pub mod schema;
pub mod workflow;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    WorkflowValidated {
        path: String,
        sources: Vec<String>,
        targets: Vec<workflow::TargetSummary>,
    },
    WorkflowMigrated {
        path: String,
        changed: bool,
    },
    GenConfigLoaded {
        summary: genconfig::GenConfigSummary,
    },
    LockfileInspected {
        summary: lockfile::LockfileSummary,
    },
    LintLoaded {
        path: String,
        default_ruleset: Option<String>,
        rulesets: Vec<String>,
    },
    TestsLoaded {
        path: String,
        operations: Vec<fixtures::OperationSummary>,
    },
    GitignoreEnsured {
        path: String,
        changed: bool,
    },
    Schema {
        schema: serde_json::Value,
    },
    SchemaWritten {
        path: String,
    },
}
