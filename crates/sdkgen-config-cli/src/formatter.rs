use std::process::ExitCode;

use serde_json::json;

use crate::commands::CommandResult;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as human-readable text or a single JSON line.
///
/// Every command that produces a result succeeded; failures surface as `CliError`.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result)?,
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::SUCCESS)
}

fn print_text(result: &CommandResult) -> Result<(), CliError> {
    match result {
        CommandResult::WorkflowValidated {
            path,
            sources,
            targets,
        } => {
            println!("Workflow OK: {path}");
            println!("Sources ({}):", sources.len());
            for source in sources {
                println!("  - {source}");
            }
            println!("Targets ({}):", targets.len());
            for target in targets {
                println!("  - {} ({}) <- {}", target.id, target.target, target.source);
            }
        }
        CommandResult::WorkflowMigrated { path, changed } => {
            if *changed {
                println!("Migrated workflow at {path}");
            } else {
                println!("Workflow already up to date at {path}");
            }
        }
        CommandResult::GenConfigLoaded { summary } => {
            if summary.created {
                println!("Created {} with defaults", summary.path);
            } else if summary.upgraded {
                println!(
                    "Upgraded {} to configVersion {}",
                    summary.path, summary.config_version
                );
            } else {
                println!(
                    "Loaded {} (configVersion {})",
                    summary.path, summary.config_version
                );
            }
            if !summary.languages.is_empty() {
                println!("Languages: {}", summary.languages.join(", "));
            }
            if !summary.new_languages.is_empty() {
                println!("Defaulted: {}", summary.new_languages.join(", "));
            }
        }
        CommandResult::LockfileInspected { summary } => {
            println!(
                "Lockfile {} (id {}): {} tracked files",
                summary.path, summary.id, summary.tracked_files
            );
            match (summary.populated, summary.written) {
                (0, _) => println!("All tracked files have checksums"),
                (count, true) => println!("Populated and saved {count} checksums"),
                (count, false) => println!("{count} checksums missing; rerun with --write to save"),
            }
        }
        CommandResult::LintLoaded {
            path,
            default_ruleset,
            rulesets,
        } => {
            println!("Lint OK: {path}");
            if let Some(name) = default_ruleset {
                println!("Default ruleset: {name}");
            }
            for ruleset in rulesets {
                println!("  - {ruleset}");
            }
        }
        CommandResult::TestsLoaded { path, operations } => {
            let total: usize = operations.iter().map(|op| op.tests.len()).sum();
            println!("Tests OK: {path} ({total} tests)");
            for operation in operations {
                println!("  {}:", operation.operation);
                for name in &operation.tests {
                    println!("    - {name}");
                }
            }
        }
        CommandResult::GitignoreEnsured { path, changed } => {
            if *changed {
                println!("Updated {path}");
            } else {
                println!("{path} already up to date");
            }
        }
        CommandResult::Schema { schema } => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        CommandResult::SchemaWritten { path } => {
            println!("Wrote workflow schema to {path}");
        }
    }
    Ok(())
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
