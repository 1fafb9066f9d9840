use clap::{Arg, ArgAction, ArgMatches, Command};
use sdkgen_config::DEFAULT_SUPPORTED_TARGETS;
use sdkgen_config::api;
use serde::Serialize;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util::display_path;

#[derive(Clone, Debug, Serialize)]
pub struct TargetSummary {
    pub id: String,
    pub target: String,
    pub source: String,
}

pub fn command() -> Command {
    Command::new("workflow")
        .about("Work with .speakeasy/workflow.yaml")
        .subcommand_required(true)
        .subcommand(
            Command::new("validate")
                .about("Load the workflow with local overrides and validate it")
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_name("LANG")
                        .action(ArgAction::Append)
                        .help("Restrict the supported target languages. Repeatable."),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Add code-samples registry locations to registry-tracked targets"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    match matches.subcommand() {
        Some(("validate", sub)) => validate(session, sub),
        Some(("migrate", _)) => migrate(session),
        _ => Err(CliError::new("missing workflow command", ExitStatus::Usage)),
    }
}

fn validate(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let requested: Vec<&str> = matches
        .get_many::<String>("target")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();
    let supported = if requested.is_empty() {
        DEFAULT_SUPPORTED_TARGETS.to_vec()
    } else {
        requested
    };

    let (workflow, path) = api::load_valid_workflow(&session.env, &session.working_dir, &supported)?;
    let targets = workflow
        .targets
        .iter()
        .map(|(id, target)| TargetSummary {
            id: id.clone(),
            target: target.target.clone(),
            source: target.source.clone(),
        })
        .collect();

    Ok(CommandResult::WorkflowValidated {
        path: display_path(&path),
        sources: workflow.sources.keys().cloned().collect(),
        targets,
    })
}

fn migrate(session: &CliSession) -> Result<CommandResult, CliError> {
    let (path, changed) = api::migrate_workflow(&session.env, &session.working_dir)?;
    Ok(CommandResult::WorkflowMigrated {
        path: display_path(&path),
        changed,
    })
}
