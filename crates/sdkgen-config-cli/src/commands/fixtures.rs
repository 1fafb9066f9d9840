use clap::{ArgMatches, Command};
use sdkgen_config::api;
use serde::Serialize;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

#[derive(Clone, Debug, Serialize)]
pub struct OperationSummary {
    pub operation: String,
    pub tests: Vec<String>,
}

pub fn command() -> Command {
    Command::new("tests").about("Load and validate .speakeasy/tests.yaml")
}

pub fn run(session: &CliSession, _matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let (tests, path) = api::load_tests(&session.env, &session.working_dir)?;
    let operations = tests
        .tests
        .iter()
        .map(|(operation, tests)| OperationSummary {
            operation: operation.clone(),
            tests: tests.iter().map(|test| test.name.clone()).collect(),
        })
        .collect();

    Ok(CommandResult::TestsLoaded {
        path: display_path(&path),
        operations,
    })
}
