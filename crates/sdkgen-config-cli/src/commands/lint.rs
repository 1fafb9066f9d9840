use std::path::PathBuf;

use clap::{ArgMatches, Command};
use sdkgen_config::LintLoadOptions;
use sdkgen_config::api;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

pub fn command() -> Command {
    Command::new("lint").about("Load and validate lint.yaml")
}

pub fn run(session: &CliSession, _matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let options = LintLoadOptions {
        search_dirs: vec![session.working_dir.clone()],
        home_dir: std::env::var_os("HOME").map(PathBuf::from),
    };
    let (lint, path) = api::load_lint(&session.env, &options)?;

    Ok(CommandResult::LintLoaded {
        path: display_path(&path),
        default_ruleset: Some(lint.default_ruleset).filter(|name| !name.is_empty()),
        rulesets: lint.rulesets.keys().cloned().collect(),
    })
}
