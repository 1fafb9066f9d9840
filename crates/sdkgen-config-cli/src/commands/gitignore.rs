use clap::{ArgMatches, Command};
use sdkgen_config::api;
use sdkgen_config::{GITIGNORE_FILE, SPEAKEASY_DIR};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

pub fn command() -> Command {
    Command::new("gitignore").about("Ensure .speakeasy/.gitignore lists the generated paths")
}

pub fn run(session: &CliSession, _matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let changed = api::ensure_gitignore(&session.env, &session.working_dir)?;
    let path = session
        .working_dir
        .join(SPEAKEASY_DIR)
        .join(GITIGNORE_FILE);
    Ok(CommandResult::GitignoreEnsured {
        path: display_path(&path),
        changed,
    })
}
