use clap::{Arg, ArgAction, ArgMatches, Command};
use sdkgen_config::api::workspace_root;
use sdkgen_config::lockfile::{load_lockfile, save_lockfile};
use sdkgen_config::{FindOptions, LOCKFILE_NAME, find_workspace};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

#[derive(Clone, Debug, Serialize)]
pub struct LockfileSummary {
    pub path: String,
    pub id: String,
    pub tracked_files: usize,
    pub populated: usize,
    pub written: bool,
}

pub fn command() -> Command {
    Command::new("lockfile")
        .about("Inspect .speakeasy/gen.lock and back-fill missing checksums")
        .arg(
            Arg::new("write")
                .long("write")
                .action(ArgAction::SetTrue)
                .help("Save the lockfile when checksums were populated."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let fs = session.env.fs();
    let found = find_workspace(
        &session.working_dir,
        &FindOptions::file(LOCKFILE_NAME).recursive(true),
        fs,
    )?;
    let root = workspace_root(&found.path);

    let mut lockfile = load_lockfile(&root, fs)?;
    let populated = lockfile.populate_missing_checksums(fs, &root);
    let written = matches.get_flag("write") && populated > 0;
    if written {
        save_lockfile(&root, &lockfile, fs)?;
    }

    Ok(CommandResult::LockfileInspected {
        summary: LockfileSummary {
            path: display_path(&found.path),
            id: lockfile.id,
            tracked_files: lockfile.tracked_files.len(),
            populated,
            written,
        },
    })
}
