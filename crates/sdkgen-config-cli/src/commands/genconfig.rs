use clap::{Arg, ArgAction, ArgMatches, Command};
use sdkgen_config::GenConfigOptions;
use sdkgen_config::api;
use serde::Serialize;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

#[derive(Clone, Debug, Serialize)]
pub struct GenConfigSummary {
    pub path: String,
    pub config_version: String,
    pub created: bool,
    pub upgraded: bool,
    pub languages: Vec<String>,
    pub new_languages: Vec<String>,
    pub lockfile_id: String,
}

pub fn command() -> Command {
    Command::new("gen-config")
        .about("Load gen.yaml, creating it with defaults or upgrading it in place")
        .arg(
            Arg::new("lang")
                .long("lang")
                .value_name("LANG")
                .action(ArgAction::Append)
                .help("Language that must have a section. Repeatable."),
        )
        .arg(
            Arg::new("existing-sdk")
                .long("existing-sdk")
                .action(ArgAction::SetTrue)
                .help("Use existing-SDK defaults when gen.yaml has to be created."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let languages: Vec<String> = matches
        .get_many::<String>("lang")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let options = GenConfigOptions::default()
        .languages(languages)
        .new_sdk(!matches.get_flag("existing-sdk"));

    let loaded = api::load_gen_config(&session.env, &session.working_dir, &options)?;
    if session.verbosity.verbose {
        tracing::info!(
            path = %loaded.config_path.display(),
            created = loaded.created,
            upgraded = loaded.upgraded,
            "loaded gen.yaml"
        );
    }

    Ok(CommandResult::GenConfigLoaded {
        summary: GenConfigSummary {
            path: display_path(&loaded.config_path),
            config_version: loaded.config.config_version.clone(),
            created: loaded.created,
            upgraded: loaded.upgraded,
            languages: loaded.config.languages.keys().cloned().collect(),
            new_languages: loaded.new_languages,
            lockfile_id: loaded.lockfile.id,
        },
    })
}
