use clap::{Arg, ArgMatches, Command};
use sdkgen_config::{ConfigError, DEFAULT_FILE_MODE, workflow_schema, workflow_schema_pretty};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util::display_path;

pub fn command() -> Command {
    Command::new("schema")
        .about("Print the JSON Schema of workflow.yaml")
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("PATH")
                .help("Write the pretty-printed schema to PATH instead of stdout."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let Some(output) = matches.get_one::<String>("output") else {
        return Ok(CommandResult::Schema {
            schema: workflow_schema()?,
        });
    };

    let path = session.working_dir.join(output);
    session
        .env
        .fs()
        .write(&path, workflow_schema_pretty()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(path.display()))?;
    tracing::info!(path = %path.display(), "wrote workflow schema");
    Ok(CommandResult::SchemaWritten {
        path: display_path(&path),
    })
}
