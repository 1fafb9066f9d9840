use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "sdkgen-config";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses arguments, resolves the working directory and dispatches to a command.
/// Returns a `sysexits`-compatible `ExitCode`.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let dir_override = matches.get_one::<String>("dir").cloned();
    let session = CliSession::bootstrap(dir_override, verbosity)?;
    if session.verbosity.verbose {
        tracing::info!(
            working_dir = %session.working_dir.display(),
            "resolved working directory"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new(NAME)
        .about("Inspect, validate and upgrade SDK generation configuration")
        .arg(
            Arg::new("dir")
                .long("dir")
                .value_name("PATH")
                .global(true)
                .help("Directory to start discovery from. Defaults to the current directory."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log the resolved working directory and discovered files."),
        )
        .subcommand_required(true)
        .subcommand(commands::workflow::command())
        .subcommand(commands::genconfig::command())
        .subcommand(commands::lockfile::command())
        .subcommand(commands::lint::command())
        .subcommand(commands::fixtures::command())
        .subcommand(commands::gitignore::command())
        .subcommand(commands::schema::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("workflow", sub)) => commands::workflow::run(session, sub),
        Some(("gen-config", sub)) => commands::genconfig::run(session, sub),
        Some(("lockfile", sub)) => commands::lockfile::run(session, sub),
        Some(("lint", sub)) => commands::lint::run(session, sub),
        Some(("tests", sub)) => commands::fixtures::run(session, sub),
        Some(("gitignore", sub)) => commands::gitignore::run(session, sub),
        Some(("schema", sub)) => commands::schema::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
