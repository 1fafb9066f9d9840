use std::path::PathBuf;

use sdkgen_config::ConfigEnv;

use crate::error::{CliError, ExitStatus};
use crate::util::Verbosity;

/// Per-invocation state shared by every command.
pub struct CliSession {
    pub env: ConfigEnv,
    /// Directory discovery starts from; `--dir` or the process working directory.
    pub working_dir: PathBuf,
    pub verbosity: Verbosity,
}

impl CliSession {
    pub fn bootstrap(dir_override: Option<String>, verbosity: Verbosity) -> Result<Self, CliError> {
        let working_dir = match dir_override {
            Some(path) => {
                let path = std::path::absolute(PathBuf::from(path))?;
                if !path.is_dir() {
                    return Err(CliError::new(
                        format!("{} is not a directory", path.display()),
                        ExitStatus::Usage,
                    ));
                }
                path
            }
            None => std::env::current_dir()?,
        };

        Ok(Self {
            env: ConfigEnv::default(),
            working_dir,
            verbosity,
        })
    }
}
