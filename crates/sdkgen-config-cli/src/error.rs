use std::fmt;
use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use sdkgen_config::ConfigError;

const EX_OK: u8 = 0;
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;
const EX_OSERR: u8 = 71;
const EX_CONFIG: u8 = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    Usage,
    Data,
    Io,
    Config,
    Software,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Ok => EX_OK,
            ExitStatus::Usage => EX_USAGE,
            ExitStatus::Data => EX_DATAERR,
            ExitStatus::Io => EX_OSERR,
            ExitStatus::Config => EX_CONFIG,
            ExitStatus::Software => EX_SOFTWARE,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    message: String,
    status: ExitStatus,
}

impl CliError {
    pub fn new(message: impl Into<String>, status: ExitStatus) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status.code())
    }

    pub fn print(&self) {
        if !self.message.is_empty() {
            eprintln!("{}", self.message);
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let status = match &err {
            ConfigError::NotFound(_) => ExitStatus::Usage,
            ConfigError::Parse(_)
            | ConfigError::Validation(_)
            | ConfigError::DependencyCycle(_)
            | ConfigError::UnknownReference(_) => ExitStatus::Data,
            ConfigError::VersionUnsupported(_) | ConfigError::UpgradeFailed(_) => {
                ExitStatus::Config
            }
            ConfigError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ExitStatus::Usage
            }
            ConfigError::Io(_) => ExitStatus::Io,
        };
        CliError::new(err.to_string(), status)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> Self {
        let status = match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitStatus::Ok,
            _ => ExitStatus::Usage,
        };
        if status == ExitStatus::Ok {
            let _ = err.print();
            CliError::new(String::new(), status)
        } else {
            CliError::new(err.to_string(), status)
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(err.to_string(), ExitStatus::Io)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(err.to_string(), ExitStatus::Software)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_sysexits() {
        let cases = [
            (ConfigError::NotFound("gen.yaml".into()), EX_USAGE),
            (ConfigError::Validation("bad".into()), EX_DATAERR),
            (ConfigError::DependencyCycle("a -> b -> a".into()), EX_DATAERR),
            (ConfigError::VersionUnsupported("9.0.0".into()), EX_CONFIG),
            (
                ConfigError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
                EX_OSERR,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).status().code(), code);
        }
    }
}
