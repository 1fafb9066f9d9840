use std::fmt;

use thiserror::Error;

/// High-level error type shared across the configuration components.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unsupported version: {0}")]
    VersionUnsupported(String),
    #[error("upgrade failed: {0}")]
    UpgradeFailed(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("circular source dependency detected: {0}")]
    DependencyCycle(String),
    #[error("unknown source reference: {0}")]
    UnknownReference(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl ConfigError {
    /// Prefixes the message with `ctx` while preserving the error kind.
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            ConfigError::NotFound(msg) => ConfigError::NotFound(format!("{ctx}: {msg}")),
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{ctx}: {msg}")),
            ConfigError::VersionUnsupported(msg) => {
                ConfigError::VersionUnsupported(format!("{ctx}: {msg}"))
            }
            ConfigError::UpgradeFailed(msg) => ConfigError::UpgradeFailed(format!("{ctx}: {msg}")),
            ConfigError::Validation(msg) => ConfigError::Validation(format!("{ctx}: {msg}")),
            ConfigError::UnknownReference(msg) => {
                ConfigError::UnknownReference(format!("{ctx}: {msg}"))
            }
            // Cycle messages must keep the cycle path directly after the prefix.
            ConfigError::DependencyCycle(msg) => ConfigError::DependencyCycle(msg),
            ConfigError::Io(err) => ConfigError::Io(std::io::Error::new(
                err.kind(),
                format!("{ctx}: {err}"),
            )),
        }
    }

    /// True when the error means "no such artifact" rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigError::NotFound(_) => true,
            ConfigError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_message_and_keeps_kind() {
        let err = ConfigError::Validation("no inputs found".into()).context("source api");
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: source api: no inputs found");
    }

    #[test]
    fn io_context_preserves_kind() {
        let err = ConfigError::from(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("gen.yaml");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("gen.yaml"));
    }
}
