//! Lint rulesets declared in `.speakeasy/lint.yaml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use tracing::debug;

use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::workspace::{FindOptions, find_workspace};

pub const LINT_VERSION: &str = "1.0.0";
pub const LINT_FILE: &str = "lint.yaml";

/// Rulesets shipped with the linter and always available by name.
pub const BUILTIN_RULESETS: &[&str] = &[
    "speakeasy-recommended",
    "speakeasy-generation",
    "speakeasy-openapi",
    "vacuum",
    "owasp",
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lint {
    #[serde(default)]
    pub lint_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_ruleset: String,
    #[serde(default)]
    pub rulesets: BTreeMap<String, Ruleset>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Rule id to rule definition; definitions are interpreted by the rule engine.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, Mapping>,
    /// Other rulesets (local or built-in) this one extends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rulesets: Vec<String>,
}

/// Where [`load_lint`] looks for `lint.yaml`.
#[derive(Clone, Debug, Default)]
pub struct LintLoadOptions {
    /// Directories searched recursively upward, in order.
    pub search_dirs: Vec<PathBuf>,
    /// Home directory probed last, without ascending.
    pub home_dir: Option<PathBuf>,
}

impl Lint {
    pub fn from_yaml(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(data)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lint_version != LINT_VERSION {
            return Err(ConfigError::VersionUnsupported(format!(
                "lintVersion {:?} is not supported, expected {LINT_VERSION}",
                self.lint_version
            )));
        }

        if !self.default_ruleset.is_empty() && !self.has_ruleset(&self.default_ruleset) {
            return Err(ConfigError::Validation(format!(
                "defaultRuleset {} is not defined",
                self.default_ruleset
            )));
        }

        for (name, ruleset) in &self.rulesets {
            for extended in &ruleset.rulesets {
                if !self.has_ruleset(extended) {
                    return Err(ConfigError::Validation(format!(
                        "ruleset {name} extends unknown ruleset {extended}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// True for rulesets defined in this file or shipped with the linter.
    pub fn has_ruleset(&self, name: &str) -> bool {
        self.rulesets.contains_key(name) || BUILTIN_RULESETS.contains(&name)
    }
}

/// Finds, parses and validates `lint.yaml`, returning it with its path.
pub fn load_lint(
    options: &LintLoadOptions,
    fs: &dyn FileSystem,
) -> Result<(Lint, PathBuf), ConfigError> {
    let mut probes: Vec<(&Path, bool)> = options
        .search_dirs
        .iter()
        .map(|dir| (dir.as_path(), true))
        .collect();
    if let Some(home) = &options.home_dir {
        probes.push((home.as_path(), false));
    }

    for (dir, recursive) in probes {
        let find = FindOptions::file(LINT_FILE).recursive(recursive);
        let found = match find_workspace(dir, &find, fs) {
            Ok(found) => found,
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err),
        };
        debug!(path = %found.path.display(), "loading lint rulesets");
        let lint = Lint::from_yaml(found.data.as_deref().unwrap_or_default())
            .and_then(|lint| lint.validate().map(|_| lint))
            .map_err(|err| err.context(found.path.display()))?;
        return Ok((lint, found.path));
    }

    Err(ConfigError::NotFound(format!("no {LINT_FILE} found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    const LINT: &str = r#"lintVersion: 1.0.0
defaultRuleset: strict
rulesets:
  strict:
    rules:
      operation-operationId:
        severity: error
    rulesets:
      - speakeasy-recommended
"#;

    #[test]
    fn parses_and_validates() {
        let lint = Lint::from_yaml(LINT.as_bytes()).unwrap();
        lint.validate().unwrap();
        assert!(lint.rulesets["strict"].rules.contains_key("operation-operationId"));
    }

    #[test]
    fn default_ruleset_may_be_builtin() {
        let lint = Lint::from_yaml(b"lintVersion: 1.0.0\ndefaultRuleset: owasp\n").unwrap();
        lint.validate().unwrap();

        let unknown = Lint::from_yaml(b"lintVersion: 1.0.0\ndefaultRuleset: nope\n").unwrap();
        assert!(unknown.validate().unwrap_err().to_string().contains("nope"));
    }

    #[test]
    fn version_must_match() {
        let lint = Lint::from_yaml(b"lintVersion: 0.1.0\n").unwrap();
        assert!(matches!(lint.validate(), Err(ConfigError::VersionUnsupported(_))));
    }

    #[test]
    fn falls_back_to_home_without_ascending() {
        let fs = InMemoryFileSystem::new("/")
            .with_file("/home/dev/.speakeasy/lint.yaml", LINT)
            .with_file("/home/.speakeasy/lint.yaml", "lintVersion: 9\n");

        let options = LintLoadOptions {
            search_dirs: vec![PathBuf::from("/work/repo")],
            home_dir: Some(PathBuf::from("/home/dev")),
        };
        let (lint, path) = load_lint(&options, &fs).unwrap();
        assert_eq!(path, PathBuf::from("/home/dev/.speakeasy/lint.yaml"));
        assert_eq!(lint.default_ruleset, "strict");

        let nested_home = LintLoadOptions {
            search_dirs: Vec::new(),
            home_dir: Some(PathBuf::from("/home/dev/projects")),
        };
        assert!(load_lint(&nested_home, &fs).unwrap_err().is_not_found());
    }

    #[test]
    fn search_dirs_walk_upward() {
        let fs = InMemoryFileSystem::new("/").with_file("/work/.speakeasy/lint.yaml", LINT);
        let options = LintLoadOptions {
            search_dirs: vec![PathBuf::from("/work/repo/pkg")],
            home_dir: None,
        };
        let (_, path) = load_lint(&options, &fs).unwrap();
        assert_eq!(path, PathBuf::from("/work/.speakeasy/lint.yaml"));
    }
}
