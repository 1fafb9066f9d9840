//! The workflow model: sources, targets and dependents declared in
//! `.speakeasy/workflow.yaml`.

mod dependencies;
mod merge;
mod migrate;
mod publishing;
mod source;
mod target;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::fs::{DEFAULT_FILE_MODE, FileSystem};
use crate::ids::IdGenerator;
use crate::workspace::{FindOptions, SPEAKEASY_DIR, find_workspace};

pub use dependencies::validate_source_dependencies;
pub use merge::Merge;
pub use migrate::{CODE_SAMPLE_LABELS, default_code_sample_label};
pub use publishing::{Java, NuGet, Npm, Packagist, PyPi, Publishing, RubyGems, Terraform};
pub use source::{
    Document, SOURCE_REFERENCE_PREFIX, Source, SourcePublishing, SourceRegistry, TEMP_DIR,
    validate_secret,
};
pub use target::{CodeSamples, Dependent, LabelOverride, MockServer, Target, Testing};

/// The only workflow version this crate understands.
pub const WORKFLOW_VERSION: &str = "1.0.0";
pub const WORKFLOW_FILE: &str = "workflow.yaml";
/// Optional sibling of [`WORKFLOW_FILE`] merged over it on load, never written.
pub const WORKFLOW_LOCAL_FILE: &str = "workflow.local.yaml";

/// Target languages accepted when the caller has no narrower list.
pub const DEFAULT_SUPPORTED_TARGETS: &[&str] = &[
    "csharp",
    "go",
    "java",
    "php",
    "postman",
    "python",
    "ruby",
    "swift",
    "terraform",
    "typescript",
    "unity",
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(rename = "workflowVersion", default)]
    pub version: String,
    /// Pinned generator version: `latest` or a semantic version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakeasy_version: Option<String>,
    #[serde(default)]
    pub sources: BTreeMap<String, Source>,
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependents: BTreeMap<String, Dependent>,
}

/// Where a target's OpenAPI document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetSource<'a> {
    /// The workflow source, when the target names one.
    pub source: Option<&'a Source>,
    /// Resolved document location.
    pub location: String,
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            version: WORKFLOW_VERSION.to_string(),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_slice(yaml.as_bytes())
    }

    /// Parses raw file contents. Blank input yields an empty workflow; bytes that are
    /// not UTF-8 are a parse error.
    pub fn from_slice(data: &[u8]) -> Result<Self, ConfigError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_slice(data)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the workflow against every structural and cross-reference rule.
    ///
    /// `root` is the workspace root against which local target sources are resolved.
    pub fn validate(
        &self,
        supported_targets: &[&str],
        root: &Path,
        fs: &dyn FileSystem,
    ) -> Result<(), ConfigError> {
        if self.version != WORKFLOW_VERSION {
            return Err(ConfigError::VersionUnsupported(format!(
                "workflowVersion {:?} is not supported, expected {WORKFLOW_VERSION}",
                self.version
            )));
        }

        if let Some(version) = &self.speakeasy_version {
            validate_speakeasy_version(version)?;
        }

        if self.sources.is_empty() && self.targets.is_empty() {
            return Err(ConfigError::Validation(
                "no sources or targets found".into(),
            ));
        }

        for (id, target) in &self.targets {
            self.validate_target(target, supported_targets, root, fs)
                .map_err(|err| err.context(format!("failed to validate target {id}")))?;
        }

        for (id, source) in &self.sources {
            source
                .validate()
                .map_err(|err| err.context(format!("failed to validate source {id}")))?;
        }

        validate_source_dependencies(&self.sources)
    }

    fn validate_target(
        &self,
        target: &Target,
        supported_targets: &[&str],
        root: &Path,
        fs: &dyn FileSystem,
    ) -> Result<(), ConfigError> {
        if !supported_targets.contains(&target.target.as_str()) {
            return Err(ConfigError::Validation(format!(
                "target {:?} is not one of the supported targets: {}",
                target.target,
                supported_targets.join(", ")
            )));
        }

        if target.source.is_empty() {
            return Err(ConfigError::Validation("source is required".into()));
        }

        match self.sources.get(&target.source) {
            Some(source) => source
                .validate()
                .map_err(|err| err.context(format!("failed to validate source {}", target.source)))?,
            None => {
                let path = root.join(&target.source);
                let is_file = match fs.stat(&path) {
                    Ok(stat) => stat.is_file(),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
                    Err(err) => return Err(ConfigError::Io(err).context(path.display())),
                };
                if !is_file {
                    return Err(ConfigError::Validation(format!(
                        "source {} is not a known source and does not exist as a local file",
                        target.source
                    )));
                }
            }
        }

        if let Some(publishing) = &target.publishing {
            publishing.validate(&target.target)?;
        }

        if let Some(registry) = target
            .code_samples
            .as_ref()
            .and_then(|samples| samples.registry.as_ref())
        {
            registry
                .validate()
                .map_err(|err| err.context("failed to validate codeSamples registry"))?;
        }

        Ok(())
    }

    /// Resolves the document a target generates from.
    pub fn target_source(
        &self,
        target_id: &str,
        ids: &dyn IdGenerator,
    ) -> Result<TargetSource<'_>, ConfigError> {
        let target = self
            .targets
            .get(target_id)
            .ok_or_else(|| ConfigError::NotFound(format!("target {target_id}")))?;

        Ok(match self.sources.get(&target.source) {
            Some(source) => TargetSource {
                source: Some(source),
                location: source.output_location(ids),
            },
            None => TargetSource {
                source: None,
                location: target.source.clone(),
            },
        })
    }
}

fn validate_speakeasy_version(version: &str) -> Result<(), ConfigError> {
    if version == "latest" {
        return Ok(());
    }
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(trimmed).map_err(|err| {
        ConfigError::Validation(format!(
            "speakeasyVersion {version} must be \"latest\" or a semantic version: {err}"
        ))
    })?;
    Ok(())
}

/// Locates `.speakeasy/workflow.yaml` at or above `working_dir`, merges the optional
/// `workflow.local.yaml` next to it and returns the model with the primary file's path.
///
/// Nothing is written.
pub fn load_workflow(
    working_dir: impl AsRef<Path>,
    fs: &dyn FileSystem,
) -> Result<(Workflow, PathBuf), ConfigError> {
    let found = find_workspace(
        working_dir,
        &FindOptions::file(WORKFLOW_FILE).recursive(true),
        fs,
    )?;
    let data = found.data.as_deref().unwrap_or_default();
    let mut workflow = Workflow::from_slice(data)
        .map_err(|err| err.context(found.path.display()))?;

    let local_path = found.dir().join(WORKFLOW_LOCAL_FILE);
    match fs.read(&local_path) {
        Ok(bytes) => {
            let local = Workflow::from_slice(&bytes)
                .map_err(|err| err.context(local_path.display()))?;
            debug!(path = %local_path.display(), "merging local workflow overrides");
            workflow.merge(local);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Io(err).context(local_path.display())),
    }

    Ok((workflow, found.path))
}

/// Writes `workflow` to `<dir>/.speakeasy/workflow.yaml`, creating the directory.
pub fn save_workflow(
    dir: impl AsRef<Path>,
    workflow: &Workflow,
    fs: &dyn FileSystem,
) -> Result<PathBuf, ConfigError> {
    let workspace = dir.as_ref().join(SPEAKEASY_DIR);
    fs.create_dir_all(&workspace)?;
    let path = workspace.join(WORKFLOW_FILE);
    fs.write(&path, workflow.to_yaml()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(path.display()))?;
    debug!(path = %path.display(), "wrote workflow");
    Ok(path)
}
