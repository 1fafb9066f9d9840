//! Entry points that pick the right discoverer and model and wire the injected
//! collaborators from a [`ConfigEnv`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::ConfigEnv;
use crate::error::ConfigError;
use crate::fs::DEFAULT_FILE_MODE;
use crate::genconfig::{self, Config, GenConfigOptions, LoadedConfig};
use crate::gitignore;
use crate::lint::{self, Lint, LintLoadOptions};
use crate::lockfile::{self, LockFile};
use crate::test_fixtures::{self, Tests};
use crate::workflow::{self, WORKFLOW_FILE, Workflow};
use crate::workspace::{FindOptions, find_workspace};

/// Loads the workflow governing `working_dir`, with local overrides merged.
pub fn load_workflow(
    env: &ConfigEnv,
    working_dir: impl AsRef<Path>,
) -> Result<(Workflow, PathBuf), ConfigError> {
    workflow::load_workflow(working_dir, env.fs())
}

/// Loads and fully validates the workflow governing `working_dir`.
///
/// Local target sources are resolved against the workspace root, the directory that
/// holds `.speakeasy`.
pub fn load_valid_workflow(
    env: &ConfigEnv,
    working_dir: impl AsRef<Path>,
    supported_targets: &[&str],
) -> Result<(Workflow, PathBuf), ConfigError> {
    let (workflow, path) = load_workflow(env, working_dir)?;
    let root = workspace_root(&path);
    debug!(root = %root.display(), "validating workflow");
    workflow
        .validate(supported_targets, &root, env.fs())
        .map_err(|err| err.context(path.display()))?;
    Ok((workflow, path))
}

/// Writes the workflow into `<dir>/.speakeasy/workflow.yaml`.
pub fn save_workflow(
    env: &ConfigEnv,
    dir: impl AsRef<Path>,
    workflow: &Workflow,
) -> Result<PathBuf, ConfigError> {
    workflow::save_workflow(dir, workflow, env.fs())
}

/// Runs [`Workflow::migrate`] on the primary workflow file and writes it back in
/// place when the migration changed anything. `workflow.local.yaml` is neither read
/// nor written.
pub fn migrate_workflow(
    env: &ConfigEnv,
    working_dir: impl AsRef<Path>,
) -> Result<(PathBuf, bool), ConfigError> {
    let found = find_workspace(
        working_dir,
        &FindOptions::file(WORKFLOW_FILE).recursive(true),
        env.fs(),
    )?;
    let data = found.data.as_deref().unwrap_or_default();
    let original =
        Workflow::from_slice(data).map_err(|err| err.context(found.path.display()))?;

    let mut migrated = original.clone();
    migrated.migrate();
    if migrated == original {
        return Ok((found.path, false));
    }

    env.fs()
        .write(&found.path, migrated.to_yaml()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(found.path.display()))?;
    debug!(path = %found.path.display(), "migrated workflow");
    Ok((found.path, true))
}

/// Loads `gen.yaml`, creating or upgrading it as needed.
pub fn load_gen_config(
    env: &ConfigEnv,
    working_dir: impl AsRef<Path>,
    options: &GenConfigOptions,
) -> Result<LoadedConfig, ConfigError> {
    genconfig::load_config(working_dir, options, env.fs(), env.ids())
}

/// Writes `gen.yaml` and, when given, its lockfile into `dir`.
pub fn save_gen_config(
    env: &ConfigEnv,
    dir: impl AsRef<Path>,
    config: &Config,
    lockfile: Option<&LockFile>,
) -> Result<PathBuf, ConfigError> {
    genconfig::save_config(dir, config, lockfile, env.fs())
}

/// Loads `<dir>/.speakeasy/gen.lock` and back-fills missing checksums of files
/// tracked under `dir`.
pub fn load_lockfile(env: &ConfigEnv, dir: impl AsRef<Path>) -> Result<LockFile, ConfigError> {
    let dir = dir.as_ref();
    let mut lockfile = lockfile::load_lockfile(dir, env.fs())?;
    lockfile.populate_missing_checksums(env.fs(), dir);
    Ok(lockfile)
}

pub fn load_lint(
    env: &ConfigEnv,
    options: &LintLoadOptions,
) -> Result<(Lint, PathBuf), ConfigError> {
    lint::load_lint(options, env.fs())
}

pub fn load_tests(
    env: &ConfigEnv,
    working_dir: impl AsRef<Path>,
) -> Result<(Tests, PathBuf), ConfigError> {
    test_fixtures::load_tests(working_dir, env.fs())
}

/// Keeps `<dir>/.speakeasy/.gitignore` up to date; returns whether it changed.
pub fn ensure_gitignore(env: &ConfigEnv, dir: impl AsRef<Path>) -> Result<bool, ConfigError> {
    gitignore::ensure_gitignore(dir, env.fs())
}

/// Directory holding the workspace directory that contains `artifact`.
pub fn workspace_root(artifact: &Path) -> PathBuf {
    artifact
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
