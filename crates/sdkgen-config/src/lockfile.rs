//! The generation lockfile: per-file identity and content checksums carried
//! between generator runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::checksum::checksum_file;
use crate::error::ConfigError;
use crate::fs::{DEFAULT_FILE_MODE, FileSystem};
use crate::ids::IdGenerator;
use crate::ordered_map::OrderedMap;
use crate::workspace::SPEAKEASY_DIR;

pub const LOCKFILE_VERSION: &str = "2.0.0";
pub const LOCKFILE_NAME: &str = "gen.lock";
/// Header marker that carries a tracked file's id inside the generated file.
pub const GENERATED_ID_MARKER: &str = "@generated-id:";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    #[serde(default)]
    pub lock_version: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub management: Management,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_edits: Option<PersistentEdits>,
    /// Language to feature to feature version.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub tracked_files: OrderedMap<String, TrackedFile>,
    /// Operation id to example name to example.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub examples: OrderedMap<String, OrderedMap<String, OperationExamples>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub examples_version: String,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub generated_tests: OrderedMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_notes: String,
    #[serde(flatten)]
    pub additional_properties: Mapping,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Management {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc_checksum: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub speakeasy_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generation_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_checksum: String,
    #[serde(rename = "repoURL", default, skip_serializing_if = "String::is_empty")]
    pub repo_url: String,
    #[serde(rename = "installationURL", default, skip_serializing_if = "String::is_empty")]
    pub installation_url: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub published: bool,
    #[serde(flatten)]
    pub additional_properties: Mapping,
}

/// Pristine snapshot references used for three-way merges of user edits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentEdits {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pristine_commit_hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pristine_tree_hash: String,
}

impl PersistentEdits {
    pub fn is_empty(&self) -> bool {
        self.generation_id.is_empty()
            && self.pristine_commit_hash.is_empty()
            && self.pristine_tree_hash.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Breadcrumb id written into the file's `@generated-id` header.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Normalized checksum of the file as last written.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_write_checksum: String,
    /// Git blob hash of the pristine content.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pristine_git_object: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub moved_to: String,
    #[serde(flatten)]
    pub additional_properties: Mapping,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationExamples {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterExamples>,
    /// Content type to example body.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub request_body: OrderedMap<String, Value>,
    /// Status code to content type to example body.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub responses: OrderedMap<String, OrderedMap<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterExamples {
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub path: OrderedMap<String, Value>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub query: OrderedMap<String, Value>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub header: OrderedMap<String, Value>,
}

impl LockFile {
    /// A fresh lockfile with a new id and no tracked files.
    pub fn new(ids: &dyn IdGenerator) -> Self {
        Self {
            lock_version: LOCKFILE_VERSION.to_string(),
            id: ids.uuid(),
            ..Self::default()
        }
    }

    /// Parses a lockfile. An empty `persistentEdits` block is dropped so it stays omitted.
    pub fn load(data: &[u8]) -> Result<Self, ConfigError> {
        let mut lockfile: LockFile = serde_yaml::from_slice(data)?;
        if !lockfile.lock_version.is_empty() && lockfile.lock_version != LOCKFILE_VERSION {
            return Err(ConfigError::VersionUnsupported(format!(
                "lockVersion {} is not supported, expected {LOCKFILE_VERSION}",
                lockfile.lock_version
            )));
        }
        if lockfile
            .persistent_edits
            .as_ref()
            .is_some_and(PersistentEdits::is_empty)
        {
            lockfile.persistent_edits = None;
        }
        Ok(lockfile)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Fills in `last_write_checksum` for tracked files that lack one, reading each
    /// file relative to `root`. Per-file failures are logged and skipped.
    pub fn populate_missing_checksums(&mut self, fs: &dyn FileSystem, root: &Path) -> usize {
        let mut populated = 0;
        for (path, tracked) in self.tracked_files.iter_mut() {
            if !tracked.last_write_checksum.is_empty() || tracked.deleted {
                continue;
            }
            let full = root.join(path);
            match checksum_file(fs, &full) {
                Ok(sum) => {
                    tracked.last_write_checksum = sum;
                    populated += 1;
                }
                Err(err) => {
                    warn!(path = %full.display(), error = %err, "skipping checksum for tracked file");
                }
            }
        }
        debug!(populated, "populated missing tracked file checksums");
        populated
    }

    /// Path and entry of the tracked file carrying breadcrumb `id`.
    pub fn tracked_file_for_id(&self, id: &str) -> Option<(&String, &TrackedFile)> {
        self.tracked_files
            .iter()
            .find(|(_, tracked)| !tracked.id.is_empty() && tracked.id == id)
    }
}

/// Reads the breadcrumb id from a generated file's `@generated-id:` header line.
pub fn extract_generated_id(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (_, rest) = line.split_once(GENERATED_ID_MARKER)?;
        let id: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        (!id.is_empty()).then_some(id)
    })
}

/// `<dir>/.speakeasy/gen.lock`.
pub fn lockfile_path(dir: &Path) -> PathBuf {
    dir.join(SPEAKEASY_DIR).join(LOCKFILE_NAME)
}

/// Loads `<dir>/.speakeasy/gen.lock`.
pub fn load_lockfile(dir: impl AsRef<Path>, fs: &dyn FileSystem) -> Result<LockFile, ConfigError> {
    let path = lockfile_path(dir.as_ref());
    let data = fs.read(&path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.display().to_string())
        } else {
            ConfigError::Io(err).context(path.display())
        }
    })?;
    LockFile::load(&data).map_err(|err| err.context(path.display()))
}

/// Writes `lockfile` to `<dir>/.speakeasy/gen.lock`, creating the directory.
pub fn save_lockfile(
    dir: impl AsRef<Path>,
    lockfile: &LockFile,
    fs: &dyn FileSystem,
) -> Result<PathBuf, ConfigError> {
    let path = lockfile_path(dir.as_ref());
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write(&path, lockfile.to_yaml()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(path.display()))?;
    debug!(path = %path.display(), "wrote lockfile");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum_bytes;
    use crate::fs::InMemoryFileSystem;
    use crate::ids::SequentialIds;

    const SAMPLE: &str = r#"lockVersion: 2.0.0
id: 0f8fad5b-d9cb-469f-a165-70867728950e
management:
  docChecksum: abc
  speakeasyVersion: 1.300.0
  customKey: kept
features:
  go:
    core: 3.0.0
trackedFiles:
  src/zeta.go:
    id: 1a2b3c
    last_write_checksum: sha1:0000000000000000000000000000000000000000
  src/alpha.go:
    id: 4d5e6f
  README.md:
    deleted: true
    extra: value
"#;

    #[test]
    fn new_lockfile_has_fresh_id() {
        let ids = SequentialIds::new();
        let lockfile = LockFile::new(&ids);
        assert_eq!(lockfile.lock_version, "2.0.0");
        assert_eq!(lockfile.id, "00000000-0000-4000-8000-000000000001");
        assert!(lockfile.tracked_files.is_empty());
        assert!(!lockfile.to_yaml().unwrap().contains("persistentEdits"));
    }

    #[test]
    fn load_preserves_tracked_order_and_extras() {
        let lockfile = LockFile::load(SAMPLE.as_bytes()).unwrap();
        let paths: Vec<_> = lockfile.tracked_files.keys().cloned().collect();
        assert_eq!(paths, ["src/zeta.go", "src/alpha.go", "README.md"]);
        assert_eq!(
            lockfile.management.additional_properties.get("customKey"),
            Some(&Value::from("kept"))
        );
        let readme = lockfile.tracked_files.get("README.md").unwrap();
        assert!(readme.deleted);
        assert_eq!(readme.additional_properties.get("extra"), Some(&Value::from("value")));

        let reparsed = LockFile::load(lockfile.to_yaml().unwrap().as_bytes()).unwrap();
        assert_eq!(reparsed, lockfile);
    }

    #[test]
    fn empty_persistent_edits_stay_omitted() {
        let yaml = "lockVersion: 2.0.0\nid: x\npersistentEdits: {}\ntrackedFiles: {}\n";
        let lockfile = LockFile::load(yaml.as_bytes()).unwrap();
        assert!(lockfile.persistent_edits.is_none());
        assert!(!lockfile.to_yaml().unwrap().contains("persistentEdits"));
    }

    #[test]
    fn null_tracked_files_loads_as_empty() {
        let lockfile = LockFile::load(b"lockVersion: 2.0.0\nid: x\ntrackedFiles: null\n").unwrap();
        assert!(lockfile.tracked_files.is_empty());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = LockFile::load(b"lockVersion: 9.9.9\nid: x\n").unwrap_err();
        assert!(matches!(err, ConfigError::VersionUnsupported(_)));
    }

    #[test]
    fn populates_only_missing_checksums_best_effort() {
        let mut lockfile = LockFile::load(SAMPLE.as_bytes()).unwrap();
        lockfile.tracked_files.set("src/missing.go".into(), TrackedFile::default());
        let fs = InMemoryFileSystem::new("/repo").with_file("/repo/src/alpha.go", "package alpha\r\n");

        let populated = lockfile.populate_missing_checksums(&fs, Path::new("/repo"));
        assert_eq!(populated, 1);
        assert_eq!(
            lockfile.tracked_files.get("src/alpha.go").unwrap().last_write_checksum,
            checksum_bytes("package alpha")
        );
        assert_eq!(
            lockfile.tracked_files.get("src/zeta.go").unwrap().last_write_checksum,
            "sha1:0000000000000000000000000000000000000000"
        );
        assert!(lockfile.tracked_files.get("src/missing.go").unwrap().last_write_checksum.is_empty());
    }

    #[test]
    fn breadcrumb_lookup() {
        let header = "// Code generated by Speakeasy. DO NOT EDIT.\n// @generated-id: 4d5e6f\npackage alpha\n";
        let id = extract_generated_id(header).unwrap();
        assert_eq!(id, "4d5e6f");
        assert_eq!(extract_generated_id("package alpha\n"), None);

        let lockfile = LockFile::load(SAMPLE.as_bytes()).unwrap();
        let (path, _) = lockfile.tracked_file_for_id(&id).unwrap();
        assert_eq!(path, "src/alpha.go");
    }

    #[test]
    fn save_and_load_from_workspace() {
        let fs = InMemoryFileSystem::new("/repo");
        let lockfile = LockFile::new(&SequentialIds::new());
        let path = save_lockfile("/repo", &lockfile, &fs).unwrap();
        assert_eq!(path, PathBuf::from("/repo/.speakeasy/gen.lock"));
        assert_eq!(load_lockfile("/repo", &fs).unwrap(), lockfile);
        assert!(load_lockfile("/elsewhere", &fs).unwrap_err().is_not_found());
    }
}
