pub mod api;
pub mod checksum;
pub mod env;
pub mod error;
pub mod fs;
pub mod genconfig;
pub mod gitignore;
pub mod ids;
pub mod lint;
pub mod lockfile;
pub mod ordered_map;
pub mod registry;
pub mod schema;
pub mod test_fixtures;
pub mod workflow;
pub mod workspace;

pub use checksum::{
    CHECKSUM_PREFIX, NormalizedHasher, checksum_bytes, checksum_file, checksum_reader,
    git_blob_hash,
};
pub use env::ConfigEnv;
pub use error::ConfigError;
pub use fs::{DEFAULT_FILE_MODE, FileStat, FileSystem, InMemoryFileSystem, OsFileSystem};
pub use genconfig::{
    CONFIG_FILE, CONFIG_VERSION, Config, GenConfigOptions, Generation, LanguageConfig,
    LanguageDefaulter, LanguageUpgrader, LoadedConfig, PassthroughLanguages, UpgradeOutcome,
};
pub use gitignore::{GITIGNORE_ENTRIES, GITIGNORE_FILE};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use lint::{LINT_FILE, LINT_VERSION, Lint, LintLoadOptions, Ruleset};
pub use lockfile::{
    LOCKFILE_NAME, LOCKFILE_VERSION, LockFile, Management, PersistentEdits, TrackedFile,
    extract_generated_id,
};
pub use ordered_map::OrderedMap;
pub use registry::{
    REGISTRY_HOST, RegistryReference, is_registry_location, parse_registry_location,
    registry_location_for, registry_namespace, validate_registry_location,
};
pub use schema::{COMMITTED_WORKFLOW_SCHEMA, workflow_schema, workflow_schema_pretty};
pub use test_fixtures::{ResponseExpectation, TESTS_FILE, TESTS_VERSION, Test, Tests};
pub use workflow::{
    DEFAULT_SUPPORTED_TARGETS, Document, Merge, Source, Target, WORKFLOW_FILE,
    WORKFLOW_LOCAL_FILE, WORKFLOW_VERSION, Workflow,
};
pub use workspace::{FindOptions, FindResult, SPEAKEASY_DIR, find_file_upwards, find_workspace};
