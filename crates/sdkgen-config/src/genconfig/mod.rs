//! Generator configuration (`gen.yaml`): typed generation options, per-language
//! settings and the upgrade pipeline that keeps old files loadable.

mod fields;
mod upgrade;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::fs::{DEFAULT_FILE_MODE, FileSystem};
use crate::ids::IdGenerator;
use crate::lockfile::{LockFile, load_lockfile, lockfile_path, save_lockfile};
use crate::workspace::find_file_upwards;

pub use fields::{
    ConfigField, generation_defaults, generation_fields, get_dotted, insert_dotted, merge_values,
};
pub use upgrade::{CONFIG_VERSION_KEY, UpgradeOutcome, config_version, upgrade};

/// Current `configVersion`.
pub const CONFIG_VERSION: &str = "2.0.0";
pub const CONFIG_FILE: &str = "gen.yaml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub config_version: String,
    #[serde(default)]
    pub generation: Generation,
    /// Every other top-level key is a language section.
    #[serde(flatten)]
    pub languages: BTreeMap<String, LanguageConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default)]
    pub version: String,
    /// Language-specific options, interpreted by the language's generator.
    #[serde(flatten)]
    pub cfg: Mapping,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_containers: Option<DevContainers>,
    #[serde(rename = "baseServerURL", default, skip_serializing_if = "String::is_empty")]
    pub base_server_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sdk_class_name: String,
    #[serde(rename = "maintainOpenAPIOrder", default, skip_serializing_if = "is_false")]
    pub maintain_openapi_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_snippets: Option<UsageSnippets>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_class_names_for_array_fields: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixes: Option<Fixes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<GenerationAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Comments>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tag_namespacing_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<GenerationTests>,
    #[serde(flatten)]
    pub additional_properties: Mapping,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevContainers {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnippets {
    #[serde(default)]
    pub optional_property_rendering: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixes {
    #[serde(default)]
    pub name_resolution_dec2023: bool,
    #[serde(default)]
    pub parameter_ordering_feb2024: bool,
    #[serde(default)]
    pub request_response_component_names_feb2024: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationAuth {
    #[serde(rename = "oAuth2ClientCredentialsEnabled", default)]
    pub oauth2_client_credentials_enabled: bool,
    #[serde(rename = "oAuth2PasswordEnabled", default)]
    pub oauth2_password_enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comments {
    #[serde(default)]
    pub disable_comments: bool,
    #[serde(default)]
    pub omit_description_if_summary_present: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTests {
    #[serde(default)]
    pub generate_tests: bool,
    #[serde(default)]
    pub generate_new_tests: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Produces the default section for a language.
pub trait LanguageDefaulter: Send + Sync {
    fn default_config(&self, lang: &str, is_new_sdk: bool) -> Result<LanguageConfig, ConfigError>;
}

/// Moves a language section from one config version to the next.
pub trait LanguageUpgrader: Send + Sync {
    fn upgrade(
        &self,
        lang: &str,
        old_version: &str,
        new_version: &str,
        cfg: Mapping,
    ) -> Result<Mapping, ConfigError>;
}

impl<F> LanguageDefaulter for F
where
    F: Fn(&str, bool) -> Result<LanguageConfig, ConfigError> + Send + Sync,
{
    fn default_config(&self, lang: &str, is_new_sdk: bool) -> Result<LanguageConfig, ConfigError> {
        self(lang, is_new_sdk)
    }
}

impl<F> LanguageUpgrader for F
where
    F: Fn(&str, &str, &str, Mapping) -> Result<Mapping, ConfigError> + Send + Sync,
{
    fn upgrade(
        &self,
        lang: &str,
        old_version: &str,
        new_version: &str,
        cfg: Mapping,
    ) -> Result<Mapping, ConfigError> {
        self(lang, old_version, new_version, cfg)
    }
}

/// Language hooks for callers without a generator: sections start empty at
/// version `0.0.1` and are carried through upgrades unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughLanguages;

impl LanguageDefaulter for PassthroughLanguages {
    fn default_config(&self, _lang: &str, _is_new_sdk: bool) -> Result<LanguageConfig, ConfigError> {
        Ok(LanguageConfig {
            version: "0.0.1".to_string(),
            cfg: Mapping::new(),
        })
    }
}

impl LanguageUpgrader for PassthroughLanguages {
    fn upgrade(
        &self,
        _lang: &str,
        _old_version: &str,
        _new_version: &str,
        cfg: Mapping,
    ) -> Result<Mapping, ConfigError> {
        Ok(cfg)
    }
}

/// Options for [`load_config`].
#[derive(Clone)]
pub struct GenConfigOptions {
    /// Defaults used when `gen.yaml` has to be created.
    pub is_new_sdk: bool,
    /// Languages that must have a section after loading.
    pub languages: Vec<String>,
    pub defaulter: Arc<dyn LanguageDefaulter>,
    pub upgrader: Arc<dyn LanguageUpgrader>,
}

impl Default for GenConfigOptions {
    fn default() -> Self {
        Self {
            is_new_sdk: true,
            languages: Vec::new(),
            defaulter: Arc::new(PassthroughLanguages),
            upgrader: Arc::new(PassthroughLanguages),
        }
    }
}

impl std::fmt::Debug for GenConfigOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenConfigOptions")
            .field("is_new_sdk", &self.is_new_sdk)
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

impl GenConfigOptions {
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn new_sdk(mut self, is_new_sdk: bool) -> Self {
        self.is_new_sdk = is_new_sdk;
        self
    }

    pub fn defaulter(mut self, defaulter: impl LanguageDefaulter + 'static) -> Self {
        self.defaulter = Arc::new(defaulter);
        self
    }

    pub fn upgrader(mut self, upgrader: impl LanguageUpgrader + 'static) -> Self {
        self.upgrader = Arc::new(upgrader);
        self
    }
}

/// A loaded `gen.yaml` and the lockfile that accompanies it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    pub lockfile: LockFile,
    pub config_path: PathBuf,
    /// Requested languages that had no section and were defaulted.
    pub new_languages: Vec<String>,
    /// `gen.yaml` did not exist and was written with defaults.
    pub created: bool,
    /// `gen.yaml` was rewritten by the upgrade pipeline.
    pub upgraded: bool,
}

impl Config {
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(data: &[u8]) -> Result<Self, ConfigError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_slice(data)?)
    }
}

/// Default config for a fresh SDK: catalog defaults plus one section per language.
pub fn get_default_config(
    is_new_sdk: bool,
    defaulter: &dyn LanguageDefaulter,
    languages: &[String],
) -> Result<Config, ConfigError> {
    let mut root = Mapping::new();
    root.insert(CONFIG_VERSION_KEY.into(), CONFIG_VERSION.into());
    root.insert("generation".into(), Value::Mapping(generation_defaults(is_new_sdk)));
    let mut config: Config = serde_yaml::from_value(Value::Mapping(root))?;

    for lang in languages {
        config
            .languages
            .insert(lang.clone(), defaulter.default_config(lang, is_new_sdk)?);
    }
    Ok(config)
}

/// Checks every `generation` option that carries a validation pattern.
pub fn validate_generation(generation: &Generation) -> Result<(), ConfigError> {
    let Value::Mapping(values) = serde_yaml::to_value(generation)? else {
        return Ok(());
    };
    for field in generation_fields(false) {
        let value = get_dotted(&values, field.name).cloned().unwrap_or(Value::Null);
        field
            .validate(&value)
            .map_err(|err| err.context("generation"))?;
    }
    Ok(())
}

/// Loads `gen.yaml` from `dir` or the nearest ancestor.
///
/// A missing file is created with defaults. A file at an older `configVersion` is
/// upgraded and rewritten; a lockfile split out by the upgrade is written to
/// `<config dir>/.speakeasy/gen.lock` unless one already exists there. Missing
/// options are filled from defaults in memory only.
pub fn load_config(
    dir: impl AsRef<Path>,
    options: &GenConfigOptions,
    fs: &dyn FileSystem,
    ids: &dyn IdGenerator,
) -> Result<LoadedConfig, ConfigError> {
    let dir = dir.as_ref();
    let found = match find_file_upwards(dir, CONFIG_FILE, fs) {
        Ok(found) => found,
        Err(err) if err.is_not_found() => {
            return create_config(dir, options, fs, ids);
        }
        Err(err) => return Err(err),
    };
    let config_path = found.path;
    let config_dir = config_path.parent().unwrap_or(dir).to_path_buf();
    let mut data = found.data.unwrap_or_default();

    let raw: Mapping = if data.iter().all(u8::is_ascii_whitespace) {
        Mapping::new()
    } else {
        serde_yaml::from_slice(&data).map_err(|err| {
            ConfigError::from(err).context(config_path.display())
        })?
    };

    let mut upgraded = false;
    let mut extracted = None;
    if config_version(&raw) != CONFIG_VERSION {
        let outcome = upgrade(raw, options.upgrader.as_ref(), ids)
            .map_err(|err| err.context(config_path.display()))?;
        data = serde_yaml::to_string(&outcome.config)?.into_bytes();
        fs.write(&config_path, &data, DEFAULT_FILE_MODE)
            .map_err(|err| ConfigError::Io(err).context(config_path.display()))?;
        info!(path = %config_path.display(), from = %outcome.path[0], to = CONFIG_VERSION, "upgraded gen.yaml");
        upgraded = true;
        extracted = outcome.lockfile;
    }

    let lockfile = match load_lockfile(&config_dir, fs) {
        Ok(existing) => existing,
        Err(err) if err.is_not_found() => match extracted {
            Some(lockfile) => {
                save_lockfile(&config_dir, &lockfile, fs)?;
                lockfile
            }
            None => LockFile::new(ids),
        },
        Err(err) => return Err(err),
    };

    let (config, new_languages) = with_defaults(&data, options)
        .map_err(|err| err.context(config_path.display()))?;

    Ok(LoadedConfig {
        config,
        lockfile,
        config_path,
        new_languages,
        created: false,
        upgraded,
    })
}

fn create_config(
    dir: &Path,
    options: &GenConfigOptions,
    fs: &dyn FileSystem,
    ids: &dyn IdGenerator,
) -> Result<LoadedConfig, ConfigError> {
    let config = get_default_config(
        options.is_new_sdk,
        options.defaulter.as_ref(),
        &options.languages,
    )?;
    let config_path = fs.abs(dir)?.join(CONFIG_FILE);
    fs.write(&config_path, config.to_yaml()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(config_path.display()))?;
    info!(path = %config_path.display(), "created gen.yaml with defaults");

    Ok(LoadedConfig {
        config,
        lockfile: LockFile::new(ids),
        config_path,
        new_languages: options.languages.clone(),
        created: true,
        upgraded: false,
    })
}

/// Overlays the file onto existing-SDK defaults and defaults any requested language
/// that has no section yet.
fn with_defaults(
    data: &[u8],
    options: &GenConfigOptions,
) -> Result<(Config, Vec<String>), ConfigError> {
    let file: Value = if data.iter().all(u8::is_ascii_whitespace) {
        Value::Mapping(Mapping::new())
    } else {
        serde_yaml::from_slice(data)?
    };

    let mut base = Mapping::new();
    base.insert("generation".into(), Value::Mapping(generation_defaults(false)));
    let mut merged = Value::Mapping(base);
    merge_values(&mut merged, file);
    let mut config: Config = serde_yaml::from_value(merged)?;

    let mut new_languages = Vec::new();
    for lang in &options.languages {
        match config.languages.get_mut(lang) {
            Some(existing) => {
                let defaults = options.defaulter.default_config(lang, false)?;
                let mut value = serde_yaml::to_value(defaults)?;
                merge_values(&mut value, serde_yaml::to_value(&*existing)?);
                *existing = serde_yaml::from_value(value)?;
            }
            None => {
                debug!(lang = %lang, "defaulting new language section");
                config
                    .languages
                    .insert(lang.clone(), options.defaulter.default_config(lang, true)?);
                new_languages.push(lang.clone());
            }
        }
    }
    Ok((config, new_languages))
}

/// Writes `gen.yaml` into `dir` and, when given, the lockfile beside it.
pub fn save_config(
    dir: impl AsRef<Path>,
    config: &Config,
    lockfile: Option<&LockFile>,
    fs: &dyn FileSystem,
) -> Result<PathBuf, ConfigError> {
    let dir = dir.as_ref();
    let config_path = dir.join(CONFIG_FILE);
    fs.write(&config_path, config.to_yaml()?.as_bytes(), DEFAULT_FILE_MODE)
        .map_err(|err| ConfigError::Io(err).context(config_path.display()))?;
    debug!(path = %config_path.display(), "wrote gen.yaml");

    if let Some(lockfile) = lockfile {
        save_lockfile(dir, lockfile, fs)?;
        debug!(path = %lockfile_path(dir).display(), "wrote lockfile beside gen.yaml");
    }
    Ok(config_path)
}
