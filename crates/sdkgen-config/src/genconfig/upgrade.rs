//! Version staircase for `gen.yaml`: each step is a pure transform of the raw
//! mapping to the next version.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::{CONFIG_VERSION, LanguageUpgrader};
use crate::error::ConfigError;
use crate::ids::IdGenerator;
use crate::lockfile::{LockFile, Management};

pub const CONFIG_VERSION_KEY: &str = "configVersion";
pub const VERSION_1_0_0: &str = "1.0.0";

/// Result of running the staircase.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeOutcome {
    pub config: Mapping,
    /// Lockfile split out of the config by the 1.0.0 to 2.0.0 step.
    pub lockfile: Option<LockFile>,
    /// Versions passed through, starting with the input version.
    pub path: Vec<String>,
}

impl UpgradeOutcome {
    pub fn upgraded(&self) -> bool {
        self.path.len() > 1
    }
}

/// Reads `configVersion`; absent means a config older than 1.0.0 (empty string).
pub fn config_version(cfg: &Mapping) -> String {
    match cfg.get(CONFIG_VERSION_KEY) {
        Some(Value::String(version)) => version.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Upgrades `cfg` to the current config version.
pub fn upgrade(
    cfg: Mapping,
    upgrader: &dyn LanguageUpgrader,
    ids: &dyn IdGenerator,
) -> Result<UpgradeOutcome, ConfigError> {
    let mut current = cfg;
    let mut version = config_version(&current);
    let mut path = vec![version.clone()];
    let mut lockfile = None;

    while version != CONFIG_VERSION {
        let (next_version, next) = match version.as_str() {
            "" => upgrade_to_v1(current, upgrader)?,
            VERSION_1_0_0 => {
                let (next_version, next, extracted) = upgrade_to_v2(current, upgrader, ids)?;
                lockfile = Some(extracted);
                (next_version, next)
            }
            other => {
                return Err(ConfigError::VersionUnsupported(format!(
                    "configVersion {other} is not supported, expected {CONFIG_VERSION}"
                )));
            }
        };
        debug!(from = %display_version(&version), to = %next_version, "upgraded gen.yaml");

        if path.contains(&next_version) || config_version(&next) != next_version {
            return Err(ConfigError::UpgradeFailed(format!(
                "step from {} did not advance the config version",
                display_version(&version)
            )));
        }
        path.push(next_version.clone());
        version = next_version;
        current = next;
    }

    Ok(UpgradeOutcome {
        config: current,
        lockfile,
        path,
    })
}

fn display_version(version: &str) -> &str {
    if version.is_empty() { "pre-1.0.0" } else { version }
}

const LEGACY_MANAGEMENT_KEYS: &[(&str, &str)] = &[
    ("openapi-checksum", "docChecksum"),
    ("openapi-version", "docVersion"),
    ("speakeasy-version", "speakeasyVersion"),
];

const LEGACY_COMMENT_KEYS: &[(&str, &str)] = &[
    ("disabled", "disableComments"),
    ("omitdescriptionifsummarypresent", "omitDescriptionIfSummaryPresent"),
];

const LEGACY_GENERATION_KEYS: &[(&str, &str)] = &[
    ("baseserverurl", "baseServerURL"),
    ("sdkclassname", "sdkClassName"),
    ("tagnamespacingdisabled", "tagNamespacingDisabled"),
];

fn upgrade_to_v1(
    cfg: Mapping,
    upgrader: &dyn LanguageUpgrader,
) -> Result<(String, Mapping), ConfigError> {
    let mut out = Mapping::new();
    out.insert(CONFIG_VERSION_KEY.into(), VERSION_1_0_0.into());

    let management = rename_keys(cfg.get("management"), LEGACY_MANAGEMENT_KEYS);
    if !management.is_empty() {
        out.insert("management".into(), Value::Mapping(management));
    }

    let mut generation = Mapping::new();
    if let Some(comments) = cfg.get("comments") {
        generation.insert(
            "comments".into(),
            Value::Mapping(rename_keys(Some(comments), LEGACY_COMMENT_KEYS)),
        );
    }
    for (legacy, key) in LEGACY_GENERATION_KEYS {
        if let Some(value) = cfg.get(*legacy) {
            generation.insert((*key).into(), value.clone());
        }
    }
    out.insert("generation".into(), Value::Mapping(generation));

    let reserved = ["management", "comments"];
    for (key, value) in cfg {
        let Some(lang) = key.as_str() else {
            continue;
        };
        if reserved.contains(&lang)
            || LEGACY_GENERATION_KEYS.iter().any(|(legacy, _)| *legacy == lang)
        {
            continue;
        }
        let Value::Mapping(lang_cfg) = value else {
            continue;
        };
        let upgraded = upgrader
            .upgrade(lang, "", VERSION_1_0_0, lang_cfg)
            .map_err(|err| upgrade_failed(lang, err))?;
        out.insert(key, Value::Mapping(upgraded));
    }

    Ok((VERSION_1_0_0.to_string(), out))
}

fn upgrade_to_v2(
    cfg: Mapping,
    upgrader: &dyn LanguageUpgrader,
    ids: &dyn IdGenerator,
) -> Result<(String, Mapping, LockFile), ConfigError> {
    let mut lockfile = LockFile::new(ids);
    if let Some(management) = cfg.get("management") {
        lockfile.management = serde_yaml::from_value::<Management>(management.clone())
            .map_err(|err| ConfigError::UpgradeFailed(format!("management block: {err}")))?;
    }
    if let Some(features) = cfg.get("features") {
        lockfile.features = features_from(features)?;
    }

    let mut out = Mapping::new();
    out.insert(CONFIG_VERSION_KEY.into(), CONFIG_VERSION.into());
    out.insert(
        "generation".into(),
        cfg.get("generation")
            .cloned()
            .unwrap_or_else(|| Value::Mapping(Mapping::new())),
    );

    let reserved = [CONFIG_VERSION_KEY, "management", "generation", "features"];
    for (key, value) in cfg {
        let Some(lang) = key.as_str().map(str::to_string) else {
            continue;
        };
        if reserved.contains(&lang.as_str()) {
            continue;
        }
        let Value::Mapping(mut lang_cfg) = value else {
            continue;
        };
        if let Some(features) = lang_cfg.shift_remove("features") {
            let extracted = features_from(&Value::Mapping(Mapping::from_iter([(
                Value::from(lang.as_str()),
                features,
            )])))?;
            lockfile.features.extend(extracted);
        }
        let upgraded = upgrader
            .upgrade(&lang, VERSION_1_0_0, CONFIG_VERSION, lang_cfg)
            .map_err(|err| upgrade_failed(&lang, err))?;
        out.insert(key, Value::Mapping(upgraded));
    }

    Ok((CONFIG_VERSION.to_string(), out, lockfile))
}

fn rename_keys(source: Option<&Value>, renames: &[(&str, &str)]) -> Mapping {
    let mut out = Mapping::new();
    let Some(Value::Mapping(source)) = source else {
        return out;
    };
    for (legacy, key) in renames {
        if let Some(value) = source.get(*legacy) {
            out.insert((*key).into(), value.clone());
        }
    }
    out
}

fn features_from(value: &Value) -> Result<BTreeMap<String, BTreeMap<String, String>>, ConfigError> {
    serde_yaml::from_value(value.clone())
        .map_err(|err| ConfigError::UpgradeFailed(format!("features block: {err}")))
}

fn upgrade_failed(lang: &str, err: ConfigError) -> ConfigError {
    match err {
        ConfigError::UpgradeFailed(_) => err.context(format!("language {lang}")),
        other => ConfigError::UpgradeFailed(format!("language {lang}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genconfig::PassthroughLanguages;
    use crate::ids::SequentialIds;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn pre_v1_config_reaches_current_version() {
        let cfg = mapping(
            r#"
management:
  openapi-checksum: abc
  openapi-version: 1.0.0
  speakeasy-version: 1.3.1
comments:
  disabled: true
sdkclassname: speakeasy
go:
  version: 1.3.0
  packagename: foo
"#,
        );
        let rename = |_lang: &str, _old: &str, _new: &str, mut cfg: Mapping| -> Result<Mapping, ConfigError> {
            if let Some(value) = cfg.shift_remove("packagename") {
                cfg.insert("packageName".into(), value);
            }
            Ok(cfg)
        };
        let ids = SequentialIds::new();
        let outcome = upgrade(cfg, &rename, &ids).unwrap();

        assert_eq!(outcome.path, ["", "1.0.0", "2.0.0"]);
        assert!(outcome.upgraded());
        let expected = mapping(
            r#"
configVersion: 2.0.0
generation:
  comments:
    disableComments: true
  sdkClassName: speakeasy
go:
  version: 1.3.0
  packageName: foo
"#,
        );
        assert_eq!(outcome.config, expected);

        let lockfile = outcome.lockfile.unwrap();
        assert_eq!(lockfile.id, "00000000-0000-4000-8000-000000000001");
        assert_eq!(lockfile.management.doc_checksum, "abc");
        assert_eq!(lockfile.management.doc_version, "1.0.0");
        assert_eq!(lockfile.management.speakeasy_version, "1.3.1");
    }

    #[test]
    fn v1_features_move_into_lockfile() {
        let cfg = mapping(
            r#"
configVersion: 1.0.0
management:
  docChecksum: abc
generation:
  sdkClassName: Acme
typescript:
  version: 0.1.0
  features:
    core: 2.1.0
"#,
        );
        let outcome = upgrade(cfg, &PassthroughLanguages, &SequentialIds::new()).unwrap();
        let lockfile = outcome.lockfile.unwrap();
        assert_eq!(lockfile.features["typescript"]["core"], "2.1.0");
        assert!(outcome.config.get("management").is_none());
        let typescript = outcome.config.get("typescript").unwrap().as_mapping().unwrap();
        assert!(typescript.get("features").is_none());
    }

    #[test]
    fn current_version_is_a_fixpoint() {
        let cfg = mapping("configVersion: 2.0.0\ngeneration: {}\n");
        let outcome = upgrade(cfg.clone(), &PassthroughLanguages, &SequentialIds::new()).unwrap();
        assert!(!outcome.upgraded());
        assert_eq!(outcome.config, cfg);
        assert!(outcome.lockfile.is_none());
    }

    #[test]
    fn upgrading_twice_matches_upgrading_once() {
        let cfg = mapping("sdkclassname: Acme\ngo:\n  version: 1.0.0\n");
        let once = upgrade(cfg, &PassthroughLanguages, &SequentialIds::new()).unwrap();
        let twice = upgrade(once.config.clone(), &PassthroughLanguages, &SequentialIds::new()).unwrap();
        assert_eq!(twice.config, once.config);
    }

    #[test]
    fn unknown_version_is_unsupported() {
        let cfg = mapping("configVersion: 9.0.0\n");
        let err = upgrade(cfg, &PassthroughLanguages, &SequentialIds::new()).unwrap_err();
        assert!(matches!(err, ConfigError::VersionUnsupported(_)));
    }

    #[test]
    fn language_callback_errors_fail_the_upgrade() {
        let cfg = mapping("configVersion: 1.0.0\ngeneration: {}\ngo:\n  version: 1.0.0\n");
        let failing = |lang: &str, _old: &str, _new: &str, _cfg: Mapping| -> Result<Mapping, ConfigError> {
            Err(ConfigError::Validation(format!("cannot upgrade {lang}")))
        };
        let err = upgrade(cfg, &failing, &SequentialIds::new()).unwrap_err();
        assert!(matches!(err, ConfigError::UpgradeFailed(_)));
        assert!(err.to_string().contains("language go"));
    }
}
