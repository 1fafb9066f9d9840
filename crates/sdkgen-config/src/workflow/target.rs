use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::publishing::Publishing;
use super::source::SourceRegistry;

/// A generation target: one SDK (or artifact) produced from a source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Target language tag such as `typescript` or `go`.
    #[serde(default)]
    pub target: String,
    /// Source id, or a path to a local OpenAPI document.
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(rename = "publish", default, skip_serializing_if = "Option::is_none")]
    pub publishing: Option<Publishing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_samples: Option<CodeSamples>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<Testing>,
}

/// Usage snippet extraction for a target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeSamples {
    /// Overlay file receiving the extracted samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<SourceRegistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_override: Option<LabelOverride>,
    /// Whether code sample failures block generation. Defaults to true when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Testing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_server: Option<MockServer>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MockServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A downstream repository that consumes this workspace's output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_command: Option<String>,
}

impl CodeSamples {
    /// Effective blocking flag; unset means blocking.
    pub fn is_blocking(&self) -> bool {
        self.blocking.unwrap_or(true)
    }
}

impl Testing {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn mock_server_enabled(&self) -> bool {
        self.mock_server
            .as_ref()
            .and_then(|mock| mock.enabled)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_yaml_field_names() {
        let yaml = r#"
target: typescript
source: petstore
output: ./sdk
publish:
  npm:
    token: $NPM_TOKEN
codeSamples:
  output: codeSamples.yaml
  registry:
    location: registry.speakeasyapi.dev/acme/prod/petstore-typescript-code-samples
  langOverride: javascript
  labelOverride:
    fixedValue: Typescript (SDK)
  blocking: false
testing:
  enabled: true
  mockServer:
    enabled: false
"#;
        let target: Target = serde_yaml::from_str(yaml).unwrap();
        let samples = target.code_samples.as_ref().unwrap();
        assert!(!samples.is_blocking());
        assert_eq!(samples.lang_override.as_deref(), Some("javascript"));
        assert_eq!(
            samples.label_override.as_ref().unwrap().fixed_value.as_deref(),
            Some("Typescript (SDK)")
        );
        assert!(target.publishing.as_ref().unwrap().npm.is_some());

        let testing = target.testing.as_ref().unwrap();
        assert!(testing.is_enabled());
        assert!(!testing.mock_server_enabled());

        let back: Target = serde_yaml::from_str(&serde_yaml::to_string(&target).unwrap()).unwrap();
        assert_eq!(back, target);
    }

    #[test]
    fn defaults_when_flags_unset() {
        assert!(CodeSamples::default().is_blocking());
        assert!(!Testing::default().is_enabled());
        assert!(Testing::default().mock_server_enabled());
    }

    #[test]
    fn dependent_clone_command() {
        let dependent: Dependent =
            serde_yaml::from_str("location: ../app\ncloneCommand: git clone git@host:app.git\n").unwrap();
        assert_eq!(dependent.location.as_deref(), Some("../app"));
        assert_eq!(dependent.clone_command.as_deref(), Some("git clone git@host:app.git"));
    }
}
