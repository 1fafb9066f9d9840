use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::ids::IdGenerator;
use crate::registry::{
    is_registry_location, registry_location_for, validate_registry_location,
};

/// Prefix of a document location that refers to another source's output.
pub const SOURCE_REFERENCE_PREFIX: &str = "source:";
/// Scratch directory for merged and downloaded documents.
pub const TEMP_DIR: &str = ".speakeasy/temp";

const RANDOM_SUFFIX_LEN: usize = 10;

/// An OpenAPI input or overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Local path, remote URL, `source:<id>` reference or registry URI.
    #[serde(default)]
    pub location: String,
    /// Header carrying the credential when fetching a remote document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_header: Option<String>,
    /// Environment variable reference such as `$OPENAPI_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_secret: Option<String>,
}

impl Document {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            auth_header: None,
            auth_secret: None,
        }
    }

    /// Attaches header-based authentication.
    pub fn with_auth(mut self, header: impl Into<String>, secret: impl Into<String>) -> Self {
        self.auth_header = Some(header.into());
        self.auth_secret = Some(secret.into());
        self
    }

    /// True when either auth key is present, even if the pair is incomplete.
    pub fn has_auth(&self) -> bool {
        self.auth_header.is_some() || self.auth_secret.is_some()
    }

    /// True for `http://` and `https://` URLs.
    pub fn is_remote(&self) -> bool {
        match Url::parse(&self.location) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && !self.is_registry(),
            Err(_) => false,
        }
    }

    pub fn is_registry(&self) -> bool {
        is_registry_location(&self.location)
    }

    /// The referenced source id for `source:<id>` locations.
    pub fn source_reference(&self) -> Option<&str> {
        self.location.strip_prefix(SOURCE_REFERENCE_PREFIX)
    }

    pub fn is_local(&self) -> bool {
        !self.is_remote() && !self.is_registry() && self.source_reference().is_none()
    }

    /// True when the location's path ends in `.yaml` or `.yml`.
    pub fn is_yaml(&self) -> bool {
        match Url::parse(&self.location) {
            Ok(url) if self.is_remote() => is_yaml_path(url.path()),
            _ => is_yaml_path(&self.location),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.is_empty() {
            return Err(ConfigError::Validation("location is required".into()));
        }

        if let Some(id) = self.source_reference() {
            if id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "location {} must name a source",
                    self.location
                )));
            }
        }

        if self.has_auth() {
            if !self.is_remote() {
                return Err(ConfigError::Validation(format!(
                    "auth is only supported for remote documents, {} is not remote",
                    self.location
                )));
            }
            if self.auth_header.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Validation(
                    "authHeader is required when authSecret is set".into(),
                ));
            }
            validate_secret("authSecret", self.auth_secret.as_deref().unwrap_or_default())?;
        }

        Ok(())
    }

    fn extension_hint(&self) -> &'static str {
        let path = match Url::parse(&self.location) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.location.clone(),
        };
        if path.to_ascii_lowercase().ends_with(".json") {
            "json"
        } else {
            "yaml"
        }
    }
}

/// Where a source is published to and tracked in the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceRegistry {
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SourceRegistry {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            tags: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_registry_location(&self.location)
    }
}

/// Shorthand publish target of the form `@<org>/<workspace>/<name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourcePublishing {
    #[serde(default)]
    pub location: String,
}

impl SourcePublishing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = self.location.strip_prefix('@').ok_or_else(|| {
            ConfigError::Validation(format!(
                "publish location {} must have the form @<org>/<workspace>/<name>",
                self.location
            ))
        })?;
        let parts: Vec<&str> = namespace.split('/').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "publish location {} must have the form @<org>/<workspace>/<name>",
                self.location
            )));
        }
        Ok(())
    }

    /// Registry location equivalent of the shorthand.
    pub fn registry_location(&self) -> Result<String, ConfigError> {
        self.validate()?;
        Ok(registry_location_for(&self.location[1..]))
    }
}

/// A named OpenAPI source: inputs merged and overlaid into one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    #[serde(default)]
    pub inputs: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Lint ruleset applied to the resolved document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<SourceRegistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<SourcePublishing>,
}

impl Source {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::Validation("no inputs found".into()));
        }

        for (idx, input) in self.inputs.iter().enumerate() {
            input
                .validate()
                .map_err(|err| err.context(format!("failed to validate input {idx}")))?;
        }
        for (idx, overlay) in self.overlays.iter().enumerate() {
            overlay
                .validate()
                .map_err(|err| err.context(format!("failed to validate overlay {idx}")))?;
        }

        if let Some(output) = &self.output {
            if self.is_composite() {
                if !is_yaml_path(output) {
                    return Err(ConfigError::Validation(format!(
                        "output {output} must be a yaml file when merging multiple inputs or applying overlays"
                    )));
                }
            } else if *output != self.inputs[0].location {
                return Err(ConfigError::Validation(format!(
                    "output {output} is superfluous for a single input; it must equal the input location {}",
                    self.inputs[0].location
                )));
            }
        }

        if let Some(registry) = &self.registry {
            registry
                .validate()
                .map_err(|err| err.context("failed to validate registry"))?;
        }

        if let Some(publish) = &self.publish {
            publish.validate()?;
        }

        Ok(())
    }

    /// More than one input or at least one overlay.
    pub fn is_composite(&self) -> bool {
        self.inputs.len() > 1 || !self.overlays.is_empty()
    }

    /// Ids of sources referenced by `source:<id>` inputs and overlays, in declaration order.
    pub fn referenced_sources(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .chain(self.overlays.iter())
            .filter_map(Document::source_reference)
    }

    /// Location the resolved document is written to.
    ///
    /// An explicit output wins; a single local input is used in place; anything else
    /// lands in a uniquely named file under [`TEMP_DIR`].
    pub fn output_location(&self, ids: &dyn IdGenerator) -> String {
        if let Some(output) = &self.output {
            return output.clone();
        }

        if !self.is_composite() {
            if let Some(input) = self.inputs.first() {
                if input.is_local() {
                    return input.location.clone();
                }
                return format!(
                    "{TEMP_DIR}/downloaded_{}.{}",
                    ids.random_string(RANDOM_SUFFIX_LEN),
                    input.extension_hint()
                );
            }
        }

        format!(
            "{TEMP_DIR}/output_{}.yaml",
            ids.random_string(RANDOM_SUFFIX_LEN)
        )
    }
}

/// Rejects anything other than an environment variable reference (`$NAME`).
pub fn validate_secret(field: &str, value: &str) -> Result<(), ConfigError> {
    let valid = value
        .strip_prefix('$')
        .map(|name| !name.is_empty())
        .unwrap_or(false);
    if !valid {
        return Err(ConfigError::Validation(format!(
            "{field} must be an environment variable reference (e.g. $MY_SECRET)"
        )));
    }
    Ok(())
}

pub(crate) fn is_yaml_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn remote_with_auth(secret: &str) -> Document {
        Document::new("https://example.com/openapi.yaml").with_auth("x-api-key", secret)
    }

    #[test]
    fn document_kinds() {
        assert!(Document::new("https://example.com/api.yaml").is_remote());
        assert!(!Document::new("./api.yaml").is_remote());
        assert!(Document::new("./api.yaml").is_local());
        assert_eq!(Document::new("source:base").source_reference(), Some("base"));
        let registry = Document::new("registry.speakeasyapi.dev/acme/prod/api");
        assert!(registry.is_registry());
        assert!(!registry.is_remote());
        assert!(!registry.is_local());
        assert!(Document::new("https://example.com/api.yml?v=2").is_yaml());
        assert!(!Document::new("./api.json").is_yaml());
    }

    #[test]
    fn auth_requires_remote_and_env_secret() {
        assert!(remote_with_auth("$TOKEN").validate().is_ok());

        let err = remote_with_auth("plaintext").validate().unwrap_err();
        assert!(err.to_string().contains("authSecret"));

        let local = Document {
            location: "./openapi.yaml".into(),
            ..remote_with_auth("$TOKEN")
        };
        let err = local.validate().unwrap_err();
        assert!(err.to_string().contains("only supported for remote documents"));
    }

    #[test]
    fn half_specified_auth_is_kept_and_rejected() {
        let header_only: Document =
            serde_yaml::from_str("location: ./local.yaml\nauthHeader: X-Api-Key\n").unwrap();
        assert_eq!(header_only.auth_header.as_deref(), Some("X-Api-Key"));
        assert!(header_only.auth_secret.is_none());
        let err = header_only.validate().unwrap_err();
        assert!(err.to_string().contains("only supported for remote documents"));
        assert!(serde_yaml::to_string(&header_only).unwrap().contains("authHeader: X-Api-Key"));

        let remote_header_only = Document {
            location: "https://example.com/a.yaml".into(),
            ..header_only
        };
        let err = remote_header_only.validate().unwrap_err();
        assert!(err.to_string().contains("authSecret"));

        let secret_only: Document =
            serde_yaml::from_str("location: https://example.com/a.yaml\nauthSecret: $TOKEN\n")
                .unwrap();
        let err = secret_only.validate().unwrap_err();
        assert!(err.to_string().contains("authHeader is required"));
    }

    #[test]
    fn auth_round_trips_inline() {
        let yaml = "location: https://example.com/a.yaml\nauthHeader: Authorization\nauthSecret: $TOKEN\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.auth_secret.as_deref(), Some("$TOKEN"));
        assert_eq!(serde_yaml::to_string(&doc).unwrap(), yaml);

        let plain: Document = serde_yaml::from_str("location: ./a.yaml\n").unwrap();
        assert!(!plain.has_auth());
    }

    #[test]
    fn composite_output_must_be_yaml() {
        let mut source = Source {
            inputs: vec![Document::new("a.yaml"), Document::new("b.yaml")],
            output: Some("merged.json".into()),
            ..Source::default()
        };
        assert!(source.validate().is_err());
        source.output = Some("merged.yml".into());
        assert!(source.validate().is_ok());
    }

    #[test]
    fn single_input_output_must_equal_input() {
        let mut source = Source {
            inputs: vec![Document::new("openapi.yaml")],
            output: Some("other.yaml".into()),
            ..Source::default()
        };
        let err = source.validate().unwrap_err();
        assert!(err.to_string().contains("superfluous"));

        source.output = Some("openapi.yaml".into());
        assert!(source.validate().is_ok());
    }

    #[test]
    fn source_requires_inputs_and_valid_registry() {
        let err = Source::default().validate().unwrap_err();
        assert!(err.to_string().contains("no inputs found"));

        let source = Source {
            inputs: vec![Document::new("openapi.yaml")],
            registry: Some(SourceRegistry::new("registry.speakeasyapi.dev/acme/prod")),
            ..Source::default()
        };
        assert!(source.validate().is_err());
    }

    #[test]
    fn publish_shorthand_shape() {
        let publish = SourcePublishing {
            location: "@acme/prod/petstore".into(),
        };
        assert_eq!(
            publish.registry_location().unwrap(),
            "registry.speakeasyapi.dev/acme/prod/petstore"
        );
        assert!(SourcePublishing { location: "acme/prod/petstore".into() }.validate().is_err());
        assert!(SourcePublishing { location: "@acme/prod".into() }.validate().is_err());
    }

    #[test]
    fn output_location_resolution() {
        let ids = SequentialIds::new();
        let local = Source {
            inputs: vec![Document::new("./openapi.yaml")],
            ..Source::default()
        };
        assert_eq!(local.output_location(&ids), "./openapi.yaml");

        let remote = Source {
            inputs: vec![Document::new("https://example.com/spec.json")],
            ..Source::default()
        };
        assert_eq!(
            remote.output_location(&ids),
            ".speakeasy/temp/downloaded_0000000001.json"
        );

        let merged = Source {
            inputs: vec![Document::new("a.yaml")],
            overlays: vec![Document::new("overlay.yaml")],
            ..Source::default()
        };
        assert_eq!(
            merged.output_location(&ids),
            ".speakeasy/temp/output_0000000002.yaml"
        );
    }

    #[test]
    fn secrets_must_reference_env_vars() {
        assert!(validate_secret("token", "$NPM_TOKEN").is_ok());
        assert!(validate_secret("token", "$").is_err());
        assert!(validate_secret("token", "npm_abc").is_err());
        assert!(validate_secret("token", "").is_err());
    }
}
