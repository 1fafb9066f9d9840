use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// Description of one `generation` option: its default and how values are checked.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigField {
    /// Dotted path under `generation`, e.g. `fixes.nameResolutionDec2023`.
    pub name: &'static str,
    pub required: bool,
    pub default_value: Option<Value>,
    pub description: &'static str,
    pub validation_regex: Option<&'static str>,
    pub validation_message: Option<&'static str>,
    /// Language the field is specific to; `None` applies to every target.
    pub language: Option<&'static str>,
}

impl ConfigField {
    fn new(name: &'static str, default_value: impl Into<Value>, description: &'static str) -> Self {
        Self {
            name,
            required: false,
            default_value: Some(default_value.into()),
            description,
            validation_regex: None,
            validation_message: None,
            language: None,
        }
    }

    fn with_validation(mut self, regex: &'static str, message: &'static str) -> Self {
        self.validation_regex = Some(regex);
        self.validation_message = Some(message);
        self
    }

    /// Checks a string value against the field's pattern. Empty optional values pass.
    pub fn validate(&self, value: &Value) -> Result<(), ConfigError> {
        let Some(pattern) = self.validation_regex else {
            return Ok(());
        };
        let text = match value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{} must be a scalar value",
                    self.name
                )));
            }
        };
        if text.is_empty() {
            if self.required {
                return Err(ConfigError::Validation(format!("{} is required", self.name)));
            }
            return Ok(());
        }

        let regex = Regex::new(pattern).map_err(|err| {
            ConfigError::Validation(format!("invalid pattern for {}: {err}", self.name))
        })?;
        if !regex.is_match(&text) {
            return Err(ConfigError::Validation(format!(
                "{}: {}",
                self.name,
                self.validation_message.unwrap_or("invalid value")
            )));
        }
        Ok(())
    }
}

/// Catalog of `generation` options. Date-gated fixes and OAuth2 support default on
/// only for SDKs generated for the first time.
pub fn generation_fields(is_new_sdk: bool) -> Vec<ConfigField> {
    vec![
        ConfigField::new(
            "baseServerURL",
            "",
            "Server URL used when the OpenAPI document declares none",
        )
        .with_validation(
            r"^(https?)://([\w\-]+\.)+\w+(/.*)?$",
            "Must be a valid server URL",
        ),
        ConfigField::new("sdkClassName", "SDK", "Name of the root SDK class")
            .with_validation(r"^[\w.\-]+$", "Letters, numbers, or .-_ only"),
        ConfigField::new(
            "maintainOpenAPIOrder",
            true,
            "Keep parameters, properties and operations in document order",
        ),
        ConfigField::new(
            "usageSnippets.optionalPropertyRendering",
            "withExample",
            "When optional properties appear in usage snippets",
        )
        .with_validation(
            r"^(always|never|withExample)$",
            "Must be always, never or withExample",
        ),
        ConfigField::new(
            "useClassNamesForArrayFields",
            true,
            "Name array item types after their class",
        ),
        ConfigField::new(
            "fixes.nameResolutionDec2023",
            is_new_sdk,
            "Name resolution fixes from December 2023",
        ),
        ConfigField::new(
            "fixes.parameterOrderingFeb2024",
            is_new_sdk,
            "Parameter ordering fixes from February 2024",
        ),
        ConfigField::new(
            "fixes.requestResponseComponentNamesFeb2024",
            is_new_sdk,
            "Request and response component naming fixes from February 2024",
        ),
        ConfigField::new(
            "auth.oAuth2ClientCredentialsEnabled",
            is_new_sdk,
            "Generate OAuth2 client credentials support",
        ),
        ConfigField::new(
            "auth.oAuth2PasswordEnabled",
            is_new_sdk,
            "Generate OAuth2 password flow support",
        ),
        ConfigField::new(
            "comments.disableComments",
            false,
            "Omit doc comments from generated code",
        ),
        ConfigField::new(
            "comments.omitDescriptionIfSummaryPresent",
            false,
            "Use only the summary when an operation has both",
        ),
        ConfigField::new("tests.generateTests", true, "Generate tests for the SDK"),
        ConfigField::new(
            "tests.generateNewTests",
            false,
            "Generate tests for operations added since the last run",
        ),
    ]
}

/// Expands the catalog defaults into a nested `generation` mapping.
pub fn generation_defaults(is_new_sdk: bool) -> Mapping {
    let mut generation = Mapping::new();
    for field in generation_fields(is_new_sdk) {
        if let Some(value) = field.default_value {
            insert_dotted(&mut generation, field.name, value);
        }
    }
    generation
}

/// Looks up a dotted path in a nested mapping.
pub fn get_dotted<'a>(root: &'a Mapping, dotted: &str) -> Option<&'a Value> {
    let mut segments = dotted.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for segment in segments {
        current = current.as_mapping()?.get(segment)?;
    }
    Some(current)
}

/// Sets `value` at a dotted path, creating (or replacing non-mapping) parents.
pub fn insert_dotted(root: &mut Mapping, dotted: &str, value: Value) {
    let segments: Vec<&str> = dotted.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        let slot = current
            .entry(Value::from(*segment))
            .or_insert(Value::Mapping(Mapping::new()));
        if !slot.is_mapping() {
            *slot = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(Value::from(*last), value);
}

/// Deep-merges `layer` into `base`: mappings merge key by key, everything else
/// (sequences included) is replaced, and a null layer keeps the base.
pub fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Mapping(base), Value::Mapping(layer)) => {
            for (key, value) in layer {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (_, Value::Null) => {}
        (base, layer) => *base = layer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_expand_into_nested_maps() {
        let defaults = generation_defaults(true);
        assert_eq!(get_dotted(&defaults, "sdkClassName"), Some(&Value::from("SDK")));
        assert_eq!(
            get_dotted(&defaults, "usageSnippets.optionalPropertyRendering"),
            Some(&Value::from("withExample"))
        );
        assert_eq!(
            get_dotted(&defaults, "fixes.nameResolutionDec2023"),
            Some(&Value::from(true))
        );
        assert_eq!(
            get_dotted(&defaults, "comments.disableComments"),
            Some(&Value::from(false))
        );
    }

    #[test]
    fn fixes_default_off_for_existing_sdks() {
        let defaults = generation_defaults(false);
        assert_eq!(
            get_dotted(&defaults, "fixes.parameterOrderingFeb2024"),
            Some(&Value::from(false))
        );
        assert_eq!(
            get_dotted(&defaults, "auth.oAuth2ClientCredentialsEnabled"),
            Some(&Value::from(false))
        );
        assert_eq!(
            get_dotted(&defaults, "maintainOpenAPIOrder"),
            Some(&Value::from(true))
        );
    }

    #[test]
    fn insert_dotted_replaces_scalar_parents() {
        let mut root = Mapping::new();
        root.insert(Value::from("fixes"), Value::from(true));
        insert_dotted(&mut root, "fixes.nameResolutionDec2023", Value::from(false));
        assert_eq!(
            get_dotted(&root, "fixes.nameResolutionDec2023"),
            Some(&Value::from(false))
        );
    }

    #[test]
    fn merge_values_overlays_maps_and_replaces_lists() {
        let mut base: Value = serde_yaml::from_str("a: {x: 1, y: 2}\nlist: [1, 2]\nkeep: yes\n").unwrap();
        let layer: Value = serde_yaml::from_str("a: {y: 3}\nlist: [9]\nkeep: null\n").unwrap();
        merge_values(&mut base, layer);
        let expected: Value =
            serde_yaml::from_str("a: {x: 1, y: 3}\nlist: [9]\nkeep: yes\n").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn field_validation_uses_pattern() {
        let fields = generation_fields(false);
        let url = fields.iter().find(|f| f.name == "baseServerURL").unwrap();
        assert!(url.validate(&Value::from("https://api.example.com/v1")).is_ok());
        assert!(url.validate(&Value::from("")).is_ok());
        let err = url.validate(&Value::from("not a url")).unwrap_err();
        assert!(err.to_string().contains("Must be a valid server URL"));

        let class = fields.iter().find(|f| f.name == "sdkClassName").unwrap();
        assert!(class.validate(&Value::from("Acme.SDK")).is_ok());
        assert!(class.validate(&Value::from("Acme SDK")).is_err());
    }
}
