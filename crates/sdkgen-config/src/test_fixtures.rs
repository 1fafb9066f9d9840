//! Contract test fixtures declared in `.speakeasy/tests.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::ordered_map::OrderedMap;
use crate::workspace::{FindOptions, find_workspace};

pub const TESTS_VERSION: &str = "0.0.1";
pub const TESTS_FILE: &str = "tests.yaml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tests {
    #[serde(default)]
    pub tests_version: String,
    /// Operation id to the tests exercising it, in file order.
    #[serde(default)]
    pub tests: OrderedMap<String, Vec<Test>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target ids the test applies to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Content type to request body.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub request_body: OrderedMap<String, Value>,
    /// Status code to expected response.
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub responses: OrderedMap<String, ResponseExpectation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub path: OrderedMap<String, Value>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub query: OrderedMap<String, Value>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub header: OrderedMap<String, Value>,
}

/// Either `true` (status only) or content type to expected body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseExpectation {
    StatusOnly(bool),
    Bodies(OrderedMap<String, Value>),
}

impl ResponseExpectation {
    fn body_count(&self) -> usize {
        match self {
            ResponseExpectation::StatusOnly(_) => 0,
            ResponseExpectation::Bodies(bodies) => bodies.len(),
        }
    }
}

impl Tests {
    pub fn from_yaml(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(data)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tests_version != TESTS_VERSION {
            return Err(ConfigError::VersionUnsupported(format!(
                "testsVersion {:?} is not supported, expected {TESTS_VERSION}",
                self.tests_version
            )));
        }

        for (operation, tests) in &self.tests {
            if operation.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "test group keys must name an operation".into(),
                ));
            }
            for (idx, test) in tests.iter().enumerate() {
                test.validate()
                    .map_err(|err| err.context(format!("tests.{operation}[{idx}]")))?;
            }
        }
        Ok(())
    }
}

impl Test {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name is required".into()));
        }
        if self.request_body.len() > 1 {
            return Err(ConfigError::Validation(format!(
                "test {}: requestBody must have at most one content type",
                self.name
            )));
        }
        if self.responses.len() > 1 {
            return Err(ConfigError::Validation(format!(
                "test {}: responses must have at most one status code",
                self.name
            )));
        }
        for (status, expectation) in &self.responses {
            if expectation.body_count() > 1 {
                return Err(ConfigError::Validation(format!(
                    "test {}: response {status} must have at most one content type",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Finds `.speakeasy/tests.yaml` at or above `working_dir`, parses and validates it.
pub fn load_tests(
    working_dir: impl AsRef<Path>,
    fs: &dyn FileSystem,
) -> Result<(Tests, PathBuf), ConfigError> {
    let found = find_workspace(
        working_dir,
        &FindOptions::file(TESTS_FILE).recursive(true),
        fs,
    )?;
    let tests = Tests::from_yaml(found.data.as_deref().unwrap_or_default())
        .and_then(|tests| tests.validate().map(|_| tests))
        .map_err(|err| err.context(found.path.display()))?;
    Ok((tests, found.path))
}
