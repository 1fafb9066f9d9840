use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::source::validate_secret;
use crate::error::ConfigError;

/// Language-specific package registry credentials for a target.
///
/// At most the block matching the target's language may be present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Publishing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm: Option<Npm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi: Option<PyPi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packagist: Option<Packagist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<Java>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubygems: Option<RubyGems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuget: Option<NuGet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform: Option<Terraform>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Npm {
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PyPi {
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Packagist {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Java {
    #[serde(default)]
    pub ossrh_username: String,
    #[serde(default)]
    pub ossrh_password: String,
    #[serde(default)]
    pub gpg_secret_key: String,
    #[serde(default)]
    pub gpg_pass_phrase: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_sonatype_legacy: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RubyGems {
    #[serde(default)]
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NuGet {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Terraform {
    #[serde(default)]
    pub gpg_private_key: String,
    #[serde(default)]
    pub gpg_pass_phrase: String,
}

impl Publishing {
    /// Validates the credential block for `target`.
    ///
    /// A block for any other language is rejected rather than ignored.
    pub fn validate(&self, target: &str) -> Result<(), ConfigError> {
        for block in self.present_blocks() {
            if block != publishing_block_for(target) {
                return Err(ConfigError::Validation(format!(
                    "publishing.{block} is not supported for target language {target}"
                )));
            }
        }

        if let Some(npm) = &self.npm {
            validate_secret("publishing.npm.token", &npm.token)?;
        }
        if let Some(pypi) = &self.pypi {
            validate_secret("publishing.pypi.token", &pypi.token)?;
        }
        if let Some(packagist) = &self.packagist {
            require("publishing.packagist.username", &packagist.username)?;
            validate_secret("publishing.packagist.token", &packagist.token)?;
        }
        if let Some(java) = &self.java {
            require("publishing.java.ossrhUsername", &java.ossrh_username)?;
            validate_secret("publishing.java.ossrhPassword", &java.ossrh_password)?;
            validate_secret("publishing.java.gpgSecretKey", &java.gpg_secret_key)?;
            validate_secret("publishing.java.gpgPassPhrase", &java.gpg_pass_phrase)?;
        }
        if let Some(rubygems) = &self.rubygems {
            validate_secret("publishing.rubygems.token", &rubygems.token)?;
        }
        if let Some(nuget) = &self.nuget {
            validate_secret("publishing.nuget.apiKey", &nuget.api_key)?;
        }
        if let Some(terraform) = &self.terraform {
            validate_secret("publishing.terraform.gpgPrivateKey", &terraform.gpg_private_key)?;
            validate_secret("publishing.terraform.gpgPassPhrase", &terraform.gpg_pass_phrase)?;
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.present_blocks().is_empty()
    }

    fn present_blocks(&self) -> Vec<&'static str> {
        let mut blocks = Vec::new();
        if self.npm.is_some() {
            blocks.push("npm");
        }
        if self.pypi.is_some() {
            blocks.push("pypi");
        }
        if self.packagist.is_some() {
            blocks.push("packagist");
        }
        if self.java.is_some() {
            blocks.push("java");
        }
        if self.rubygems.is_some() {
            blocks.push("rubygems");
        }
        if self.nuget.is_some() {
            blocks.push("nuget");
        }
        if self.terraform.is_some() {
            blocks.push("terraform");
        }
        blocks
    }
}

/// Name of the publishing block a target language may carry.
fn publishing_block_for(target: &str) -> &'static str {
    match target {
        "typescript" => "npm",
        "python" => "pypi",
        "php" => "packagist",
        "java" => "java",
        "ruby" => "rubygems",
        "csharp" => "nuget",
        "terraform" => "terraform",
        _ => "",
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} is required")));
    }
    Ok(())
}
