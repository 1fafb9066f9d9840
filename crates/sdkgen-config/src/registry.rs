use std::fmt;

use crate::error::ConfigError;

/// Host every registry location must point at.
pub const REGISTRY_HOST: &str = "registry.speakeasyapi.dev";
/// Reference used when a location carries neither a tag nor a digest.
pub const DEFAULT_REFERENCE: &str = "latest";

/// Parsed form of `registry.speakeasyapi.dev/<org>/<workspace>/<name>[:tag|@sha256:digest]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryReference {
    pub organization_slug: String,
    pub workspace_slug: String,
    pub namespace_name: String,
    /// Tag, `sha256:`-prefixed digest, or `latest`.
    pub reference: String,
}

impl RegistryReference {
    /// `org/workspace/name`, without tag or digest.
    pub fn namespace_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.organization_slug, self.workspace_slug, self.namespace_name
        )
    }

    pub fn is_digest(&self) -> bool {
        self.reference.starts_with("sha256:")
    }
}

impl fmt::Display for RegistryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.is_digest() { '@' } else { ':' };
        write!(
            f,
            "{REGISTRY_HOST}/{}{separator}{}",
            self.namespace_id(),
            self.reference
        )
    }
}

/// Parses a registry location into its components.
pub fn parse_registry_location(location: &str) -> Result<RegistryReference, ConfigError> {
    let remainder = strip_registry_prefix(location)?;
    let parts: Vec<&str> = remainder.split('/').collect();
    if parts.len() != 3 {
        return Err(ConfigError::Validation(format!(
            "registry location {location} must have the form {REGISTRY_HOST}/<org>/<workspace>/<name>"
        )));
    }

    let (name, reference) = split_reference(parts[2]);
    if parts[0].is_empty() || parts[1].is_empty() || name.is_empty() {
        return Err(ConfigError::Validation(format!(
            "registry location {location} has an empty organization, workspace or name"
        )));
    }

    Ok(RegistryReference {
        organization_slug: parts[0].to_string(),
        workspace_slug: parts[1].to_string(),
        namespace_name: name.to_string(),
        reference: reference.to_string(),
    })
}

/// Checks the structural shape of a registry location: recognised host and exactly
/// two slashes in the namespace portion.
pub fn validate_registry_location(location: &str) -> Result<(), ConfigError> {
    let remainder = strip_registry_prefix(location)?;
    let slashes = remainder.matches('/').count();
    if slashes != 2 {
        return Err(ConfigError::Validation(format!(
            "registry location {location} must have the form {REGISTRY_HOST}/<org>/<workspace>/<name>"
        )));
    }
    Ok(())
}

/// Returns the namespace (`org/workspace/name`) of a location, dropping any tag or
/// digest. Locations without the registry host are returned trimmed of scheme only.
pub fn registry_namespace(location: &str) -> String {
    let without_scheme = strip_scheme(location);
    let remainder = without_scheme
        .strip_prefix(REGISTRY_HOST)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(without_scheme);
    let (namespace, _) = split_reference(remainder);
    namespace.to_string()
}

/// Builds a registry location from an `org/workspace/name` namespace.
pub fn registry_location_for(namespace: &str) -> String {
    format!("{REGISTRY_HOST}/{namespace}")
}

/// True when `location` points at the registry host, with or without scheme.
pub fn is_registry_location(location: &str) -> bool {
    strip_scheme(location).starts_with(&format!("{REGISTRY_HOST}/"))
}

fn strip_scheme(location: &str) -> &str {
    location
        .strip_prefix("https://")
        .or_else(|| location.strip_prefix("http://"))
        .unwrap_or(location)
}

fn strip_registry_prefix(location: &str) -> Result<&str, ConfigError> {
    strip_scheme(location)
        .strip_prefix(REGISTRY_HOST)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| {
            ConfigError::Validation(format!(
                "registry location {location} must start with {REGISTRY_HOST}/"
            ))
        })
}

/// Splits `name[:tag|@digest]` into the name and its reference.
fn split_reference(suffix: &str) -> (&str, &str) {
    if let Some((name, digest)) = suffix.split_once('@') {
        return (name, digest);
    }
    // Only the final segment may carry a tag.
    let last_slash = suffix.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    if let Some(idx) = suffix[last_slash..].find(':') {
        let split = last_slash + idx;
        return (&suffix[..split], &suffix[split + 1..]);
    }
    (suffix, DEFAULT_REFERENCE)
}
