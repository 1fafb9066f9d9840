//! Field-wise overlay of a partial workflow (`workflow.local.yaml`) onto a base.
//!
//! Non-empty local scalars win, lists are replaced wholesale, nested records and map
//! entries present on both sides are merged recursively.

use std::collections::BTreeMap;

use super::publishing::Publishing;
use super::source::{Document, Source, SourcePublishing, SourceRegistry};
use super::target::{CodeSamples, Dependent, LabelOverride, MockServer, Target, Testing};
use super::Workflow;

/// Overlays `other` onto `self`.
pub trait Merge {
    fn merge(&mut self, other: Self);
}

impl Merge for String {
    fn merge(&mut self, other: Self) {
        if !other.is_empty() {
            *self = other;
        }
    }
}

impl Merge for bool {
    fn merge(&mut self, other: Self) {
        *self = other;
    }
}

impl<T: Merge> Merge for Option<T> {
    fn merge(&mut self, other: Self) {
        let Some(other) = other else {
            return;
        };
        if let Some(base) = self.as_mut() {
            base.merge(other);
        } else {
            *self = Some(other);
        }
    }
}

impl<T> Merge for Vec<T> {
    fn merge(&mut self, other: Self) {
        if !other.is_empty() {
            *self = other;
        }
    }
}

impl<T: Merge> Merge for BTreeMap<String, T> {
    fn merge(&mut self, other: Self) {
        for (key, value) in other {
            match self.get_mut(&key) {
                Some(base) => base.merge(value),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

impl Merge for Workflow {
    fn merge(&mut self, other: Self) {
        self.version.merge(other.version);
        self.speakeasy_version.merge(other.speakeasy_version);
        self.sources.merge(other.sources);
        self.targets.merge(other.targets);
        self.dependents.merge(other.dependents);
    }
}

impl Merge for Source {
    fn merge(&mut self, other: Self) {
        self.inputs.merge(other.inputs);
        self.overlays.merge(other.overlays);
        self.output.merge(other.output);
        self.ruleset.merge(other.ruleset);
        self.registry.merge(other.registry);
        self.publish.merge(other.publish);
    }
}

impl Merge for Document {
    fn merge(&mut self, other: Self) {
        self.location.merge(other.location);
        self.auth_header.merge(other.auth_header);
        self.auth_secret.merge(other.auth_secret);
    }
}

impl Merge for SourceRegistry {
    fn merge(&mut self, other: Self) {
        self.location.merge(other.location);
        self.tags.merge(other.tags);
    }
}

impl Merge for SourcePublishing {
    fn merge(&mut self, other: Self) {
        self.location.merge(other.location);
    }
}

impl Merge for Target {
    fn merge(&mut self, other: Self) {
        self.target.merge(other.target);
        self.source.merge(other.source);
        self.output.merge(other.output);
        self.publishing.merge(other.publishing);
        self.code_samples.merge(other.code_samples);
        self.testing.merge(other.testing);
    }
}

impl Merge for Publishing {
    // Credential blocks are opaque: a local block replaces the base block.
    fn merge(&mut self, other: Self) {
        replace_some(&mut self.npm, other.npm);
        replace_some(&mut self.pypi, other.pypi);
        replace_some(&mut self.packagist, other.packagist);
        replace_some(&mut self.java, other.java);
        replace_some(&mut self.rubygems, other.rubygems);
        replace_some(&mut self.nuget, other.nuget);
        replace_some(&mut self.terraform, other.terraform);
    }
}

impl Merge for CodeSamples {
    fn merge(&mut self, other: Self) {
        self.output.merge(other.output);
        self.registry.merge(other.registry);
        self.style.merge(other.style);
        self.lang_override.merge(other.lang_override);
        self.label_override.merge(other.label_override);
        self.blocking.merge(other.blocking);
    }
}

impl Merge for LabelOverride {
    fn merge(&mut self, other: Self) {
        self.fixed_value.merge(other.fixed_value);
        self.omit.merge(other.omit);
    }
}

impl Merge for Testing {
    fn merge(&mut self, other: Self) {
        self.enabled.merge(other.enabled);
        self.mock_server.merge(other.mock_server);
    }
}

impl Merge for MockServer {
    fn merge(&mut self, other: Self) {
        self.enabled.merge(other.enabled);
    }
}

impl Merge for Dependent {
    fn merge(&mut self, other: Self) {
        self.location.merge(other.location);
        self.clone_command.merge(other.clone_command);
    }
}

fn replace_some<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}
