use tracing::debug;

use super::Workflow;
use super::source::SourceRegistry;
use super::target::{CodeSamples, LabelOverride};
use crate::registry::{is_registry_location, registry_location_for, registry_namespace};

const CODE_SAMPLES_SUFFIX: &str = "-code-samples";

/// Default code-sample labels keyed by target language.
pub const CODE_SAMPLE_LABELS: &[(&str, &str)] = &[
    ("typescript", "Typescript (SDK)"),
    ("go", "Go (SDK)"),
    ("python", "Python (SDK)"),
    ("java", "Java (SDK)"),
    ("csharp", "C# (SDK)"),
    ("php", "PHP (SDK)"),
    ("ruby", "Ruby (SDK)"),
    ("swift", "Swift (SDK)"),
    ("unity", "Unity (SDK)"),
    ("terraform", "Terraform"),
    ("postman", "Postman"),
];

/// Label used for `codeSamples.labelOverride.fixedValue` when none is configured.
pub fn default_code_sample_label(language: &str) -> String {
    if let Some((_, label)) = CODE_SAMPLE_LABELS.iter().find(|(lang, _)| *lang == language) {
        return (*label).to_string();
    }
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => format!("{}{} (SDK)", first.to_uppercase(), chars.as_str()),
        None => "SDK".to_string(),
    }
}

impl Workflow {
    /// Gives every target whose source is tracked in the registry a code-samples
    /// registry location of its own. Idempotent.
    pub fn migrate(&mut self) {
        for (target_id, target) in self.targets.iter_mut() {
            let source_namespace = self
                .sources
                .get(&target.source)
                .and_then(|source| source.registry.as_ref())
                .filter(|registry| is_registry_location(&registry.location))
                .map(|registry| registry_namespace(&registry.location));
            let Some(source_namespace) = source_namespace else {
                continue;
            };
            let synthesized =
                registry_location_for(&format!("{source_namespace}-{target_id}{CODE_SAMPLES_SUFFIX}"));

            let code_samples = target.code_samples.get_or_insert_with(CodeSamples::default);
            let existing = code_samples
                .registry
                .as_ref()
                .map(|registry| registry.location.clone())
                .filter(|location| !location.is_empty());

            match existing {
                Some(location) => {
                    let collapsed = collapse_doubled_suffix(&location);
                    let updated = if registry_namespace(&collapsed) == source_namespace {
                        synthesized
                    } else {
                        collapsed
                    };
                    if updated != location {
                        debug!(target = %target_id, from = %location, to = %updated, "rewrote code samples registry");
                        if let Some(registry) = code_samples.registry.as_mut() {
                            registry.location = updated;
                        }
                    }
                }
                None => {
                    debug!(target = %target_id, location = %synthesized, "added code samples registry");
                    match code_samples.registry.as_mut() {
                        Some(registry) => registry.location = synthesized,
                        None => code_samples.registry = Some(SourceRegistry::new(synthesized)),
                    }
                    if code_samples.output.is_none() {
                        code_samples.blocking.get_or_insert(false);
                        code_samples.label_override.get_or_insert_with(|| LabelOverride {
                            fixed_value: Some(default_code_sample_label(&target.target)),
                            omit: None,
                        });
                    }
                }
            }
        }
    }
}

fn collapse_doubled_suffix(location: &str) -> String {
    let doubled = format!("{CODE_SAMPLES_SUFFIX}{CODE_SAMPLES_SUFFIX}");
    let mut collapsed = location.to_string();
    while collapsed.contains(&doubled) {
        collapsed = collapsed.replace(&doubled, CODE_SAMPLES_SUFFIX);
    }
    collapsed
}
