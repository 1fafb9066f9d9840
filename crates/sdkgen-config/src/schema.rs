//! JSON Schema for `workflow.yaml`, generated from the workflow model.
//!
//! The rendered schema is committed at `schemas/workflow.schema.json`; regenerate it
//! with `sdkgen-config schema --output crates/sdkgen-config/schemas/workflow.schema.json`.

use schemars::generate::SchemaSettings;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::workflow::Workflow;

/// The committed rendering of [`workflow_schema_pretty`].
pub const COMMITTED_WORKFLOW_SCHEMA: &str = include_str!("../schemas/workflow.schema.json");

pub const JSON_SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Reflects [`Workflow`] into a draft 2020-12 schema. Nested types are emitted as
/// `$defs` references and the root rejects unknown properties.
pub fn workflow_schema() -> Result<Value, ConfigError> {
    let schema = SchemaSettings::draft2020_12()
        .into_generator()
        .into_root_schema_for::<Workflow>();
    let mut value = serde_json::to_value(&schema)?;

    if let Value::Object(root) = &mut value {
        if let Some(definitions) = root.remove("definitions") {
            let defs = root
                .entry("$defs")
                .or_insert_with(|| Value::Object(Map::new()));
            if let (Value::Object(defs), Value::Object(definitions)) = (defs, definitions) {
                defs.extend(definitions);
            }
        }
        root.insert("$schema".into(), Value::from(JSON_SCHEMA_DRAFT));
        root.insert("additionalProperties".into(), Value::Bool(false));
    }

    Ok(relabel_refs(value))
}

/// Pretty-printed schema with a trailing newline, as committed to disk.
pub fn workflow_schema_pretty() -> Result<String, ConfigError> {
    let mut text = serde_json::to_string_pretty(&workflow_schema()?)?;
    text.push('\n');
    Ok(text)
}

fn relabel_refs(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("$ref", Value::String(target)) => {
                            Value::String(target.replace("#/definitions/", "#/$defs/"))
                        }
                        (_, other) => relabel_refs(other),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(relabel_refs).collect()),
        other => other,
    }
}
