//! Structural validation of persisted state records
//!
//! Validates a raw JSON record against the state schema, then layers on the
//! domain checks a schema cannot express: strict version equality and
//! next/previous links resolving to arena keys. Runs before deserialization
//! so a damaged record is reported instead of half-decoded.

use anyhow::{Context, Result};
use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::models::feature::STATE_VERSION;

/// Embedded default schema; an external schema document may override it
const STATE_SCHEMA: &str = include_str!("../../schemas/state.schema.json");

/// Outcome of validating one record
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Compiled schema plus the domain checks for state records
pub struct StateValidator {
    validator: Validator,
}

impl StateValidator {
    /// Validator backed by the embedded schema
    pub fn new() -> Result<Self> {
        let schema: JsonValue = serde_json::from_str(STATE_SCHEMA)
            .context("Embedded state schema is not valid JSON")?;
        Self::from_schema(&schema)
    }

    /// Validator backed by an external schema document (JSON or YAML)
    pub fn from_schema_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema: {}", path.display()))?;

        let is_yaml = path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml");
        let schema: JsonValue = if is_yaml {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse schema: {}", path.display()))?;
            serde_json::to_value(yaml)
                .with_context(|| format!("Failed to convert schema: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse schema: {}", path.display()))?
        };

        Self::from_schema(&schema)
    }

    fn from_schema(schema: &JsonValue) -> Result<Self> {
        let validator = Validator::new(schema)
            .map_err(|e| anyhow::anyhow!("Failed to compile state schema: {}", e))?;
        Ok(Self { validator })
    }

    /// Validate a parsed record
    pub fn validate_value(&self, record: &JsonValue) -> ValidationReport {
        let mut errors = Vec::new();

        for error in self.validator.iter_errors(record) {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                errors.push(error.to_string());
            } else {
                errors.push(format!("{}: {}", path, error));
            }
        }

        errors.extend(domain_errors(record));

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Validate raw record text
    pub fn validate_str(&self, content: &str) -> Result<ValidationReport> {
        let record: JsonValue =
            serde_json::from_str(content).context("State record is not valid JSON")?;
        Ok(self.validate_value(&record))
    }
}

/// Checks the schema cannot express: version equality and link resolution
fn domain_errors(record: &JsonValue) -> Vec<String> {
    let mut errors = Vec::new();

    match record.get("version").and_then(|v| v.as_str()) {
        Some(version) if version == STATE_VERSION => {}
        Some(version) => errors.push(format!(
            "Invalid version: {} (expected {})",
            version, STATE_VERSION
        )),
        None => errors.push("Missing required field: version".to_string()),
    }

    let Some(tasks) = record.get("tasks").and_then(|t| t.as_object()) else {
        return errors;
    };

    for (key, task) in tasks {
        if task.get("id").and_then(|v| v.as_str()) != Some(key.as_str()) {
            errors.push(format!("Task {}: id field does not match its key", key));
        }
        for field in ["nextTask", "previousTask"] {
            if let Some(target) = task.get(field).and_then(|v| v.as_str()) {
                if !tasks.contains_key(target) {
                    errors.push(format!("Task {}: {} {} not found", key, field, target));
                }
            }
        }
    }

    errors
}
