//! Model loading with schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

use crate::model::Model;

/// JSON Schema every model file must satisfy.
pub const MODEL_SCHEMA: &str = include_str!("../../schemas/model/v1.schema.json");

/// Load a model from disk, validating it against [`MODEL_SCHEMA`] first.
pub fn load_model(path: &Path) -> Result<Model> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read model {}", path.display()))?;
    parse_model(&contents).with_context(|| format!("load model {}", path.display()))
}

/// Parse and schema-check model JSON held in memory.
pub fn parse_model(contents: &str) -> Result<Model> {
    let value: Value = serde_json::from_str(contents).context("parse model json")?;
    validate_schema(&value)?;
    serde_json::from_value(value).context("deserialize model")
}

fn validate_schema(model: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(MODEL_SCHEMA).context("parse model schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(model) {
        let messages = compiled
            .iter_errors(model)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "model schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
