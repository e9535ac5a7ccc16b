//! Request Validator

use crate::error::ValidationError;
use crate::features::{FeatureSet, FEATURE_COUNT, FEATURE_NAMES};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Validates raw feature maps and fills omitted fields from a default table
#[derive(Debug, Clone)]
pub struct Validator {
    defaults: FeatureSet,
}

impl Validator {
    /// Create a validator that fills gaps from `defaults`
    pub fn new(defaults: FeatureSet) -> Self {
        Self { defaults }
    }

    /// Validate a request body and produce a fully populated feature set.
    ///
    /// Rules are checked in order and the first violation is returned:
    /// object shape, unknown keys, at least one truthy value, then per-field
    /// defaulting and numeric parsing in model input order.
    pub fn validate(&self, input: &Value) -> Result<FeatureSet, ValidationError> {
        let map = input.as_object().ok_or_else(|| {
            warn!("Validation failed: input is not an object");
            ValidationError::InvalidInputShape
        })?;

        check_known_fields(map)?;

        // An explicit 0 counts as "not provided" here.
        if !map.values().any(is_truthy) {
            warn!("Validation failed: No features provided.");
            return Err(ValidationError::NoFeaturesProvided);
        }

        let mut row = self.defaults.to_row();
        let mut defaulted = 0;
        for (index, field) in FEATURE_NAMES.iter().enumerate() {
            match map.get(*field) {
                None | Some(Value::Null) => defaulted += 1,
                Some(value) => row[index] = parse_number(field, value)?,
            }
        }

        debug!("{} of {} fields defaulted", defaulted, FEATURE_COUNT);
        info!("Validation successful. Missing values set to defaults.");
        Ok(FeatureSet::from_row(row))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(FeatureSet::default())
    }
}

fn check_known_fields(map: &Map<String, Value>) -> Result<(), ValidationError> {
    let mut unknown: Vec<String> = map
        .keys()
        .filter(|key| !FEATURE_NAMES.contains(&key.as_str()))
        .cloned()
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort();
    warn!("Validation failed: unknown fields {:?}", unknown);
    Err(ValidationError::UnknownField {
        fields: unknown,
        allowed: FEATURE_NAMES.to_vec(),
    })
}

/// Generic truthiness: null, false, zero, and empty strings/arrays/objects are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn parse_number(field: &'static str, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.ok_or_else(|| ValidationError::InvalidFieldValue {
        field,
        value: value.to_string(),
    })
}
