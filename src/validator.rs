//! Constraint validation contract and the default `jsonschema` adapter.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::error::ValidatorError;

/// One segment of an instance path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Key used for this segment in a [`crate::FormErrors`] tree.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

/// Single validation error as produced by a [`Validator`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawError {
    /// Path to the offending value; empty for whole-instance errors.
    pub path: Vec<PathSegment>,
    /// Schema keyword that failed (e.g. `required`, `minLength`, `false`).
    pub keyword: String,
    /// Human-readable message.
    pub message: String,
}

/// Keyword reported for values rejected by a `false` schema.
pub const FALSE_SCHEMA_KEYWORD: &str = "false";

/// Pluggable constraint validator.
///
/// The form compiler only interprets schema structure; every constraint
/// check goes through this trait.
pub trait Validator {
    /// Whether `value` satisfies `schema`.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::InvalidSchema` if `schema` cannot be compiled.
    fn is_valid(&self, value: &Value, schema: &Value) -> Result<bool, ValidatorError>;

    /// Collect every error of `values` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::InvalidSchema` if `schema` cannot be compiled.
    fn validate(&self, values: &Value, schema: &Value) -> Result<Vec<RawError>, ValidatorError>;
}

/// [`Validator`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl JsonSchemaValidator {
    fn compile(schema: &Value) -> Result<jsonschema::Validator, ValidatorError> {
        jsonschema::validator_for(schema).map_err(|e| ValidatorError::InvalidSchema {
            message: e.to_string(),
        })
    }
}

impl Validator for JsonSchemaValidator {
    fn is_valid(&self, value: &Value, schema: &Value) -> Result<bool, ValidatorError> {
        Ok(Self::compile(schema)?.is_valid(value))
    }

    fn validate(&self, values: &Value, schema: &Value) -> Result<Vec<RawError>, ValidatorError> {
        let validator = Self::compile(schema)?;

        let errors = validator
            .iter_errors(values)
            .map(|e| {
                let mut path = parse_instance_path(&e.instance_path.to_string(), values);
                let keyword = match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        // Reported at the parent object; point at the property itself.
                        if let Some(name) = property.as_str() {
                            path.push(PathSegment::Key(name.to_string()));
                        }
                        "required".to_string()
                    }
                    ValidationErrorKind::FalseSchema => FALSE_SCHEMA_KEYWORD.to_string(),
                    _ => last_pointer_segment(&e.schema_path.to_string()),
                };
                RawError {
                    path,
                    keyword,
                    message: e.to_string(),
                }
            })
            .collect();

        Ok(errors)
    }
}

/// Split a JSON Pointer into typed segments.
///
/// Numeric segments are indices only where the instance at that point is an
/// array, so an object key `"0"` stays a key.
pub fn parse_instance_path(pointer: &str, instance: &Value) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    if pointer.is_empty() {
        return segments;
    }

    let mut current = Some(instance);
    for part in pointer.trim_start_matches('/').split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        let segment = match (current, key.parse::<usize>()) {
            (Some(Value::Array(_)), Ok(index)) => PathSegment::Index(index),
            _ => PathSegment::Key(key),
        };
        current = match (&segment, current) {
            (PathSegment::Index(i), Some(value)) => value.get(*i),
            (PathSegment::Key(k), Some(value)) => value.get(k.as_str()),
            (_, None) => None,
        };
        segments.push(segment);
    }
    segments
}

fn last_pointer_segment(pointer: &str) -> String {
    pointer
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .replace("~1", "/")
        .replace("~0", "~")
}
