//! Schema node classification.

use serde_json::{Map, Value};

use crate::types::PRIMITIVE_TYPES;

/// Structural kind of an object schema fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    MultiType,
    Unknown,
}

/// Classify a schema fragment.
///
/// Boolean schemas never reach this function; callers resolve
/// [`crate::SchemaNode::Literal`] first. Checks run in priority order and
/// the first match wins.
pub fn classify(schema: &Map<String, Value>) -> SchemaKind {
    let declared = schema.get("type");

    if let Some(Value::Array(types)) = declared {
        if !types.is_empty()
            && types
                .iter()
                .all(|t| t.as_str().is_some_and(|t| PRIMITIVE_TYPES.contains(&t)))
        {
            return SchemaKind::MultiType;
        }
    }

    let type_name = declared.and_then(Value::as_str);

    let untyped_object = declared.is_none()
        && (schema.contains_key("properties")
            || schema.contains_key("required")
            || schema.contains_key("if"));
    if type_name == Some("object") || untyped_object {
        return SchemaKind::Object;
    }

    match type_name {
        Some("number") | Some("integer") => SchemaKind::Number,
        Some("string") => SchemaKind::String,
        Some("boolean") => SchemaKind::Boolean,
        None if schema.get("const").is_some_and(Value::is_boolean) => SchemaKind::Boolean,
        Some("array") => SchemaKind::Array,
        Some("null") => SchemaKind::Null,
        _ => SchemaKind::Unknown,
    }
}

/// Kind used for input type mapping: multi-type schemas map as their first
/// declared type.
pub fn primary_kind(schema: &Map<String, Value>) -> SchemaKind {
    match classify(schema) {
        SchemaKind::MultiType => {
            let first = schema
                .get("type")
                .and_then(Value::as_array)
                .and_then(|types| types.first())
                .cloned()
                .unwrap_or(Value::Null);
            let mut single = Map::new();
            single.insert("type".to_string(), first);
            classify(&single)
        }
        kind => kind,
    }
}
