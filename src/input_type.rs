//! Input type derivation from schema shape and presentation overrides.

use serde_json::{Map, Value};

use crate::classify::{primary_kind, SchemaKind};
use crate::error::FormError;
use crate::types::InputType;

/// Derive the input type of a field.
///
/// `presentation` is the merged presentation block; for a hidden field it
/// must come from the field's original schema so the explicit type survives
/// hiding. The root schema never becomes a field and is not checked here.
///
/// # Errors
///
/// Returns `FormError::MissingInputType` when `strict` is set and no
/// presentation `inputType` exists.
pub fn input_type(
    name: &str,
    schema: &Map<String, Value>,
    presentation: &Map<String, Value>,
    strict: bool,
) -> Result<InputType, FormError> {
    if let Some(explicit) = presentation.get("inputType").and_then(Value::as_str) {
        return Ok(InputType::parse(explicit));
    }

    if strict {
        return Err(FormError::MissingInputType {
            field: name.to_string(),
        });
    }

    Ok(derived_input_type(schema))
}

/// Input type implied by the schema alone.
pub fn derived_input_type(schema: &Map<String, Value>) -> InputType {
    if !schema.contains_key("type") {
        if items_have_properties(schema) {
            return InputType::GroupArray;
        }
        if schema.contains_key("properties") {
            return InputType::Select;
        }
    }

    match primary_kind(schema) {
        SchemaKind::String => match schema.get("format").and_then(Value::as_str) {
            Some("email") => InputType::Email,
            Some("date") => InputType::Date,
            Some("data-url") => InputType::File,
            _ if schema.contains_key("oneOf") => InputType::Radio,
            _ => InputType::Text,
        },
        SchemaKind::Number => InputType::Number,
        SchemaKind::Object => InputType::Fieldset,
        SchemaKind::Array if items_have_properties(schema) => InputType::GroupArray,
        SchemaKind::Array => InputType::Select,
        SchemaKind::Boolean => InputType::Checkbox,
        SchemaKind::Null | SchemaKind::MultiType | SchemaKind::Unknown => InputType::Text,
    }
}

fn items_have_properties(schema: &Map<String, Value>) -> bool {
    schema
        .get("items")
        .and_then(|items| items.get("properties"))
        .is_some()
}
