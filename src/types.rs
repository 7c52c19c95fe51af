//! Core types for schema form compilation.

use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Presentation block keyword.
pub const PRESENTATION_KEY: &str = "x-jsf-presentation";

/// Custom error message map keyword.
pub const ERROR_MESSAGE_KEY: &str = "x-jsf-errorMessage";

/// Custom property order keyword.
pub const ORDER_KEY: &str = "x-jsf-order";

/// Schema keys that are modeled explicitly on [`Field`] or consumed while
/// building it (branches, item templates, ordering) and therefore never
/// copied into [`Field::attributes`].
pub const EXCLUDED_KEYS: &[&str] = &[
    "title",
    "type",
    "description",
    "required",
    ERROR_MESSAGE_KEY,
    PRESENTATION_KEY,
    ORDER_KEY,
    "oneOf",
    "anyOf",
    "allOf",
    "properties",
    "items",
    "if",
    "then",
    "else",
];

/// Serialized names of [`Field`] members. Flattened attributes never use
/// them, so a field serializes each key once.
pub const FIELD_MEMBER_KEYS: &[&str] = &[
    "name",
    "label",
    "description",
    "required",
    "inputType",
    "jsonType",
    "isVisible",
    "checkboxValue",
    "nameKey",
    "options",
    "fields",
    "errorMessage",
];

/// Primitive JSON Schema type names.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "string", "number", "integer", "boolean", "object", "array", "null",
];

/// A schema fragment viewed as a closed set of node shapes.
///
/// Boolean schemas are first-class: `true` accepts anything and produces no
/// field, `false` marks a field hidden. Fragments that are neither a boolean
/// nor an object are treated as `true`.
#[derive(Debug, Clone, Copy)]
pub enum SchemaNode<'a> {
    Literal(bool),
    Object(&'a Map<String, Value>),
}

impl<'a> SchemaNode<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => SchemaNode::Literal(*b),
            Value::Object(map) => SchemaNode::Object(map),
            _ => SchemaNode::Literal(true),
        }
    }
}

/// Categorical rendering type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputType {
    Text,
    Number,
    Select,
    Radio,
    Checkbox,
    Email,
    Date,
    File,
    Fieldset,
    GroupArray,
    /// Any other value supplied through `x-jsf-presentation.inputType`.
    Custom(String),
}

impl InputType {
    pub fn as_str(&self) -> &str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Select => "select",
            InputType::Radio => "radio",
            InputType::Checkbox => "checkbox",
            InputType::Email => "email",
            InputType::Date => "date",
            InputType::File => "file",
            InputType::Fieldset => "fieldset",
            InputType::GroupArray => "group-array",
            InputType::Custom(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => InputType::Text,
            "number" => InputType::Number,
            "select" => InputType::Select,
            "radio" => InputType::Radio,
            "checkbox" => InputType::Checkbox,
            "email" => InputType::Email,
            "date" => InputType::Date,
            "file" => InputType::File,
            "fieldset" => InputType::Fieldset,
            "group-array" => InputType::GroupArray,
            other => InputType::Custom(other.to_string()),
        }
    }
}

impl Serialize for InputType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The schema's declared `type`, single or multi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JsonType {
    Single(String),
    Multi(Vec<String>),
}

impl JsonType {
    pub fn from_schema(schema: &Map<String, Value>) -> Option<Self> {
        match schema.get("type")? {
            Value::String(s) => Some(JsonType::Single(s.clone())),
            Value::Array(arr) => Some(JsonType::Multi(
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        match self {
            JsonType::Single(s) => s == name,
            JsonType::Multi(types) => types.iter().any(|t| t == name),
        }
    }
}

/// One selectable choice of a select/radio field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Compiled, rendering-agnostic descriptor for one schema property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonType>,
    pub is_visible: bool,
    /// Value a checked checkbox stands for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkbox_value: Option<Value>,
    /// Original property key of an array-item child.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Arc<Vec<FieldOption>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub error_message: Map<String, Value>,
    /// Constraint keywords and presentation keys, spread flat.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Field {
    /// Look up a descendant by dotted name path, e.g. `"address.street"`.
    pub fn find(&self, path: &str) -> Option<&Field> {
        find_in(self.fields.as_deref()?, path)
    }

    /// Look up a constraint or presentation attribute.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Look up a field by dotted name path within a list of siblings.
pub fn find_in<'a>(fields: &'a [Field], path: &str) -> Option<&'a Field> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let field = fields.iter().find(|f| f.name == head)?;
    match rest {
        Some(rest) => field.find(rest),
        None => Some(field),
    }
}

/// Legacy behaviors kept for schemas written against older releases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyOptions {
    /// Suppress "not allowed" errors for values of properties a conditional
    /// branch turned into `false`. Visibility and required effects of the
    /// branch still apply.
    pub allow_forbidden_values: bool,
}

/// Options for form compilation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormConfig {
    /// Values used for the first build of the field tree.
    pub initial_values: Option<Value>,
    /// Require an explicit `x-jsf-presentation.inputType` on every field.
    pub strict_input_type: bool,
    pub legacy_options: LegacyOptions,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the first build with these values.
    pub fn initial_values(mut self, values: Value) -> Self {
        self.initial_values = Some(values);
        self
    }

    /// Fail fast when a field lacks an explicit presentation input type.
    pub fn strict_input_type(mut self, strict: bool) -> Self {
        self.strict_input_type = strict;
        self
    }

    /// Set `legacy_options.allow_forbidden_values`.
    pub fn allow_forbidden_values(mut self, allow: bool) -> Self {
        self.legacy_options.allow_forbidden_values = allow;
        self
    }
}
