//! Field tree construction.
//!
//! Building is a mutual recursion between "resolve the conditionals of an
//! object scope" and "build the children of that scope". Every call gets its
//! schema, the original (pre-branch) schema and the value at that scope
//! explicitly; there is no shared traversal state.

use serde_json::{Map, Value};

use crate::classify::{primary_kind, SchemaKind};
use crate::conditions::resolve_scope;
use crate::error::FormError;
use crate::input_type::input_type;
use crate::options::{extract_options, OptionCache};
use crate::order::{order_fields, order_hint};
use crate::types::{
    Field, InputType, JsonType, SchemaNode, ERROR_MESSAGE_KEY, EXCLUDED_KEYS, FIELD_MEMBER_KEYS,
    PRESENTATION_KEY,
};
use crate::validator::Validator;

/// Maximum schema nesting depth before building fails.
pub const MAX_DEPTH: usize = 64;

static NULL: Value = Value::Null;

/// Builds field trees for one form.
pub struct FieldBuilder<'a> {
    validator: &'a dyn Validator,
    cache: &'a OptionCache,
    strict: bool,
}

impl<'a> FieldBuilder<'a> {
    pub fn new(validator: &'a dyn Validator, cache: &'a OptionCache, strict: bool) -> Self {
        Self {
            validator,
            cache,
            strict,
        }
    }

    /// Build the top-level fields of `schema` for `values`.
    ///
    /// A boolean or non-object root schema has no fields.
    pub fn build_root(&self, schema: &Value, values: &Value) -> Result<Vec<Field>, FormError> {
        match SchemaNode::from_value(schema) {
            SchemaNode::Object(map) => self.build_object_children(map, map, values, "", 0),
            SchemaNode::Literal(_) => Ok(Vec::new()),
        }
    }

    /// Build the field for one property.
    ///
    /// Returns `None` for a `true` schema. A `false` schema yields a hidden
    /// field shaped after `original`.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for strict-mode violations, unsupported array
    /// items or excessive nesting.
    #[allow(clippy::too_many_arguments)]
    pub fn build_field(
        &self,
        schema: &Value,
        name: &str,
        required: bool,
        original: &Value,
        value: &Value,
        parent_path: &str,
        depth: usize,
    ) -> Result<Option<Field>, FormError> {
        let path = join_path(parent_path, name);
        if depth > MAX_DEPTH {
            return Err(FormError::DepthExceeded {
                field: path,
                limit: MAX_DEPTH,
            });
        }

        let site = Site {
            name,
            path,
            required,
            value,
            depth,
        };

        match SchemaNode::from_value(schema) {
            SchemaNode::Literal(true) => Ok(None),
            SchemaNode::Literal(false) => {
                log::debug!("field '{}' is hidden", site.path);
                let empty = Map::new();
                let source = original.as_object().unwrap_or(&empty);
                self.compose(source, source, &site, false).map(Some)
            }
            SchemaNode::Object(map) => {
                let original_map = original.as_object().unwrap_or(map);
                self.compose(map, original_map, &site, true).map(Some)
            }
        }
    }

    fn compose(
        &self,
        schema: &Map<String, Value>,
        original: &Map<String, Value>,
        site: &Site<'_>,
        visible: bool,
    ) -> Result<Field, FormError> {
        let presentation = merged_block(original, schema, PRESENTATION_KEY);
        let error_message = merged_block(original, schema, ERROR_MESSAGE_KEY);
        let input_type = input_type(&site.path, schema, &presentation, self.strict)?;
        let json_type = JsonType::from_schema(schema);

        let mut label = text_of(schema, "title");
        let mut description = text_of(schema, "description");

        let mut attributes = Map::new();
        for (key, value) in schema {
            let key = key.as_str();
            if !EXCLUDED_KEYS.contains(&key) && !FIELD_MEMBER_KEYS.contains(&key) {
                attributes.insert(key.to_string(), value.clone());
            }
        }
        // Presentation text replaces the schema's; other member names are dropped.
        for (key, value) in &presentation {
            match key.as_str() {
                "label" => {
                    label = value.as_str().map(String::from).or(label);
                }
                "description" => {
                    description = value.as_str().map(String::from).or(description);
                }
                key if FIELD_MEMBER_KEYS.contains(&key) => {}
                key => {
                    attributes.insert(key.to_string(), value.clone());
                }
            }
        }

        let checkbox_value = if input_type == InputType::Checkbox {
            schema.get("const").cloned().or_else(|| {
                json_type
                    .as_ref()
                    .filter(|t| t.is("boolean"))
                    .map(|_| Value::Bool(true))
            })
        } else {
            None
        };

        let options = extract_options(schema, self.cache);
        let fields = if options.is_some() {
            None
        } else {
            // Nullable composites build children like their first type.
            match primary_kind(schema) {
                SchemaKind::Object if visible => Some(self.build_object_children(
                    schema,
                    original,
                    site.value,
                    &site.path,
                    site.depth,
                )?),
                SchemaKind::Array if visible => Some(self.build_item_children(
                    schema,
                    original,
                    &site.path,
                    site.depth,
                )?),
                SchemaKind::Object | SchemaKind::Array => Some(Vec::new()),
                _ => None,
            }
        };

        Ok(Field {
            name: site.name.to_string(),
            label,
            description,
            required: site.required,
            input_type,
            json_type,
            is_visible: visible,
            checkbox_value,
            name_key: None,
            options,
            fields,
            error_message,
            attributes,
        })
    }

    /// Resolve the conditionals of an object scope and build one field per
    /// effective property.
    fn build_object_children(
        &self,
        schema: &Map<String, Value>,
        original: &Map<String, Value>,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Vec<Field>, FormError> {
        let empty = Value::Object(Map::new());
        let scope_value = if value.is_object() { value } else { &empty };
        let scope = resolve_scope(schema, scope_value, self.validator);

        let original_props = original.get("properties").and_then(Value::as_object);
        let base_props = schema.get("properties").and_then(Value::as_object);

        let mut children = Vec::with_capacity(scope.properties.len());
        for (key, effective) in &scope.properties {
            let child_original = original_props
                .and_then(|p| p.get(key))
                .or_else(|| base_props.and_then(|p| p.get(key)))
                .unwrap_or(effective);
            let child_value = scope_value.get(key).unwrap_or(&NULL);

            if let Some(field) = self.build_field(
                effective,
                key,
                scope.is_required(key),
                child_original,
                child_value,
                path,
                depth + 1,
            )? {
                children.push(field);
            }
        }

        Ok(match order_hint(schema).or_else(|| order_hint(original)) {
            Some(order) => order_fields(children, &order),
            None => children,
        })
    }

    /// Build the children of an array field from its object item schema.
    ///
    /// The item schema is a template shared by every array entry, so its
    /// conditionals resolve against an empty item.
    fn build_item_children(
        &self,
        schema: &Map<String, Value>,
        original: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Vec<Field>, FormError> {
        let item = match schema.get("items").map(SchemaNode::from_value) {
            Some(SchemaNode::Object(item)) if primary_kind(item) == SchemaKind::Object => item,
            _ => {
                return Err(FormError::UnsupportedArrayItems {
                    field: path.to_string(),
                })
            }
        };
        let original_item = original
            .get("items")
            .and_then(Value::as_object)
            .unwrap_or(item);

        let mut children = self.build_object_children(item, original_item, &NULL, path, depth)?;
        for child in &mut children {
            child.name_key = Some(child.name.clone());
        }
        Ok(children)
    }
}

/// Where a field sits in the tree and the value it currently holds.
struct Site<'s> {
    name: &'s str,
    path: String,
    required: bool,
    value: &'s Value,
    depth: usize,
}

fn text_of(schema: &Map<String, Value>, key: &str) -> Option<String> {
    schema.get(key).and_then(Value::as_str).map(String::from)
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Merge a keyword's object value from `original` then `current`, current
/// winning per key.
fn merged_block(
    original: &Map<String, Value>,
    current: &Map<String, Value>,
    key: &str,
) -> Map<String, Value> {
    let mut merged = Map::new();
    for source in [original, current] {
        if let Some(Value::Object(block)) = source.get(key) {
            for (k, v) in block {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::JsonSchemaValidator;
    use serde_json::json;
    use std::sync::Arc;

    fn build(schema: Value, values: Value) -> Result<Vec<Field>, FormError> {
        let cache = OptionCache::new();
        FieldBuilder::new(&JsonSchemaValidator, &cache, false).build_root(&schema, &values)
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn builds_leaf_fields() {
        let fields = build(
            json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "title": "Username",
                        "description": "Pick one",
                        "minLength": 3,
                        "x-jsf-presentation": { "placeholder": "jane" }
                    },
                    "age": { "type": "integer", "minimum": 0 }
                },
                "required": ["username"]
            }),
            json!({}),
        )
        .unwrap();

        assert_eq!(names(&fields), vec!["username", "age"]);
        let username = &fields[0];
        assert_eq!(username.label.as_deref(), Some("Username"));
        assert_eq!(username.description.as_deref(), Some("Pick one"));
        assert!(username.required);
        assert!(username.is_visible);
        assert_eq!(username.input_type, InputType::Text);
        assert_eq!(username.attr("minLength"), Some(&json!(3)));
        assert_eq!(username.attr("placeholder"), Some(&json!("jane")));
        assert!(username.attr("title").is_none());
        assert!(username.options.is_none() && username.fields.is_none());

        assert!(!fields[1].required);
        assert_eq!(fields[1].input_type, InputType::Number);
    }

    #[test]
    fn true_schema_contributes_nothing() {
        let fields = build(
            json!({ "properties": { "any": true, "name": { "type": "string" } } }),
            json!({}),
        )
        .unwrap();
        assert_eq!(names(&fields), vec!["name"]);
    }

    #[test]
    fn false_schema_is_hidden_field() {
        let fields = build(json!({ "properties": { "gone": false } }), json!({})).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(!fields[0].is_visible);
        assert_eq!(fields[0].input_type, InputType::Text);
    }

    #[test]
    fn checkbox_values() {
        let fields = build(
            json!({
                "properties": {
                    "agree": { "type": "boolean" },
                    "consent": { "const": "yes", "x-jsf-presentation": { "inputType": "checkbox" } }
                }
            }),
            json!({}),
        )
        .unwrap();
        assert_eq!(fields[0].input_type, InputType::Checkbox);
        assert_eq!(fields[0].checkbox_value, Some(json!(true)));
        assert_eq!(fields[1].checkbox_value, Some(json!("yes")));
    }

    #[test]
    fn nested_object_is_fieldset() {
        let fields = build(
            json!({
                "properties": {
                    "address": {
                        "type": "object",
                        "properties": {
                            "street": { "type": "string" },
                            "zip": { "type": "string" }
                        },
                        "required": ["zip"]
                    }
                }
            }),
            json!({}),
        )
        .unwrap();
        let address = &fields[0];
        assert_eq!(address.input_type, InputType::Fieldset);
        let children = address.fields.as_ref().unwrap();
        assert_eq!(names(children), vec!["street", "zip"]);
        assert!(!children[0].required);
        assert!(children[1].required);
        assert!(address.options.is_none());
    }

    #[test]
    fn options_exclude_children() {
        let fields = build(
            json!({
                "properties": {
                    "plan": {
                        "type": "string",
                        "oneOf": [{ "const": "a", "title": "A" }, { "const": "b", "title": "B" }]
                    }
                }
            }),
            json!({}),
        )
        .unwrap();
        let plan = &fields[0];
        assert_eq!(plan.input_type, InputType::Radio);
        assert_eq!(plan.options.as_ref().unwrap().len(), 2);
        assert!(plan.fields.is_none());
    }

    #[test]
    fn array_of_objects() {
        let fields = build(
            json!({
                "properties": {
                    "people": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "age": { "type": "number" }
                            },
                            "required": ["name"]
                        }
                    }
                }
            }),
            json!({}),
        )
        .unwrap();
        let people = &fields[0];
        assert_eq!(people.input_type, InputType::GroupArray);
        let children = people.fields.as_ref().unwrap();
        assert_eq!(names(children), vec!["name", "age"]);
        assert!(children[0].required);
        assert!(!children[1].required);
        assert_eq!(children[0].name_key.as_deref(), Some("name"));
    }

    #[test]
    fn scalar_array_items_fail() {
        let result = build(
            json!({
                "properties": {
                    "wrapper": {
                        "type": "object",
                        "properties": {
                            "tags": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            }),
            json!({}),
        );
        assert!(matches!(
            result,
            Err(FormError::UnsupportedArrayItems { field }) if field == "wrapper.tags"
        ));
    }

    #[test]
    fn array_with_any_of_items_is_select() {
        let fields = build(
            json!({
                "properties": {
                    "colors": {
                        "type": "array",
                        "items": { "anyOf": [{ "const": "red" }, { "const": "blue" }] }
                    }
                }
            }),
            json!({}),
        )
        .unwrap();
        assert_eq!(fields[0].input_type, InputType::Select);
        assert_eq!(fields[0].options.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn strict_mode_names_nested_field() {
        let cache = OptionCache::new();
        let builder = FieldBuilder::new(&JsonSchemaValidator, &cache, true);
        let schema = json!({
            "properties": {
                "profile": {
                    "type": "object",
                    "x-jsf-presentation": { "inputType": "fieldset" },
                    "properties": { "name": { "type": "string" } }
                }
            }
        });
        let result = builder.build_root(&schema, &json!({}));
        assert!(matches!(
            result,
            Err(FormError::MissingInputType { field }) if field == "profile.name"
        ));
    }

    #[test]
    fn custom_order() {
        let fields = build(
            json!({
                "properties": {
                    "a": { "type": "string" },
                    "b": { "type": "string" },
                    "c": { "type": "string" }
                },
                "x-jsf-order": ["c", "a"]
            }),
            json!({}),
        )
        .unwrap();
        assert_eq!(names(&fields), vec!["c", "a", "b"]);
    }

    #[test]
    fn nested_conditionals_use_scope_value() {
        let schema = json!({
            "properties": {
                "work": {
                    "type": "object",
                    "properties": {
                        "employed": { "type": "boolean" },
                        "company": { "type": "string" }
                    },
                    "if": { "properties": { "employed": { "const": true } }, "required": ["employed"] },
                    "then": { "required": ["company"] },
                    "else": { "properties": { "company": false } }
                }
            }
        });

        let fields = build(schema.clone(), json!({ "work": { "employed": true } })).unwrap();
        let company = fields[0].find("company").unwrap();
        assert!(company.is_visible);
        assert!(company.required);

        let fields = build(schema, json!({ "work": { "employed": false } })).unwrap();
        let company = fields[0].find("company").unwrap();
        assert!(!company.is_visible);
        assert!(!company.required);
    }

    #[test]
    fn hidden_field_keeps_presentation_and_empty_children() {
        let schema = json!({
            "properties": {
                "toggle": { "type": "boolean" },
                "details": {
                    "type": "object",
                    "x-jsf-presentation": { "inputType": "group" },
                    "properties": { "note": { "type": "string" } }
                }
            },
            "if": { "properties": { "toggle": { "const": false } }, "required": ["toggle"] },
            "then": { "properties": { "details": false } }
        });
        let fields = build(schema, json!({ "toggle": false })).unwrap();
        let details = &fields[1];
        assert!(!details.is_visible);
        assert_eq!(details.input_type, InputType::Custom("group".into()));
        assert_eq!(details.fields.as_deref(), Some(&[][..]));
    }

    #[test]
    fn shared_options_across_fields() {
        let cache = OptionCache::new();
        let builder = FieldBuilder::new(&JsonSchemaValidator, &cache, false);
        let fields = builder
            .build_root(
                &json!({
                    "properties": {
                        "a": { "enum": ["x", "y"] },
                        "b": { "enum": ["x", "y"] }
                    }
                }),
                &json!({}),
            )
            .unwrap();
        assert!(Arc::ptr_eq(
            fields[0].options.as_ref().unwrap(),
            fields[1].options.as_ref().unwrap()
        ));
    }

    #[test]
    fn depth_limit_fails_closed() {
        let mut schema = json!({ "type": "string" });
        for _ in 0..(MAX_DEPTH + 2) {
            schema = json!({ "type": "object", "properties": { "n": schema } });
        }
        let result = build(json!({ "properties": { "root": schema } }), json!({}));
        assert!(matches!(result, Err(FormError::DepthExceeded { .. })));
    }

    #[test]
    fn error_messages_merge_original_then_current() {
        let schema = json!({
            "properties": {
                "kind": { "type": "string" },
                "code": {
                    "type": "string",
                    "x-jsf-errorMessage": { "required": "Code please", "minLength": "Too short" }
                }
            },
            "if": true,
            "then": {
                "properties": {
                    "code": { "x-jsf-errorMessage": { "minLength": "At least 4" } }
                }
            }
        });
        let fields = build(schema, json!({})).unwrap();
        let code = &fields[1];
        assert_eq!(code.error_message.get("required"), Some(&json!("Code please")));
        assert_eq!(code.error_message.get("minLength"), Some(&json!("At least 4")));
    }

    #[test]
    fn nullable_composites_build_children() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": ["object", "null"],
                    "properties": { "street": { "type": "string" } }
                },
                "rows": {
                    "type": ["array", "null"],
                    "items": { "properties": { "qty": { "type": "integer" } } }
                }
            }
        });
        let fields = build(schema, json!({})).unwrap();

        assert_eq!(fields[0].input_type, InputType::Fieldset);
        assert_eq!(names(fields[0].fields.as_ref().unwrap()), vec!["street"]);
        assert_eq!(fields[1].input_type, InputType::GroupArray);
        assert_eq!(names(fields[1].fields.as_ref().unwrap()), vec!["qty"]);
    }

    #[test]
    fn nullable_array_with_scalar_items_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": ["array", "null"], "items": { "type": "string" } }
            }
        });
        let result = build(schema, json!({}));
        assert!(matches!(
            result,
            Err(FormError::UnsupportedArrayItems { field }) if field == "tags"
        ));
    }

    #[test]
    fn structural_keywords_stay_out_of_attributes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": { "zip": { "type": "string" } },
                    "required": ["zip"],
                    "x-jsf-order": ["zip"],
                    "allOf": [{ "if": true, "then": {} }],
                    "minProperties": 1
                }
            }
        });
        let fields = build(schema, json!({})).unwrap();
        let address = &fields[0];
        for key in ["properties", "required", "x-jsf-order", "allOf", "if", "then", "items"] {
            assert!(address.attr(key).is_none(), "{} leaked into attributes", key);
        }
        assert_eq!(address.attr("minProperties"), Some(&json!(1)));
    }

    #[test]
    fn presentation_text_replaces_schema_text() {
        let schema = json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "title": "Email",
                    "description": "Plain",
                    "x-jsf-presentation": {
                        "label": "Work email",
                        "description": "<b>Rich</b>",
                        "required": true,
                        "isVisible": false,
                        "placeholder": "you@example.com"
                    }
                }
            }
        });
        let fields = build(schema, json!({})).unwrap();
        let email = &fields[0];
        assert_eq!(email.label.as_deref(), Some("Work email"));
        assert_eq!(email.description.as_deref(), Some("<b>Rich</b>"));
        assert!(!email.required);
        assert!(email.is_visible);
        assert_eq!(email.attributes.len(), 1);
        assert_eq!(email.attr("placeholder"), Some(&json!("you@example.com")));

        let serialized = serde_json::to_string(email).unwrap();
        assert_eq!(serialized.matches("\"label\"").count(), 1);
        assert_eq!(serialized.matches("\"description\"").count(), 1);
        assert_eq!(serialized.matches("\"required\"").count(), 1);
    }
}
