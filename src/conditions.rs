//! Conditional resolution of `if`/`then`/`else` and `allOf` branches.
//!
//! For an object scope, every branch is evaluated against the current value
//! at that scope. The selected side of each branch contributes property
//! overrides and required names:
//!
//! - branches are visited in key declaration order (`allOf` entries in array
//!   order, the top-level `if` wherever it appears)
//! - all branches are evaluated, there is no first-match short-circuit
//! - a later branch wins over an earlier one on the same property, and any
//!   branch wins over the base schema
//! - required names are the union of the base list and every selected side
//!
//! Nothing here is cached: callers rebuild the effective scope on every
//! value change.

use serde_json::{Map, Value};

use crate::validator::Validator;

/// Effective properties and required names of one object scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedScope {
    /// Base properties merged with every selected override, in base
    /// declaration order followed by branch-only properties.
    pub properties: Map<String, Value>,
    /// Union of required names, first occurrence order.
    pub required: Vec<String>,
}

impl ResolvedScope {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// A conditional branch, borrowed from the schema.
#[derive(Debug, Clone, Copy)]
struct Branch<'a> {
    condition: Option<&'a Value>,
    then: Option<&'a Value>,
    otherwise: Option<&'a Value>,
}

/// Resolve the effective properties and required set of an object scope.
///
/// `value` is the current instance value at this scope.
pub fn resolve_scope(
    schema: &Map<String, Value>,
    value: &Value,
    validator: &dyn Validator,
) -> ResolvedScope {
    let mut overrides = Map::new();
    let mut required = string_list(schema.get("required"));

    for branch in collect_branches(schema) {
        let Some(selected) = select(&branch, value, validator) else {
            continue;
        };
        let Some(selected) = selected.as_object() else {
            continue;
        };

        if let Some(Value::Object(props)) = selected.get("properties") {
            for (name, prop) in props {
                let merged = match overrides.get(name) {
                    Some(previous) => merge_schema(previous, prop),
                    None => prop.clone(),
                };
                overrides.insert(name.clone(), merged);
            }
        }

        for name in string_list(selected.get("required")) {
            if !required.contains(&name) {
                required.push(name);
            }
        }
    }

    let mut properties = Map::new();
    if let Some(Value::Object(base)) = schema.get("properties") {
        for (name, prop) in base {
            let effective = match overrides.get(name) {
                Some(over) => merge_schema(prop, over),
                None => prop.clone(),
            };
            properties.insert(name.clone(), effective);
        }
    }
    for (name, over) in overrides {
        if !properties.contains_key(&name) {
            properties.insert(name, over);
        }
    }

    ResolvedScope {
        properties,
        required,
    }
}

fn collect_branches(schema: &Map<String, Value>) -> Vec<Branch<'_>> {
    let mut branches = Vec::new();
    for (key, value) in schema {
        match key.as_str() {
            "allOf" => {
                let Some(entries) = value.as_array() else {
                    continue;
                };
                for entry in entries {
                    let branch = match entry.get("if") {
                        Some(condition) => Branch {
                            condition: Some(condition),
                            then: entry.get("then"),
                            otherwise: entry.get("else"),
                        },
                        // Plain allOf entry: always selected.
                        None => Branch {
                            condition: None,
                            then: Some(entry),
                            otherwise: None,
                        },
                    };
                    branches.push(branch);
                }
            }
            "if" => branches.push(Branch {
                condition: Some(value),
                then: schema.get("then"),
                otherwise: schema.get("else"),
            }),
            _ => {}
        }
    }
    branches
}

fn select<'a>(branch: &Branch<'a>, value: &Value, validator: &dyn Validator) -> Option<&'a Value> {
    let holds = match branch.condition {
        None => true,
        Some(condition) => evaluate_condition(condition, value, validator),
    };
    log::trace!("branch condition evaluated to {}", holds);
    if holds {
        branch.then
    } else {
        branch.otherwise
    }
}

/// Evaluate an `if` against the scope value.
///
/// A sub-schema the validator cannot compile counts as `false`.
pub fn evaluate_condition(condition: &Value, value: &Value, validator: &dyn Validator) -> bool {
    match condition {
        Value::Bool(b) => *b,
        Value::Object(_) => match validator.is_valid(value, condition) {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("treating unevaluable `if` as false: {}", e);
                false
            }
        },
        _ => false,
    }
}

/// Merge an override schema onto a base schema.
///
/// `false` replaces the base, `true` leaves it unchanged, two objects merge
/// key by key (recursively for nested objects), anything else replaces.
/// `required` lists are the exception: they union, base names first.
pub fn merge_schema(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (_, Value::Bool(true)) => base.clone(),
        (Value::Object(base_map), Value::Object(over_map)) => {
            let mut merged = base_map.clone();
            for (key, over_value) in over_map {
                let value = match (merged.get(key), over_value) {
                    (Some(existing @ Value::Object(_)), Value::Object(_)) => {
                        merge_schema(existing, over_value)
                    }
                    (Some(Value::Array(existing)), Value::Array(extra)) if key == "required" => {
                        let mut names = existing.clone();
                        for name in extra {
                            if !names.contains(name) {
                                names.push(name.clone());
                            }
                        }
                        Value::Array(names)
                    }
                    _ => over_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => over.clone(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
