//! Option extraction from `oneOf`/`anyOf`/`enum`, with content-keyed sharing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use crate::types::{FieldOption, PRESENTATION_KEY};

/// Memoizes option lists by their serialized content.
///
/// Identical lists compiled from different schema fragments share one
/// `Arc`. Entries are only ever added. Each form owns its own cache.
#[derive(Debug, Default)]
pub struct OptionCache {
    entries: Mutex<HashMap<String, Arc<Vec<FieldOption>>>>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance for `options`, inserting it on first sight.
    pub fn intern(&self, options: Vec<FieldOption>) -> Arc<Vec<FieldOption>> {
        let signature = content_signature(&options);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(shared) = entries.get(&signature) {
            log::trace!("option cache hit ({} options)", shared.len());
            return Arc::clone(shared);
        }
        let shared = Arc::new(options);
        entries.insert(signature, Arc::clone(&shared));
        shared
    }

    /// Number of distinct option lists seen so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical, order-sensitive serialization of an option list.
fn content_signature(options: &[FieldOption]) -> String {
    let mut signature = String::new();
    for option in options {
        let mut entry = Map::new();
        entry.insert("label".to_string(), Value::String(option.label.clone()));
        entry.insert("value".to_string(), option.value.clone());
        entry.insert("extra".to_string(), Value::Object(option.extra.clone()));
        signature.push_str(&Value::Object(entry).to_string());
        signature.push('\n');
    }
    signature
}

/// Extract the options of a schema fragment.
///
/// Candidates are taken from the first of `oneOf`, `items.anyOf`, `anyOf`
/// or `enum` that is present. Returns `None` when none of them is.
pub fn extract_options(
    schema: &Map<String, Value>,
    cache: &OptionCache,
) -> Option<Arc<Vec<FieldOption>>> {
    let projected;
    let candidates: &[Value] = if let Some(Value::Array(one_of)) = schema.get("oneOf") {
        one_of
    } else if let Some(Value::Array(any_of)) = schema.get("items").and_then(|i| i.get("anyOf")) {
        any_of
    } else if let Some(Value::Array(any_of)) = schema.get("anyOf") {
        any_of
    } else if let Some(Value::Array(values)) = schema.get("enum") {
        projected = values.iter().map(enum_entry).collect::<Vec<_>>();
        &projected
    } else {
        return None;
    };

    let options = candidates.iter().filter_map(to_option).collect();
    Some(cache.intern(options))
}

fn enum_entry(value: &Value) -> Value {
    let title = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    json!({ "title": title, "const": value })
}

fn to_option(entry: &Value) -> Option<FieldOption> {
    let map = entry.as_object()?;
    let value = map.get("const")?.clone();
    let label = map
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut extra = Map::new();
    for (key, v) in map {
        match key.as_str() {
            "title" | "const" | PRESENTATION_KEY => {}
            _ => {
                extra.insert(key.clone(), v.clone());
            }
        }
    }
    if let Some(meta) = map.get(PRESENTATION_KEY).and_then(|p| p.get("meta")) {
        extra.insert("meta".to_string(), meta.clone());
    }

    Some(FieldOption { label, value, extra })
}
