//! Custom field ordering via `x-jsf-order`.

use serde_json::{Map, Value};

use crate::types::{Field, ORDER_KEY};

/// Read the order hint of an object schema, if any.
pub fn order_hint(schema: &Map<String, Value>) -> Option<Vec<String>> {
    let names = schema.get(ORDER_KEY)?.as_array()?;
    Some(
        names
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
    )
}

/// Order fields by `order`; fields missing from it follow in their
/// original order. Names in `order` without a matching field are ignored.
pub fn order_fields(fields: Vec<Field>, order: &[String]) -> Vec<Field> {
    let mut remaining: Vec<Option<Field>> = fields.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for name in order {
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|f| &f.name == name))
        {
            if let Some(field) = slot.take() {
                ordered.push(field);
            }
        }
    }

    ordered.extend(remaining.into_iter().flatten());
    ordered
}
