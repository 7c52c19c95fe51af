//! Schema Form
//!
//! Compiles a JSON Schema into a tree of rendering-agnostic form fields and
//! keeps that tree in step with the values being edited, resolving
//! `if`/`then`/`else` and `allOf` branches into an effective schema per
//! property.
//!
//! # Example
//!
//! ```
//! use schema_form::{create_form, FormConfig, InputType};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "userType": { "type": "string", "enum": ["admin", "user"] },
//!         "permissions": {
//!             "type": "string",
//!             "enum": ["read"],
//!             "x-jsf-presentation": { "inputType": "select" }
//!         }
//!     },
//!     "allOf": [{
//!         "if": { "properties": { "userType": { "const": "admin" } }, "required": ["userType"] },
//!         "then": { "properties": { "permissions": { "enum": ["read", "write"] } } }
//!     }]
//! });
//!
//! let mut form = create_form(schema, FormConfig::default()).unwrap();
//! let permissions = form.field("permissions").unwrap();
//! assert_eq!(permissions.input_type, InputType::Select);
//! assert_eq!(permissions.options.as_ref().unwrap().len(), 1);
//!
//! let result = form.handle_validation(&json!({ "userType": "admin" })).unwrap();
//! let permissions = &result.fields[1];
//! assert_eq!(permissions.options.as_ref().unwrap().len(), 2);
//! ```
//!
//! # Schema Extensions
//!
//! | Keyword | Effect |
//! |---------|--------|
//! | `x-jsf-presentation` | `inputType` overrides the derived input type; `label`/`description` replace the schema's text; other keys are copied onto the field |
//! | `x-jsf-errorMessage` | per-keyword replacement for validator messages |
//! | `x-jsf-order` | display order of an object's properties |
//!
//! # Conditional Branches
//!
//! Every branch of an object scope is evaluated on every change. Selected
//! sides merge their `properties` over the base (later branches win) and
//! add their `required` names. A property whose effective schema is `false`
//! is kept as a hidden field with its original shape.

mod classify;
mod conditions;
mod error;
mod field;
mod form;
mod form_errors;
mod input_type;
mod loader;
mod options;
mod order;
mod types;
mod validator;

pub use classify::{classify, SchemaKind};
pub use conditions::{evaluate_condition, merge_schema, resolve_scope, ResolvedScope};
pub use error::{FormError, LoadError, ValidatorError};
pub use field::{FieldBuilder, MAX_DEPTH};
pub use form::{create_form, Form, ValidationResult};
pub use form_errors::{map_errors, ErrorNode, FormErrors};
pub use input_type::{derived_input_type, input_type};
pub use loader::{load_json, load_json_str};
pub use options::{extract_options, OptionCache};
pub use order::order_fields;
pub use types::{
    Field, FieldOption, FormConfig, InputType, JsonType, LegacyOptions, SchemaNode,
    ERROR_MESSAGE_KEY, ORDER_KEY, PRESENTATION_KEY,
};
pub use validator::{JsonSchemaValidator, PathSegment, RawError, Validator};
