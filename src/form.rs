//! Form lifecycle: initial build and per-change recomputation.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FormError;
use crate::field::FieldBuilder;
use crate::form_errors::{apply_custom_messages, map_errors, FormErrors};
use crate::options::OptionCache;
use crate::types::{find_in, Field, FormConfig};
use crate::validator::{JsonSchemaValidator, Validator, FALSE_SCHEMA_KEYWORD};

/// Outcome of one [`Form::handle_validation`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Field tree rebuilt for the validated values.
    pub fields: Vec<Field>,
    /// Errors by field path; `None` when the values are valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_errors: Option<FormErrors>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.form_errors.is_none()
    }
}

/// A compiled form bound to one schema.
///
/// The schema is read-only for the life of the form. Each
/// [`handle_validation`](Form::handle_validation) call rebuilds the whole
/// field tree from it; only option lists are reused between calls.
#[derive(Debug)]
pub struct Form<V: Validator = JsonSchemaValidator> {
    schema: Value,
    config: FormConfig,
    validator: V,
    cache: OptionCache,
    fields: Vec<Field>,
}

/// Compile `schema` into a form using the default validator.
///
/// # Errors
///
/// Returns `FormError` when the schema cannot be compiled into fields
/// (strict input type violations, unsupported array items, excessive
/// nesting).
///
/// # Example
///
/// ```
/// use schema_form::{create_form, FormConfig};
/// use serde_json::json;
///
/// let schema = json!({
///     "type": "object",
///     "properties": { "username": { "type": "string" } },
///     "required": ["username"]
/// });
///
/// let mut form = create_form(schema, FormConfig::default()).unwrap();
/// assert!(form.field("username").unwrap().required);
///
/// let result = form.handle_validation(&json!({})).unwrap();
/// let errors = result.form_errors.unwrap();
/// assert!(errors.message_at(&["username"]).is_some());
/// ```
pub fn create_form(schema: Value, config: FormConfig) -> Result<Form, FormError> {
    Form::with_validator(schema, config, JsonSchemaValidator)
}

impl<V: Validator> Form<V> {
    /// Compile `schema` into a form that validates through `validator`.
    ///
    /// The first field tree is built from `config.initial_values`, or an
    /// empty object when none are given.
    pub fn with_validator(
        schema: Value,
        config: FormConfig,
        validator: V,
    ) -> Result<Self, FormError> {
        let cache = OptionCache::new();
        let initial = config
            .initial_values
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let fields = FieldBuilder::new(&validator, &cache, config.strict_input_type)
            .build_root(&schema, &initial)?;

        Ok(Self {
            schema,
            config,
            validator,
            cache,
            fields,
        })
    }

    /// Current field tree.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field of the current tree by dotted name path.
    pub fn field(&self, path: &str) -> Option<&Field> {
        find_in(&self.fields, path)
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Recompute the field tree for `values` and validate them.
    ///
    /// The returned tree (also stored as the form's current tree) reflects
    /// exactly these values.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for schema-authoring defects. Invalid values are
    /// never an error; they are reported in
    /// [`ValidationResult::form_errors`].
    pub fn handle_validation(&mut self, values: &Value) -> Result<ValidationResult, FormError> {
        let builder =
            FieldBuilder::new(&self.validator, &self.cache, self.config.strict_input_type);
        let fields = builder.build_root(&self.schema, values)?;

        let mut errors = self.validator.validate(values, &self.schema)?;
        if self.config.legacy_options.allow_forbidden_values {
            errors.retain(|e| e.keyword != FALSE_SCHEMA_KEYWORD);
        }
        apply_custom_messages(&mut errors, &fields);
        log::debug!("validation produced {} error(s)", errors.len());

        let form_errors = map_errors(&errors);
        self.fields = fields.clone();

        Ok(ValidationResult {
            fields,
            form_errors,
        })
    }
}
