//! Mapping of validator output into a field-path-shaped error tree.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Field;
use crate::validator::{PathSegment, RawError};

/// Node of a [`FormErrors`] tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Message(String),
    Nested(FormErrors),
}

/// Nested error messages keyed by field name.
///
/// Array entries are keyed by their decimal index. The empty key holds
/// errors about the whole instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, ErrorNode>);

impl FormErrors {
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message stored at `path`, if the path ends at a leaf.
    pub fn message_at(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            match current.0.get(*key)? {
                ErrorNode::Nested(nested) => current = nested,
                ErrorNode::Message(_) => return None,
            }
        }
        match current.0.get(*last)? {
            ErrorNode::Message(message) => Some(message),
            ErrorNode::Nested(_) => None,
        }
    }

    /// Message about the whole instance.
    pub fn root_message(&self) -> Option<&str> {
        self.message_at(&[""])
    }

    /// Every leaf as `(path, message)`, depth first in key order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &str)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        prefix: &mut Vec<String>,
        out: &mut Vec<(Vec<String>, &'a str)>,
    ) {
        for (key, node) in &self.0 {
            prefix.push(key.clone());
            match node {
                ErrorNode::Message(message) => out.push((prefix.clone(), message.as_str())),
                ErrorNode::Nested(nested) => nested.collect_leaves(prefix, out),
            }
            prefix.pop();
        }
    }

    /// Set the message at `path`, replacing whatever was there.
    fn insert(&mut self, path: &[String], message: String) {
        match path.split_first() {
            None => {
                self.0.insert(String::new(), ErrorNode::Message(message));
            }
            Some((head, [])) => {
                self.0.insert(head.clone(), ErrorNode::Message(message));
            }
            Some((head, rest)) => {
                let node = self
                    .0
                    .entry(head.clone())
                    .or_insert_with(|| ErrorNode::Nested(FormErrors::default()));
                if let ErrorNode::Message(_) = node {
                    *node = ErrorNode::Nested(FormErrors::default());
                }
                if let ErrorNode::Nested(nested) = node {
                    nested.insert(rest, message);
                }
            }
        }
    }
}

/// Build the error tree for `errors`.
///
/// When several errors land on the same leaf the last one wins. Returns
/// `None` when there are no errors.
pub fn map_errors(errors: &[RawError]) -> Option<FormErrors> {
    if errors.is_empty() {
        return None;
    }
    let mut tree = FormErrors::default();
    for error in errors {
        let path: Vec<String> = error.path.iter().map(PathSegment::as_key).collect();
        tree.insert(&path, error.message.clone());
    }
    Some(tree)
}

/// Replace validator messages with the `x-jsf-errorMessage` override of the
/// field each error points at, where one exists for the error's keyword.
pub fn apply_custom_messages(errors: &mut [RawError], fields: &[Field]) {
    for error in errors.iter_mut() {
        if let Some(custom) = custom_message(fields, error) {
            error.message = custom;
        }
    }
}

fn custom_message(fields: &[Field], error: &RawError) -> Option<String> {
    let mut siblings = fields;
    let mut target: Option<&Field> = None;
    for segment in &error.path {
        match segment {
            PathSegment::Key(name) => {
                let field = siblings.iter().find(|f| &f.name == name)?;
                siblings = field.fields.as_deref().unwrap_or_default();
                target = Some(field);
            }
            // Array entries share the item template.
            PathSegment::Index(_) => {}
        }
    }
    target?
        .error_message
        .get(&error.keyword)
        .and_then(|m| m.as_str())
        .map(String::from)
}
