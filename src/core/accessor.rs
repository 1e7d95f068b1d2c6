use crate::domain::model::{FieldKind, SelectOption};
use crate::domain::ports::Model;
use crate::utils::error::{BindError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use super::value::{display, loose_eq};

/// Attach-time split of a model's own fields into data and virtual properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyClassification {
    properties: Vec<String>,
    virtuals: Vec<String>,
}

impl PropertyClassification {
    pub fn classify<M: Model + ?Sized>(model: &M) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut classification = Self::default();

        for field in model.fields() {
            if !seen.insert(field.name.clone()) {
                return Err(BindError::DuplicateField { name: field.name });
            }
            match field.kind {
                FieldKind::Data => classification.properties.push(field.name),
                FieldKind::Virtual => classification.virtuals.push(field.name),
            }
        }

        tracing::debug!(
            "Classified model: {} properties, {} virtuals",
            classification.properties.len(),
            classification.virtuals.len()
        );
        Ok(classification)
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn virtuals(&self) -> &[String] {
        &self.virtuals
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    pub fn is_virtual(&self, name: &str) -> bool {
        self.virtuals.iter().any(|v| v == name)
    }

    /// Reads a property, a virtual, or (as a fallback) any method the model answers.
    pub fn get<M: Model + ?Sized>(&self, model: &M, name: &str) -> Value {
        let value = if self.is_property(name) {
            model.field(name)
        } else {
            // Virtuals and methods not captured at classification time share the call path.
            model.call(name)
        };
        value.unwrap_or(Value::Null)
    }

    /// Stores a data property and reports `(old, actual)`, or `None` for anything
    /// that is not a data property.
    ///
    /// `actual` is re-read after the assignment so conversions made by the model
    /// are what gets propagated.
    pub fn assign<M: Model + ?Sized>(
        &self,
        model: &mut M,
        name: &str,
        value: Value,
    ) -> Result<Option<Assignment>> {
        if !self.is_property(name) {
            return Ok(None);
        }
        let old = self.get(model, name);
        model.set_field(name, value)?;
        let actual = self.get(model, name);
        let changed = !loose_eq(&actual, &old);
        Ok(Some(Assignment {
            old,
            actual,
            changed,
        }))
    }

    /// Text of the option whose value matches `value` in the list `options_property` yields.
    pub fn option_text<M: Model + ?Sized>(
        &self,
        model: &M,
        value: &Value,
        options_property: &str,
    ) -> Result<String> {
        let options = options_from_value(options_property, self.get(model, options_property))?;
        Ok(lookup_option_text(&options, value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub old: Value,
    pub actual: Value,
    pub changed: bool,
}

/// Decodes an options property value; `null` means no options.
pub fn options_from_value(property: &str, value: Value) -> Result<Vec<SelectOption>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| option_from_item(property, item))
            .collect(),
        other => Err(BindError::InvalidOptions {
            property: property.to_string(),
            reason: format!("expected a list, got {}", other),
        }),
    }
}

fn option_from_item(property: &str, item: Value) -> Result<SelectOption> {
    let Value::Object(map) = item else {
        return Err(BindError::InvalidOptions {
            property: property.to_string(),
            reason: format!("expected an object, got {}", item),
        });
    };
    let value = map.get("value").map(display).unwrap_or_default();
    let text = map.get("text").map(display).unwrap_or_default();
    Ok(SelectOption { value, text })
}

/// Last match wins; empty when nothing matches.
pub fn lookup_option_text(options: &[SelectOption], value: &Value) -> String {
    options
        .iter()
        .rev()
        .find(|option| loose_eq(&Value::String(option.value.clone()), value))
        .map(|option| option.text.clone())
        .unwrap_or_default()
}
