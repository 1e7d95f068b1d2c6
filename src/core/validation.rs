use crate::domain::model::ElementId;
use crate::domain::ports::{ElementAccess, Model, ValidityHook};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use super::value::is_blank;

/// Property names whose last validation failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidSet {
    names: BTreeSet<String>,
}

impl InvalidSet {
    pub fn contains(&self, property: &str) -> bool {
        self.names.contains(property)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// With a name: that property passed its last check. Without: every property did.
    pub fn is_valid(&self, property: Option<&str>) -> bool {
        match property {
            Some(name) if !name.is_empty() => !self.contains(name),
            _ => self.is_empty(),
        }
    }

    /// Re-evaluates `property` against the model's rules and records the outcome.
    ///
    /// A failing validator leaves the property marked invalid before the error
    /// is returned.
    pub fn validate<M: Model + ?Sized>(&mut self, model: &M, property: &str, value: &Value) -> Result<bool> {
        self.names.remove(property);

        let valid = match evaluate(model, property, value) {
            Ok(valid) => valid,
            Err(e) => {
                self.names.insert(property.to_string());
                return Err(e);
            }
        };

        if !valid {
            self.names.insert(property.to_string());
        }
        tracing::trace!("Validated '{}': {}", property, if valid { "valid" } else { "invalid" });
        Ok(valid)
    }
}

fn evaluate<M: Model + ?Sized>(model: &M, property: &str, value: &Value) -> Result<bool> {
    if model.is_required(property) && is_blank(value) {
        return Ok(false);
    }
    match model.validator(property) {
        Some(_) if value.is_null() => Ok(false),
        Some(check) => check(value),
        None => Ok(true),
    }
}

/// Default presentation: toggles one CSS class on the bound element.
#[derive(Debug, Clone)]
pub struct InvalidClassHook {
    class: String,
}

impl InvalidClassHook {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into() }
    }
}

impl Default for InvalidClassHook {
    fn default() -> Self {
        Self::new("invalid")
    }
}

impl ValidityHook for InvalidClassHook {
    fn show_validity(
        &mut self,
        dom: &mut dyn ElementAccess,
        _property: &str,
        element: &ElementId,
        valid: bool,
    ) -> Result<()> {
        if valid {
            dom.remove_class(element, &self.class)
        } else {
            dom.add_class(element, &self.class)
        }
    }
}
