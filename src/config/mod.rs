#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_css_class, validate_identifier, validate_length_bounds, validate_pattern,
    validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use toml_config::AppConfig;

/// Settings the binding engine itself reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Element attribute carrying the binding declarations.
    pub attribute: String,
    /// Class the default validity hook toggles on invalid elements.
    pub invalid_class: String,
    /// Prefix for ids generated for bound elements that have none.
    pub id_prefix: String,
    /// Deepest nesting of `set` calls (options write-back, change cascades).
    pub max_cascade_depth: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            attribute: "wc".to_string(),
            invalid_class: "invalid".to_string(),
            id_prefix: "wc_".to_string(),
            max_cascade_depth: 32,
        }
    }
}

impl Validate for BinderConfig {
    fn validate(&self) -> Result<()> {
        validate_identifier("binder.attribute", &self.attribute)?;
        validate_css_class("binder.invalid_class", &self.invalid_class)?;
        validate_identifier("binder.id_prefix", &self.id_prefix)?;
        validate_positive_number("binder.max_cascade_depth", self.max_cascade_depth, 1)?;
        Ok(())
    }
}

/// Declarative rules for the JSON-backed model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRules {
    pub required_fields: Vec<String>,
    pub validation: BTreeMap<String, FieldRule>,
    /// Derived properties rendered from `{Field}` templates.
    pub virtuals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

impl Validate for ModelRules {
    fn validate(&self) -> Result<()> {
        for name in &self.required_fields {
            validate_identifier("model.required_fields", name)?;
        }
        for (name, rule) in &self.validation {
            let field = format!("model.validation.{}", name);
            validate_identifier(&field, name)?;
            validate_length_bounds(&field, rule.min_length, rule.max_length)?;
            if let Some(pattern) = &rule.pattern {
                validate_pattern(&format!("{}.pattern", field), pattern)?;
            }
        }
        for name in self.virtuals.keys() {
            validate_identifier("model.virtuals", name)?;
        }
        Ok(())
    }
}
