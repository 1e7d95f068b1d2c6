//! Model backed by a JSON object, with rules and derived fields from configuration.

use crate::config::{FieldRule, ModelRules};
use crate::core::value::display;
use crate::domain::model::{Cascade, Change, Field};
use crate::domain::ports::{Model, Validator};
use crate::utils::error::{BindError, Result};
use crate::utils::validation::{validate_pattern, Validate};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern"));

struct CompiledRule {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn compile(field: &str, rule: &FieldRule) -> Result<Self> {
        let pattern = match &rule.pattern {
            Some(pattern) => Some(validate_pattern(
                &format!("model.validation.{}.pattern", field),
                pattern,
            )?),
            None => None,
        };
        Ok(Self {
            min_length: rule.min_length,
            max_length: rule.max_length,
            pattern,
        })
    }

    fn check(&self, value: &Value) -> bool {
        let text = display(value);
        let length = text.chars().count();
        self.min_length.map_or(true, |min| length >= min)
            && self.max_length.map_or(true, |max| length <= max)
            && self.pattern.as_ref().map_or(true, |p| p.is_match(&text))
    }
}

pub struct JsonModel {
    data: Map<String, Value>,
    rules: ModelRules,
    compiled: BTreeMap<String, CompiledRule>,
    changes: usize,
}

impl JsonModel {
    pub fn new(data: Value, rules: ModelRules) -> Result<Self> {
        let Value::Object(data) = data else {
            return Err(BindError::ConfigError {
                message: format!("model must be a JSON object, got {}", data),
            });
        };
        rules.validate()?;
        let compiled = rules
            .validation
            .iter()
            .map(|(name, rule)| -> Result<(String, CompiledRule)> {
                Ok((name.clone(), CompiledRule::compile(name, rule)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::debug!(
            "JSON model with {} fields, {} rules, {} virtuals",
            data.len(),
            compiled.len(),
            rules.virtuals.len()
        );
        Ok(Self {
            data,
            rules,
            compiled,
            changes: 0,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, rules: ModelRules) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::new(serde_json::from_str(&content)?, rules)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Number of change notifications received.
    pub fn change_count(&self) -> usize {
        self.changes
    }

    fn render(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures| {
                self.data.get(&caps[1]).map(display).unwrap_or_default()
            })
            .trim()
            .to_string()
    }
}

impl Model for JsonModel {
    fn fields(&self) -> Vec<Field> {
        self.data
            .keys()
            .map(Field::data)
            .chain(self.rules.virtuals.keys().map(Field::derived))
            .collect()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.data.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.data.insert(name.to_string(), value);
        Ok(())
    }

    fn call(&self, name: &str) -> Option<Value> {
        self.rules
            .virtuals
            .get(name)
            .map(|template| Value::String(self.render(template)))
    }

    fn on_change(&mut self, change: &Change<'_>, _cascade: &mut Cascade) -> Result<()> {
        tracing::debug!(
            "[{}] changed from '{}' to '{}'",
            change.property,
            display(change.old),
            display(change.new)
        );
        self.changes += 1;
        Ok(())
    }

    fn is_required(&self, name: &str) -> bool {
        self.rules.required_fields.iter().any(|f| f == name)
    }

    fn validator(&self, name: &str) -> Option<Validator<'_>> {
        let rule = self.compiled.get(name)?;
        Some(Box::new(move |value: &Value| -> Result<bool> { Ok(rule.check(value)) }))
    }
}
