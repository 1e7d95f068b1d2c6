//! Sample account model and the form it binds to.

use crate::core::accessor::{lookup_option_text, options_from_value};
use crate::core::value::{display, to_number};
use crate::domain::model::{Cascade, Change, Field};
use crate::domain::ports::{Model, Validator};
use crate::utils::error::{BindError, Result};
use serde_json::{json, Value};

/// Markup the CLI binds when no `--markup` file is given.
pub const SAMPLE_FORM: &str = r#"<form id="bound-form">
  <fieldset id="identity" wc="class:CSS">
    <select id="salutation" wc="options:getSalutations,val:Salutation"></select>
    <input id="first-name" type="text" wc="val:FirstName">
    <input id="last-name" type="text" wc="val:LastName">
    <span id="display-name" wc="text:DisplayName"></span>
  </fieldset>
  <input id="balance" type="number" wc="val:Balance">
  <span id="timer" wc="text:TimerText"></span>
  <span wc="text:hasFullName"></span>
</form>
"#;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub state: f64,
    pub timer: f64,
    pub balance: f64,
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    changes: Vec<String>,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change notifications seen so far, `Timer` excluded.
    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    pub fn salutations() -> Value {
        json!([
            {"value": "0", "text": ""},
            {"value": "1", "text": "Mr"},
            {"value": "2", "text": "Mrs"},
            {"value": "3", "text": "Miss"},
            {"value": "4", "text": "Ms"},
            {"value": "5", "text": "Professor"},
            {"value": "6", "text": "Doctor"},
            {"value": "7", "text": "Reverend"},
            {"value": "8", "text": "Count"}
        ])
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn display_name(&self) -> String {
        let title = options_from_value("getSalutations", Self::salutations())
            .map(|options| lookup_option_text(&options, &Value::String(self.salutation.clone())))
            .unwrap_or_default();
        format!("{} {}", title, self.full_name()).trim().to_string()
    }

    /// `credit` for a negative balance, `overdue` for a positive one.
    pub fn css(&self) -> &'static str {
        if self.balance == 0.0 {
            ""
        } else if self.balance <= 0.0 {
            "credit"
        } else {
            "overdue"
        }
    }

    fn number(name: &str, value: &Value) -> Result<f64> {
        let n = to_number(value);
        if n.is_nan() {
            return Err(BindError::InvalidValue {
                property: name.to_string(),
                value: display(value),
                reason: "not a number".to_string(),
            });
        }
        Ok(n)
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

impl Model for Account {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::data("State"),
            Field::data("Timer"),
            Field::data("Balance"),
            Field::data("Salutation"),
            Field::data("FirstName"),
            Field::data("LastName"),
            Field::derived("CSS"),
            Field::derived("FullName"),
            Field::derived("DisplayName"),
            Field::derived("hasFullName"),
            Field::derived("TimerText"),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "State" => number_value(self.state),
            "Timer" => number_value(self.timer),
            "Balance" => number_value(self.balance),
            "Salutation" => Value::String(self.salutation.clone()),
            "FirstName" => Value::String(self.first_name.clone()),
            "LastName" => Value::String(self.last_name.clone()),
            _ => return None,
        })
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "State" => self.state = Self::number(name, &value)?,
            "Timer" => self.timer = Self::number(name, &value)?,
            "Balance" => self.balance = Self::number(name, &value)?,
            "Salutation" => self.salutation = display(&value),
            "FirstName" => self.first_name = display(&value),
            "LastName" => self.last_name = display(&value),
            _ => {
                return Err(BindError::InvalidValue {
                    property: name.to_string(),
                    value: display(&value),
                    reason: "no such field".to_string(),
                })
            }
        }
        Ok(())
    }

    fn call(&self, name: &str) -> Option<Value> {
        Some(match name {
            "CSS" => Value::from(self.css()),
            "FullName" => Value::from(self.full_name()),
            "DisplayName" => Value::from(self.display_name()),
            "hasFullName" => Value::Bool(!self.full_name().is_empty()),
            "TimerText" => Value::from(format!("Seconds active: {}", display(&number_value(self.timer)))),
            "getSalutations" => Self::salutations(),
            _ => return None,
        })
    }

    fn on_change(&mut self, change: &Change<'_>, _cascade: &mut Cascade) -> Result<()> {
        if !change.property.eq_ignore_ascii_case("timer") {
            let line = format!(
                "[{}] has changed from {} to {}.",
                change.property,
                display(change.old),
                display(change.new)
            );
            tracing::info!("{}", line);
            self.changes.push(line);
        }
        Ok(())
    }

    fn is_required(&self, name: &str) -> bool {
        name == "FirstName"
    }

    fn validator(&self, name: &str) -> Option<Validator<'_>> {
        match name {
            "LastName" => Some(Box::new(|value: &Value| -> Result<bool> {
                Ok(display(value).chars().count() > 2)
            })),
            _ => None,
        }
    }
}
