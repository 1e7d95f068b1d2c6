use crate::utils::error::{BindError, Result};
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_:.-]*$").expect("identifier pattern"));

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> BindError {
    BindError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Attribute names, id prefixes and property names share one shape.
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if !IDENTIFIER.is_match(value) {
        return Err(invalid(
            field_name,
            value,
            "Must start with a letter or underscore and contain no spaces",
        ));
    }
    Ok(())
}

pub fn validate_css_class(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(
            field_name,
            value,
            "A single CSS class cannot contain whitespace",
        ));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_length_bounds(field_name: &str, min: Option<usize>, max: Option<usize>) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(invalid(
                field_name,
                format!("{}..{}", min, max),
                "min_length cannot exceed max_length",
            ));
        }
    }
    Ok(())
}

pub fn validate_pattern(field_name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| invalid(field_name, pattern, format!("Invalid regex: {}", e)))
}
