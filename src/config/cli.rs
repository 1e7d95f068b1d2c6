use clap::{Parser, ValueEnum};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "watch-commander")]
#[command(about = "Bind a model to a form, apply edits and print the resulting form state")]
pub struct CliArgs {
    /// Markup file holding the form (defaults to the built-in account form)
    #[arg(long)]
    pub markup: Option<String>,

    /// Id of the element whose subtree is bound
    #[arg(long, default_value = "bound-form")]
    pub region: String,

    /// JSON object to bind (defaults to the sample account)
    #[arg(long)]
    pub model: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Assign a property after attaching, NAME=VALUE (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    pub sets: Vec<(String, Value)>,

    /// Simulate a user edit on an element, ID=VALUE (repeatable)
    #[arg(long = "edit", value_parser = parse_edit)]
    pub edits: Vec<(String, String)>,

    /// Re-render every binding before printing
    #[arg(long)]
    pub redraw: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

/// VALUE is read as JSON when it parses (`12`, `true`, `null`), else as a string.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = split_pair(raw)?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn parse_edit(raw: &str) -> Result<(String, String), String> {
    let (id, value) = split_pair(raw)?;
    Ok((id.trim_start_matches('#').to_string(), value.to_string()))
}
