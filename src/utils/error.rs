use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("Malformed binding declaration '{declaration}' on element #{element}")]
    MalformedBinding { element: String, declaration: String },

    #[error("Bound region #{region} not found")]
    RegionNotFound { region: String },

    #[error("Element #{id} not found")]
    ElementNotFound { id: String },

    #[error("Duplicate model field: {name}")]
    DuplicateField { name: String },

    #[error("Options property '{property}' is not a list of value/text pairs: {reason}")]
    InvalidOptions { property: String, reason: String },

    #[error("Property '{property}' rejected value '{value}': {reason}")]
    InvalidValue {
        property: String,
        value: String,
        reason: String,
    },

    #[error("Model hook failed for '{property}': {message}")]
    HookError { property: String, message: String },

    #[error("Change cascade for '{property}' exceeded depth {depth}")]
    CascadeDepthExceeded { property: String, depth: usize },

    #[error("Markup error at byte {position}: {message}")]
    MarkupError { position: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authoring mistakes in markup, bindings or config files.
    Configuration,
    /// Failures raised by model-owned code (validators, hooks, setters).
    Model,
    /// Engine guards tripped at runtime.
    Runtime,
    /// Filesystem and decoding failures.
    System,
}

impl BindError {
    pub fn hook(property: &str, message: impl Into<String>) -> Self {
        BindError::HookError {
            property: property.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BindError::MalformedBinding { .. }
            | BindError::RegionNotFound { .. }
            | BindError::ElementNotFound { .. }
            | BindError::DuplicateField { .. }
            | BindError::InvalidOptions { .. }
            | BindError::MarkupError { .. }
            | BindError::ConfigError { .. }
            | BindError::InvalidConfigValueError { .. }
            | BindError::TomlError(_) => ErrorCategory::Configuration,
            BindError::InvalidValue { .. } | BindError::HookError { .. } => ErrorCategory::Model,
            BindError::CascadeDepthExceeded { .. } => ErrorCategory::Runtime,
            BindError::IoError(_) | BindError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BindError::MalformedBinding { .. } => {
                "Write bindings as 'kind:Property' pairs separated by commas"
            }
            BindError::RegionNotFound { .. } | BindError::ElementNotFound { .. } => {
                "Check that the element id exists in the markup"
            }
            BindError::DuplicateField { .. } => "Give every model field a unique name",
            BindError::InvalidOptions { .. } => {
                "Return a list of {\"value\", \"text\"} objects from the options property"
            }
            BindError::InvalidValue { .. } => "Provide a value the model field can hold",
            BindError::HookError { .. } => "Inspect the model's validator or change hook",
            BindError::CascadeDepthExceeded { .. } => {
                "Break the cycle between change hooks that keep updating each other"
            }
            BindError::MarkupError { .. } => "Fix the unbalanced or malformed tag in the markup",
            BindError::ConfigError { .. }
            | BindError::InvalidConfigValueError { .. }
            | BindError::TomlError(_) => "Review the configuration file",
            BindError::IoError(_) => "Check the file path and permissions",
            BindError::SerializationError(_) => "Make sure the input is valid JSON",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Model => 2,
            ErrorCategory::Runtime => 3,
            ErrorCategory::System => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, BindError>;
