use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable handle to one bound element (its id, without the leading `#`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        match id.strip_prefix('#') {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `#id` form used by selector-based element access.
    pub fn selector(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Plain data, readable and writable.
    Data,
    /// Zero-argument derived accessor, read-only.
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Data,
        }
    }

    pub fn derived(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Virtual,
        }
    }
}

/// Rendering strategy named on the left of a `kind:Property` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    Val,
    Text,
    Html,
    Toggle,
    AddClass,
    RemoveClass,
    Class,
    Options,
    /// Kinds this version does not know; kept so newer markup still attaches.
    Unknown(String),
}

impl AccessorKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "val" => AccessorKind::Val,
            "text" => AccessorKind::Text,
            "html" => AccessorKind::Html,
            "toggle" => AccessorKind::Toggle,
            "addClass" => AccessorKind::AddClass,
            "removeClass" => AccessorKind::RemoveClass,
            "class" => AccessorKind::Class,
            "options" => AccessorKind::Options,
            other => AccessorKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AccessorKind::Val => "val",
            AccessorKind::Text => "text",
            AccessorKind::Html => "html",
            AccessorKind::Toggle => "toggle",
            AccessorKind::AddClass => "addClass",
            AccessorKind::RemoveClass => "removeClass",
            AccessorKind::Class => "class",
            AccessorKind::Options => "options",
            AccessorKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub element: ElementId,
    pub property: String,
    pub kind: AccessorKind,
}

/// Which rendered content of an element a read or write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Value,
    Text,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Opaque handle an element-access adapter hands out for elements found by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub usize);

/// An element carrying the binding attribute, as found under the bound region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredElement {
    pub node: NodeHandle,
    pub id: Option<String>,
    pub declaration: String,
}

/// Arguments of a model change notification.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    pub property: &'a str,
    pub old: &'a Value,
    pub new: &'a Value,
}

/// Follow-up assignments requested by a model's change hook.
///
/// The session applies them, in order, right after the hook returns.
#[derive(Debug, Default)]
pub struct Cascade {
    pending: Vec<(String, Value)>,
}

impl Cascade {
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        self.pending.push((property.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.pending)
    }
}
