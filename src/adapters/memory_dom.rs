use crate::domain::model::{Channel, DeclaredElement, ElementId, NodeHandle, SelectOption};
use crate::domain::ports::ElementAccess;
use crate::utils::error::{BindError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::markup::{escape_text, strip_tags};

pub(crate) const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    pub tag: String,
    pub id: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    /// Form value for inputs and textareas.
    pub value: String,
    /// Inner markup (text content for leaf elements).
    pub content: String,
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn is_select(&self) -> bool {
        self.tag == "select"
    }

    fn read_value(&self) -> String {
        if self.is_select() {
            self.selected.clone().unwrap_or_default()
        } else {
            self.value.clone()
        }
    }

    fn write_value(&mut self, content: &str) {
        if self.is_select() {
            // Like a browser, a value with no matching option leaves nothing selected.
            self.selected = self
                .options
                .iter()
                .any(|o| o.value == content)
                .then(|| content.to_string());
        } else {
            self.value = content.to_string();
        }
    }
}

/// Element state the CLI and tests inspect after binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSnapshot {
    pub id: String,
    pub tag: String,
    pub value: String,
    pub text: String,
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

/// In-memory document implementing [`ElementAccess`].
///
/// Counts engine writes and records which elements have a change listener, so
/// hosts can dispatch simulated edits through [`MemoryDocument::user_edit`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    pub(crate) nodes: Vec<MemoryElement>,
    listeners: BTreeSet<String>,
    writes: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            nodes: vec![MemoryElement::new("#document")],
            listeners: BTreeSet::new(),
            writes: 0,
        }
    }

    /// Appends an element under `parent` (the document root when `None`).
    pub fn append(&mut self, parent: Option<&ElementId>, mut element: MemoryElement) -> Result<NodeHandle> {
        let parent = match parent {
            Some(id) => self.index_of(id)?,
            None => ROOT,
        };
        if let Some(id) = &element.id {
            element.attributes.insert("id".to_string(), id.clone());
        }
        element.parent = Some(parent);
        let index = self.nodes.len();
        self.nodes.push(element);
        self.nodes[parent].children.push(index);
        Ok(NodeHandle(index))
    }

    pub fn element(&self, id: &ElementId) -> Option<&MemoryElement> {
        self.find(id).map(|index| &self.nodes[index])
    }

    pub fn has_class(&self, id: &ElementId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    /// Value, text and markup writes made through [`ElementAccess::write`].
    /// Class and option-list operations are not counted.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn reset_write_count(&mut self) {
        self.writes = 0;
    }

    pub fn is_listening(&self, id: &ElementId) -> bool {
        self.listeners.contains(id.as_str())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Simulates a user changing an element's value. Returns whether a change
    /// listener is registered, i.e. whether the host should dispatch the event.
    pub fn user_edit(&mut self, id: &ElementId, value: &str) -> Result<bool> {
        let index = self.index_of(id)?;
        self.nodes[index].write_value(value);
        Ok(self.listeners.contains(id.as_str()))
    }

    /// Every element with an id, in document order.
    pub fn snapshot(&self) -> Vec<ElementSnapshot> {
        let mut snapshots = Vec::new();
        self.walk(ROOT, &mut |index| {
            let node = &self.nodes[index];
            if let Some(id) = &node.id {
                snapshots.push(ElementSnapshot {
                    id: id.clone(),
                    tag: node.tag.clone(),
                    value: node.read_value(),
                    text: strip_tags(&node.content),
                    classes: node.classes.clone(),
                    options: node.options.clone(),
                });
            }
        });
        snapshots
    }

    fn walk(&self, index: usize, visit: &mut dyn FnMut(usize)) {
        for &child in &self.nodes[index].children {
            visit(child);
            self.walk(child, visit);
        }
    }

    fn find(&self, id: &ElementId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id.as_str()))
    }

    fn index_of(&self, id: &ElementId) -> Result<usize> {
        self.find(id).ok_or_else(|| BindError::ElementNotFound {
            id: id.to_string(),
        })
    }

    fn node_mut(&mut self, id: &ElementId) -> Result<&mut MemoryElement> {
        let index = self.index_of(id)?;
        Ok(&mut self.nodes[index])
    }
}

impl ElementAccess for MemoryDocument {
    fn query_declared(&self, region: &ElementId, attribute: &str) -> Result<Vec<DeclaredElement>> {
        let region = self.index_of(region)?;
        let mut declared = Vec::new();
        self.walk(region, &mut |index| {
            let node = &self.nodes[index];
            if let Some(declaration) = node.attributes.get(attribute) {
                declared.push(DeclaredElement {
                    node: NodeHandle(index),
                    id: node.id.clone(),
                    declaration: declaration.clone(),
                });
            }
        });
        Ok(declared)
    }

    fn assign_id(&mut self, node: NodeHandle, id: &str) -> Result<()> {
        let element = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| BindError::ElementNotFound {
                id: id.to_string(),
            })?;
        element.id = Some(id.to_string());
        element.attributes.insert("id".to_string(), id.to_string());
        Ok(())
    }

    fn contains(&self, id: &ElementId) -> bool {
        self.find(id).is_some()
    }

    fn read(&self, id: &ElementId, channel: Channel) -> Result<String> {
        let node = &self.nodes[self.index_of(id)?];
        Ok(match channel {
            Channel::Value => node.read_value(),
            Channel::Text => strip_tags(&node.content),
            Channel::Html => node.content.clone(),
        })
    }

    fn write(&mut self, id: &ElementId, channel: Channel, content: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        match channel {
            Channel::Value => node.write_value(content),
            Channel::Text => node.content = escape_text(content),
            Channel::Html => node.content = content.to_string(),
        }
        self.writes += 1;
        Ok(())
    }

    fn add_class(&mut self, id: &ElementId, class: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, id: &ElementId, class: &str) -> Result<()> {
        self.node_mut(id)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn toggle_class(&mut self, id: &ElementId, class: &str) -> Result<()> {
        if self.has_class(id, class) {
            self.remove_class(id, class)
        } else {
            self.add_class(id, class)
        }
    }

    fn clear_classes(&mut self, id: &ElementId) -> Result<()> {
        self.node_mut(id)?.classes.clear();
        Ok(())
    }

    fn replace_options(&mut self, id: &ElementId, options: &[SelectOption]) -> Result<()> {
        let node = self.node_mut(id)?;
        node.options = options.to_vec();
        node.selected = node.options.first().map(|o| o.value.clone());
        Ok(())
    }

    fn listen(&mut self, id: &ElementId) -> Result<()> {
        self.index_of(id)?;
        self.listeners.insert(id.as_str().to_string());
        Ok(())
    }

    fn unlisten(&mut self, id: &ElementId) -> Result<()> {
        self.listeners.remove(id.as_str());
        Ok(())
    }
}
