//! Binding applier: decides which records a change touches and renders them.

use crate::domain::model::{AccessorKind, BindingRecord, Channel};
use crate::domain::ports::{ElementAccess, Model};
use crate::utils::error::{BindError, Result};
use serde_json::Value;

use super::accessor::options_from_value;
use super::session::Session;
use super::value::display;

impl<'a, M: Model, D: ElementAccess> Session<'a, M, D> {
    /// Renders the records affected by a change to `property`.
    ///
    /// `None` (or an empty name) and `force_all` select every record. Records
    /// bound to virtuals are always selected since their inputs are unknown.
    pub fn apply_bindings(&mut self, property: Option<&str>, force_all: bool) -> Result<()> {
        let apply_all = force_all || property.map_or(true, str::is_empty);
        for index in 0..self.bindings.len() {
            let record = &self.bindings[index];
            let selected = apply_all
                || property == Some(record.property.as_str())
                || self.classification.is_virtual(&record.property);
            if selected {
                let record = record.clone();
                self.bind(&record, force_all)?;
            }
        }
        Ok(())
    }

    /// Renders one record into its element, then revalidates its property.
    pub fn bind(&mut self, record: &BindingRecord, force_all: bool) -> Result<()> {
        let element = &record.element;
        if !self.dom.contains(element) {
            return Err(BindError::ElementNotFound {
                id: element.to_string(),
            });
        }
        tracing::trace!("Binding {}:{} on #{}", record.kind, record.property, element);

        let value = match &record.kind {
            AccessorKind::Val | AccessorKind::Text | AccessorKind::Html => {
                let channel = match record.kind {
                    AccessorKind::Val => Channel::Value,
                    AccessorKind::Text => Channel::Text,
                    _ => Channel::Html,
                };
                let value = self.get(&record.property);
                let rendered = display(&value);
                if force_all || self.dom.read(element, channel)? != rendered {
                    self.dom.write(element, channel, &rendered)?;
                }
                value
            }
            AccessorKind::Toggle | AccessorKind::AddClass | AccessorKind::RemoveClass => {
                let value = self.get(&record.property);
                // A value may name several classes, separated by whitespace.
                for class in display(&value).split_whitespace() {
                    match record.kind {
                        AccessorKind::Toggle => self.dom.toggle_class(element, class)?,
                        AccessorKind::AddClass => self.dom.add_class(element, class)?,
                        _ => self.dom.remove_class(element, class)?,
                    }
                }
                value
            }
            AccessorKind::Class => {
                let value = self.get(&record.property);
                self.dom.clear_classes(element)?;
                for class in display(&value).split_whitespace() {
                    self.dom.add_class(element, class)?;
                }
                value
            }
            AccessorKind::Options => {
                let selected = self.dom.read(element, Channel::Value)?;
                let options = options_from_value(&record.property, self.get(&record.property))?;
                self.dom.replace_options(element, &options)?;
                self.dom.write(element, Channel::Value, &selected)?;
                // A data property holds the list itself; the selection must not replace it.
                if !self.classification.is_property(&record.property) {
                    self.set(&record.property, Value::String(selected))?;
                }
                self.get(&record.property)
            }
            AccessorKind::Unknown(kind) => {
                tracing::trace!("Skipping unknown binding kind '{}' on #{}", kind, element);
                Value::Null
            }
        };

        let valid = self.invalids.validate(&*self.model, &record.property, &value)?;
        self.hook
            .show_validity(&mut *self.dom, &record.property, element, valid)
    }
}
