//! Lifecycle controller.
//!
//! [`Binder`] is the stateless construction step; [`Binder::attach`] borrows a
//! model and a document and returns an attached [`Session`]. All engine state
//! (classification, binding records, listeners, invalid set) lives in the
//! session, so the model keeps its shape and detaching simply releases the
//! listeners and drops the session.

use crate::config::BinderConfig;
use crate::domain::model::{BindingRecord, Cascade, Change, Channel, ElementId};
use crate::domain::ports::{ElementAccess, Model, ValidityHook};
use crate::utils::error::{BindError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

use super::accessor::PropertyClassification;
use super::parser;
use super::validation::{InvalidClassHook, InvalidSet};
use super::value::loose_eq;

pub struct Binder {
    config: BinderConfig,
    hook: Option<Box<dyn ValidityHook>>,
}

impl Binder {
    pub fn new(config: BinderConfig) -> Self {
        Self { config, hook: None }
    }

    /// Replaces the default `invalid` class toggle.
    pub fn with_validity_hook(mut self, hook: impl ValidityHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn attach<'a, M: Model, D: ElementAccess>(
        self,
        model: &'a mut M,
        dom: &'a mut D,
        region: &str,
    ) -> Result<Session<'a, M, D>> {
        let region = ElementId::new(region);
        if !dom.contains(&region) {
            return Err(BindError::RegionNotFound {
                region: region.to_string(),
            });
        }

        let classification = PropertyClassification::classify(&*model)?;
        let parsed = parser::scan(&mut *dom, &region, &self.config)?;
        let hook = self
            .hook
            .unwrap_or_else(|| Box::new(InvalidClassHook::new(self.config.invalid_class.clone())));

        let mut session = Session {
            model,
            dom,
            config: self.config,
            region,
            classification,
            bindings: parsed.records,
            listeners: BTreeMap::new(),
            invalids: InvalidSet::default(),
            hook,
            depth: 0,
            attached: true,
        };

        // Registered one by one so a failure part-way is undone when the session drops.
        for (element, index) in parsed.listeners {
            session.dom.listen(&element)?;
            session.listeners.insert(element, index);
        }

        session.apply_bindings(None, false)?;
        tracing::debug!(
            "Attached to #{} with {} bindings ({} invalid)",
            session.region,
            session.bindings.len(),
            session.invalids.len()
        );
        Ok(session)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(BinderConfig::default())
    }
}

/// A model attached to a region of a document.
pub struct Session<'a, M: Model, D: ElementAccess> {
    pub(crate) model: &'a mut M,
    pub(crate) dom: &'a mut D,
    pub(crate) config: BinderConfig,
    pub(crate) region: ElementId,
    pub(crate) classification: PropertyClassification,
    pub(crate) bindings: Vec<BindingRecord>,
    pub(crate) listeners: BTreeMap<ElementId, usize>,
    pub(crate) invalids: InvalidSet,
    pub(crate) hook: Box<dyn ValidityHook>,
    pub(crate) depth: usize,
    attached: bool,
}

impl<'a, M: Model, D: ElementAccess> Session<'a, M, D> {
    pub fn get(&self, property: &str) -> Value {
        self.classification.get(&*self.model, property)
    }

    /// Assigns a data property and propagates the change; returns the value the
    /// model actually holds afterwards, or `null` for virtual and unknown names.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<Value> {
        if self.depth >= self.config.max_cascade_depth {
            return Err(BindError::CascadeDepthExceeded {
                property: property.to_string(),
                depth: self.config.max_cascade_depth,
            });
        }
        self.depth += 1;
        let result = self.set_inner(property, value.into());
        self.depth -= 1;
        result
    }

    fn set_inner(&mut self, property: &str, value: Value) -> Result<Value> {
        let Some(assignment) = self.classification.assign(&mut *self.model, property, value)? else {
            tracing::debug!("Ignoring set of '{}': not a data property", property);
            return Ok(Value::Null);
        };

        if assignment.changed {
            tracing::debug!(
                "'{}' changed from {} to {}",
                property,
                assignment.old,
                assignment.actual
            );
            self.apply_bindings(Some(property), false)?;
        }

        let mut cascade = Cascade::default();
        let change = Change {
            property,
            old: &assignment.old,
            new: &assignment.actual,
        };
        self.model.on_change(&change, &mut cascade)?;
        for (next, next_value) in cascade.drain() {
            self.set(&next, next_value)?;
        }

        Ok(assignment.actual)
    }

    /// Entry point for an element's change event.
    ///
    /// Reads the element's rendered value and, when it differs from the bound
    /// property, writes it through `set`. Returns the stored value, or `None`
    /// when nothing was written.
    pub fn handle_change(&mut self, element: &ElementId) -> Result<Option<Value>> {
        let Some(&index) = self.listeners.get(element) else {
            tracing::trace!("No listener on #{}", element);
            return Ok(None);
        };
        let property = self.bindings[index].property.clone();
        let rendered = Value::String(self.dom.read(element, Channel::Value)?);
        if loose_eq(&self.get(&property), &rendered) {
            return Ok(None);
        }
        self.set(&property, rendered).map(Some)
    }

    /// Re-renders every binding, even where the element already shows the value.
    pub fn redraw(&mut self) -> Result<()> {
        self.apply_bindings(None, true)
    }

    pub fn is_valid(&self, property: Option<&str>) -> bool {
        self.invalids.is_valid(property)
    }

    pub fn invalid_properties(&self) -> Vec<String> {
        self.invalids.iter().map(str::to_string).collect()
    }

    /// Text of the option matching `value` among those `options_property` yields.
    pub fn option_text(&self, value: &Value, options_property: &str) -> Result<String> {
        self.classification
            .option_text(&*self.model, value, options_property)
    }

    pub fn model(&self) -> &M {
        &*self.model
    }

    /// Direct model access for bulk updates; follow with [`Session::redraw`].
    pub fn model_mut(&mut self) -> &mut M {
        &mut *self.model
    }

    pub fn dom(&self) -> &D {
        &*self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut *self.dom
    }

    pub fn region(&self) -> &ElementId {
        &self.region
    }

    pub fn bindings(&self) -> &[BindingRecord] {
        &self.bindings
    }

    pub fn classification(&self) -> &PropertyClassification {
        &self.classification
    }

    pub fn listened_elements(&self) -> impl Iterator<Item = &ElementId> {
        self.listeners.keys()
    }

    /// Releases every listener and ends the session.
    pub fn detach(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        self.attached = false;
        let mut first_error = None;
        for element in std::mem::take(&mut self.listeners).into_keys() {
            if let Err(e) = self.dom.unlisten(&element) {
                first_error.get_or_insert(e);
            }
        }
        tracing::debug!("Detached from #{}", self.region);
        first_error.map_or(Ok(()), Err)
    }
}

impl<'a, M: Model, D: ElementAccess> Drop for Session<'a, M, D> {
    fn drop(&mut self) {
        if self.attached {
            if let Err(e) = self.teardown() {
                tracing::warn!("Failed to release listeners on drop: {}", e);
            }
        }
    }
}
