use crate::domain::model::{
    Cascade, Change, Channel, DeclaredElement, ElementId, Field, NodeHandle, SelectOption,
};
use crate::utils::error::Result;
use serde_json::Value;

/// Per-field check, evaluated with the model captured as context.
pub type Validator<'m> = Box<dyn Fn(&Value) -> Result<bool> + 'm>;

/// Capability set a bindable model exposes to the engine.
pub trait Model {
    /// Own fields in declaration order. Read once at attach time.
    fn fields(&self) -> Vec<Field>;

    /// Current value of a data field, `None` when the model has no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Stores a data field. The model may convert or clamp what it stores.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Invokes a zero-argument derived accessor or method by name.
    fn call(&self, name: &str) -> Option<Value>;

    fn on_change(&mut self, _change: &Change<'_>, _cascade: &mut Cascade) -> Result<()> {
        Ok(())
    }

    fn is_required(&self, _name: &str) -> bool {
        false
    }

    fn validator(&self, _name: &str) -> Option<Validator<'_>> {
        None
    }
}

/// The element-access boundary: everything the engine does to a document.
pub trait ElementAccess {
    /// Elements under `region` carrying `attribute`, in document order.
    fn query_declared(&self, region: &ElementId, attribute: &str) -> Result<Vec<DeclaredElement>>;

    fn assign_id(&mut self, node: NodeHandle, id: &str) -> Result<()>;

    fn contains(&self, id: &ElementId) -> bool;

    fn read(&self, id: &ElementId, channel: Channel) -> Result<String>;

    fn write(&mut self, id: &ElementId, channel: Channel, content: &str) -> Result<()>;

    fn add_class(&mut self, id: &ElementId, class: &str) -> Result<()>;

    fn remove_class(&mut self, id: &ElementId, class: &str) -> Result<()>;

    fn toggle_class(&mut self, id: &ElementId, class: &str) -> Result<()>;

    fn clear_classes(&mut self, id: &ElementId) -> Result<()>;

    fn replace_options(&mut self, id: &ElementId, options: &[SelectOption]) -> Result<()>;

    /// Registers the element's change listener, replacing any previous one.
    fn listen(&mut self, id: &ElementId) -> Result<()>;

    fn unlisten(&mut self, id: &ElementId) -> Result<()>;
}

/// Presents the outcome of a validation pass on the bound element.
pub trait ValidityHook {
    fn show_validity(
        &mut self,
        dom: &mut dyn ElementAccess,
        property: &str,
        element: &ElementId,
        valid: bool,
    ) -> Result<()>;
}
