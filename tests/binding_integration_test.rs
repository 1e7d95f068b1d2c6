use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use watch_commander::app::{Account, SAMPLE_FORM};
use watch_commander::domain::model::Channel;
use watch_commander::{
    BindError, Binder, BinderConfig, Cascade, Change, ElementAccess, ElementId, Field,
    MemoryDocument, Model, ValidityHook,
};

fn id(raw: &str) -> ElementId {
    ElementId::new(raw)
}

fn sample_form() -> MemoryDocument {
    MemoryDocument::parse(SAMPLE_FORM).unwrap()
}

#[test]
fn test_account_end_to_end() {
    let mut account = Account::new();
    let mut doc = sample_form();

    {
        let mut session = Binder::default()
            .attach(&mut account, &mut doc, "bound-form")
            .unwrap();
        assert_eq!(session.bindings().len(), 9);
        assert!(!session.is_valid(None));
        assert_eq!(session.invalid_properties(), ["FirstName", "LastName"]);
        assert!(session.dom().has_class(&id("first-name"), "invalid"));

        let stored = session.set("FirstName", "Ada").unwrap();
        assert_eq!(stored, json!("Ada"));
        assert_eq!(session.dom().read(&id("first-name"), Channel::Value).unwrap(), "Ada");
        assert_eq!(session.dom().read(&id("display-name"), Channel::Text).unwrap(), "Ada");
        assert!(session.is_valid(Some("FirstName")));
        assert!(!session.dom().has_class(&id("first-name"), "invalid"));
        assert!(!session.is_valid(None));

        // A user typing into the last-name input.
        assert!(session.dom_mut().user_edit(&id("last-name"), "Lovelace").unwrap());
        let stored = session.handle_change(&id("last-name")).unwrap();
        assert_eq!(stored, Some(json!("Lovelace")));
        assert!(session.is_valid(None));
        assert_eq!(
            session.dom().read(&id("display-name"), Channel::Text).unwrap(),
            "Ada Lovelace"
        );

        session.detach().unwrap();
    }

    assert_eq!(account.first_name, "Ada");
    assert_eq!(account.last_name, "Lovelace");
    assert_eq!(
        account.changes(),
        [
            "[FirstName] has changed from  to Ada.",
            "[LastName] has changed from  to Lovelace."
        ]
    );
    assert_eq!(doc.listener_count(), 0);
}

#[test]
fn test_salutation_options() {
    let mut account = Account::new();
    let mut doc = sample_form();

    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "#bound-form")
        .unwrap();
    let salutation = id("salutation");
    assert_eq!(session.dom().element(&salutation).unwrap().options.len(), 9);

    session.set("FirstName", "Ada").unwrap();
    session.set("Salutation", "3").unwrap();
    assert_eq!(session.dom().read(&salutation, Channel::Value).unwrap(), "3");
    assert_eq!(
        session.dom().read(&id("display-name"), Channel::Text).unwrap(),
        "Miss Ada"
    );
    assert_eq!(session.option_text(&json!(3), "getSalutations").unwrap(), "Miss");
    assert_eq!(session.option_text(&json!("42"), "getSalutations").unwrap(), "");

    // Picking an entry in the list writes back through the value binding.
    session.dom_mut().user_edit(&salutation, "6").unwrap();
    session.handle_change(&salutation).unwrap();
    assert_eq!(session.get("Salutation"), json!("6"));
    assert_eq!(
        session.dom().read(&id("display-name"), Channel::Text).unwrap(),
        "Doctor Ada"
    );
}

#[test]
fn test_listener_targets_value_binding_when_declared_first() {
    let mut account = Account::new();
    let mut doc = MemoryDocument::parse(
        r#"<div id="form"><select id="title" wc="val:Salutation,options:getSalutations"></select></div>"#,
    )
    .unwrap();

    let mut session = Binder::default().attach(&mut account, &mut doc, "form").unwrap();
    session.dom_mut().user_edit(&id("title"), "2").unwrap();
    assert_eq!(session.handle_change(&id("title")).unwrap(), Some(json!("2")));
    session.detach().unwrap();

    assert_eq!(account.salutation, "2");
}

#[test]
fn test_change_propagates_and_notifies_once() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();

    session.set("Balance", -20).unwrap();
    assert_eq!(session.dom().read(&id("balance"), Channel::Value).unwrap(), "-20");
    assert!(session.dom().has_class(&id("identity"), "credit"));

    session.set("Balance", "15").unwrap();
    assert_eq!(session.get("Balance"), json!(15));
    assert!(session.dom().has_class(&id("identity"), "overdue"));
    assert!(!session.dom().has_class(&id("identity"), "credit"));

    session.set("Timer", 4).unwrap();
    assert_eq!(
        session.dom().read(&id("timer"), Channel::Text).unwrap(),
        "Seconds active: 4"
    );
    session.detach().unwrap();

    assert_eq!(
        account.changes(),
        [
            "[Balance] has changed from 0 to -20.",
            "[Balance] has changed from -20 to 15."
        ]
    );
}

#[test]
fn test_unchanged_value_still_notifies_without_writing() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();

    session.dom_mut().reset_write_count();
    assert_eq!(session.set("FirstName", "").unwrap(), json!(""));
    assert_eq!(session.dom().write_count(), 0);
    assert_eq!(session.model().changes().len(), 1);
}

#[test]
fn test_setting_a_virtual_changes_nothing() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();

    session.dom_mut().reset_write_count();
    assert_eq!(session.set("FullName", "Grace Hopper").unwrap(), Value::Null);
    assert_eq!(session.set("NoSuchThing", 1).unwrap(), Value::Null);
    assert_eq!(session.get("FullName"), json!(""));
    assert_eq!(session.dom().write_count(), 0);
    assert!(session.model().changes().is_empty());
}

#[test]
fn test_redraw_writes_every_binding() {
    let mut account = Account::new();
    let mut doc = MemoryDocument::parse(
        r#"<form id="f">
  <input id="first" wc="val:FirstName">
  <input id="last" wc="val:LastName">
  <p id="full" wc="text:FullName"></p>
  <p id="display" wc="html:DisplayName"></p>
</form>"#,
    )
    .unwrap();

    let mut session = Binder::default().attach(&mut account, &mut doc, "f").unwrap();
    session.dom_mut().reset_write_count();

    session.redraw().unwrap();
    assert_eq!(session.dom().write_count(), session.bindings().len());

    session.redraw().unwrap();
    assert_eq!(session.dom().write_count(), 2 * session.bindings().len());
}

#[test]
fn test_redraw_on_sample_form_counts_channel_writes() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();
    session.dom_mut().reset_write_count();

    session.redraw().unwrap();
    // Seven val/text bindings plus the selection restored by the options
    // binding; the class binding only touches the class list.
    assert_eq!(session.bindings().len(), 9);
    assert_eq!(session.dom().write_count(), 8);
}

fn name_form() -> MemoryDocument {
    MemoryDocument::parse(
        r#"<form id="f"><input id="first" wc="val:FirstName"><input id="last" wc="val:LastName"></form>"#,
    )
    .unwrap()
}

#[test]
fn test_validity_follows_required_and_validated_fields() {
    let mut account = Account::new();
    account.last_name = "Cartlidge".to_string();
    let mut doc = name_form();
    let (first, last) = (id("first"), id("last"));

    let mut session = Binder::default().attach(&mut account, &mut doc, "f").unwrap();
    assert!(!session.is_valid(Some("FirstName")));
    assert!(session.is_valid(Some("LastName")));
    assert!(!session.is_valid(None));
    assert!(session.dom().has_class(&first, "invalid"));
    assert!(!session.dom().has_class(&last, "invalid"));

    session.set("FirstName", "K").unwrap();
    assert!(session.is_valid(None));
    assert!(!session.dom().has_class(&first, "invalid"));

    session.set("LastName", "Ca").unwrap();
    assert!(!session.is_valid(Some("LastName")));
    assert!(!session.is_valid(None));
    assert!(session.dom().has_class(&last, "invalid"));
    assert!(!session.dom().has_class(&first, "invalid"));
}

#[test]
fn test_clearing_a_required_field_invalidates_the_form() {
    let mut account = Account::new();
    account.first_name = "Kevin".to_string();
    account.last_name = "Cartlidge".to_string();
    let mut doc = name_form();
    let first = id("first");

    let mut session = Binder::default().attach(&mut account, &mut doc, "f").unwrap();
    assert!(session.is_valid(None));

    session.set("FirstName", "").unwrap();
    assert!(!session.is_valid(None));
    assert_eq!(session.invalid_properties(), ["FirstName"]);
    assert!(session.dom().has_class(&first, "invalid"));
    assert_eq!(session.dom().read(&first, Channel::Value).unwrap(), "");
}

#[test]
fn test_attach_and_detach_leave_model_untouched() {
    let mut account = Account::new();
    let mut doc = sample_form();

    let session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();
    let listened = session.listened_elements().count();
    assert_eq!(listened, 8);
    session.detach().unwrap();

    assert_eq!(account, Account::new());
    assert_eq!(doc.listener_count(), 0);

    // Dropping an attached session releases its listeners too.
    {
        let _session = Binder::default()
            .attach(&mut account, &mut doc, "bound-form")
            .unwrap();
    }
    assert_eq!(doc.listener_count(), 0);
}

#[test]
fn test_generated_ids_for_unnamed_elements() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();
    let generated = session
        .bindings()
        .iter()
        .find(|r| r.property == "hasFullName")
        .map(|r| r.element.clone())
        .unwrap();
    assert!(generated.as_str().starts_with("wc_"));
    assert_eq!(generated.as_str().len(), 3 + 24);
    assert_eq!(session.dom().read(&generated, Channel::Text).unwrap(), "false");
}

#[test]
fn test_unlistened_element_is_ignored() {
    let mut account = Account::new();
    let mut doc = sample_form();
    let mut session = Binder::default()
        .attach(&mut account, &mut doc, "bound-form")
        .unwrap();
    assert_eq!(session.handle_change(&id("nowhere")).unwrap(), None);

    // Listened, but the element already shows the model's value.
    assert_eq!(session.handle_change(&id("first-name")).unwrap(), None);
    assert!(session.model().changes().is_empty());
}

#[test]
fn test_attach_errors() {
    let mut account = Account::new();

    let mut doc = sample_form();
    assert!(matches!(
        Binder::default().attach(&mut account, &mut doc, "missing"),
        Err(BindError::RegionNotFound { .. })
    ));

    let mut doc = MemoryDocument::parse(r#"<div id="f"><input id="x" wc="val"></div>"#).unwrap();
    assert!(matches!(
        Binder::default().attach(&mut account, &mut doc, "f"),
        Err(BindError::MalformedBinding { .. })
    ));
    assert_eq!(doc.listener_count(), 0);
}

struct Counter {
    count: i64,
    mirror: i64,
    runaway: bool,
}

impl Model for Counter {
    fn fields(&self) -> Vec<Field> {
        vec![Field::data("Count"), Field::data("Mirror")]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "Count" => Some(json!(self.count)),
            "Mirror" => Some(json!(self.mirror)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> watch_commander::Result<()> {
        let n = value.as_i64().unwrap_or_default();
        match name {
            "Count" => self.count = n,
            _ => self.mirror = n,
        }
        Ok(())
    }

    fn call(&self, _name: &str) -> Option<Value> {
        None
    }

    fn on_change(&mut self, change: &Change<'_>, cascade: &mut Cascade) -> watch_commander::Result<()> {
        if change.property == "Count" {
            let next = change.new.as_i64().unwrap_or_default();
            if self.runaway {
                cascade.set("Count", next + 1);
            } else {
                cascade.set("Mirror", next * 2);
            }
        }
        Ok(())
    }
}

fn counter_form() -> MemoryDocument {
    MemoryDocument::parse(
        r#"<div id="c"><input id="count" wc="val:Count"><input id="mirror" wc="val:Mirror"></div>"#,
    )
    .unwrap()
}

#[test]
fn test_cascade_applies_follow_up_sets() {
    let mut counter = Counter {
        count: 0,
        mirror: 0,
        runaway: false,
    };
    let mut doc = counter_form();
    let mut session = Binder::default().attach(&mut counter, &mut doc, "c").unwrap();
    session.set("Count", 21).unwrap();
    assert_eq!(session.dom().read(&id("mirror"), Channel::Value).unwrap(), "42");
}

#[test]
fn test_cascade_depth_is_bounded() {
    let mut counter = Counter {
        count: 0,
        mirror: 0,
        runaway: true,
    };
    let mut doc = counter_form();
    let config = BinderConfig {
        max_cascade_depth: 5,
        ..BinderConfig::default()
    };
    let mut session = Binder::new(config).attach(&mut counter, &mut doc, "c").unwrap();
    let result = session.set("Count", 1);
    assert!(matches!(
        result,
        Err(BindError::CascadeDepthExceeded { depth: 5, .. })
    ));

    // The guard unwinds, so the session keeps working.
    assert!(matches!(
        session.set("Mirror", 3),
        Ok(Value::Number(_))
    ));
}

#[derive(Clone, Default)]
struct RecordingHook {
    seen: Rc<RefCell<Vec<(String, bool)>>>,
}

impl ValidityHook for RecordingHook {
    fn show_validity(
        &mut self,
        _dom: &mut dyn ElementAccess,
        property: &str,
        _element: &ElementId,
        valid: bool,
    ) -> watch_commander::Result<()> {
        self.seen.borrow_mut().push((property.to_string(), valid));
        Ok(())
    }
}

#[test]
fn test_custom_validity_hook() {
    let hook = RecordingHook::default();
    let mut account = Account::new();
    let mut doc = MemoryDocument::parse(
        r#"<form id="f"><input id="first" wc="val:FirstName"><input id="last" wc="val:LastName"></form>"#,
    )
    .unwrap();

    let mut session = Binder::default()
        .with_validity_hook(hook.clone())
        .attach(&mut account, &mut doc, "f")
        .unwrap();
    session.set("LastName", "Hopper").unwrap();
    session.detach().unwrap();

    assert_eq!(
        *hook.seen.borrow(),
        vec![
            ("FirstName".to_string(), false),
            ("LastName".to_string(), false),
            ("LastName".to_string(), true),
        ]
    );
    assert!(!doc.has_class(&id("first"), "invalid"));
}
