use std::cell::Cell;
use std::rc::Rc;

use labeled_fields::control::validators::{FIELD_BINDING, FIELD_EXISTS, REQUIRED, error};
use labeled_fields::messages::DEFAULT_MESSAGES;
use labeled_fields::prelude::*;
use serde_json::{Value, json};

fn default_message(key: &str) -> String {
    DEFAULT_MESSAGES
        .iter()
        .find(|(entry, _)| *entry == key)
        .map(|(_, text)| text.to_string())
        .unwrap()
}

fn required_text(outer: &FieldControl) -> LabeledField {
    FieldBuilder::text().bind_named(outer, "name").build()
}

#[test]
fn model_writes_are_idempotent_and_never_dirty() {
    let outer = FieldControl::new(json!("abc"), Vec::new());
    let field = required_text(&outer);

    field.write_value(json!("abc"));
    field.write_value(json!("abc"));
    assert_eq!(field.value(), json!("abc"));
    assert!(outer.pristine());

    outer.set_value(json!("abcd"), SetValueOptions::default());
    assert_eq!(field.value(), json!("abcd"));
    assert!(outer.pristine());
}

#[test]
fn pristine_required_error_stays_hidden_until_user_edits() {
    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = required_text(&outer);

    assert!(outer.has_error(REQUIRED));
    assert!(field.error_messages().is_empty());
    assert_eq!(field.error_display(), ErrorDisplay::PristineSuppressed);
    assert!(outer.pristine());

    assert!(field.input(json!("")));
    assert_eq!(field.error_display(), ErrorDisplay::DirtyVisible);
    assert_eq!(field.error_messages(), vec![default_message(REQUIRED)]);

    field.input(json!("Bret"));
    assert!(outer.valid());
    assert!(field.error_messages().is_empty());
}

#[test]
fn non_required_error_on_pristine_control_becomes_visible() {
    let outer = FieldControl::new(json!(9), vec![Validator::required()]);
    let field = FieldBuilder::select()
        .bind(&outer)
        .inputs(
            FieldOptions::new()
                .items(vec![json!({"id": 1}), json!({"id": 2})])
                .bind_value("id")
                .allow_invalid(true),
        )
        .build();

    assert!(outer.dirty());
    assert_eq!(field.error_messages(), vec![default_message(FIELD_EXISTS)]);
}

#[test]
fn destroy_releases_the_outer_control() {
    let outer = FieldControl::new(json!("abc"), vec![Validator::required()]);
    let field = required_text(&outer);
    assert_eq!(outer.validator_count(), 2);

    field.destroy();
    assert_eq!(outer.validator_count(), 1);
    assert_eq!(outer.listener_count(), 0);

    outer.set_value(json!("xyz"), SetValueOptions::default());
    assert_eq!(field.value(), json!("abc"));
    assert!(field.outer_control().is_none());
}

#[test]
fn touch_marks_outer_and_notifies_listeners() {
    let outer = FieldControl::new(Value::Null, Vec::new());
    let field = required_text(&outer);
    let touches = Rc::new(Cell::new(0));
    let counter = Rc::clone(&touches);
    field.register_touch_listener(move || counter.set(counter.get() + 1));

    field.touch();
    assert_eq!(touches.get(), 1);
    assert!(outer.touched());
}

#[test]
fn disabled_state_follows_the_outer_control() {
    let outer = FieldControl::new(json!("abc"), Vec::new());
    let field = required_text(&outer);

    outer.disable(true);
    assert!(field.internal_control().disabled());
    assert!(field.error_messages().is_empty());

    outer.enable(true);
    assert!(!field.internal_control().disabled());
}

#[test]
fn error_without_message_displays_its_key() {
    let outer = FieldControl::new(Value::Null, Vec::new());
    let field = required_text(&outer);

    outer.set_value(json!("o"), SetValueOptions::default());
    assert_eq!(field.error_messages(), vec!["field_forbid".to_string()]);
    assert!(outer.dirty());
}

#[test]
fn suppressed_messages_fall_back_to_keys() {
    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = FieldBuilder::text()
        .bind(&outer)
        .input(FieldInput::Messages(MessageOverrides::Suppress))
        .build();

    assert!(field.messages().is_empty());
    field.input(json!(""));
    assert_eq!(field.error_messages(), vec![REQUIRED.to_string()]);
}

#[test]
fn later_messages_change_is_retranslated() {
    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = FieldBuilder::text()
        .bind(&outer)
        .input(FieldInput::Messages(
            MessageOverrides::default().with(REQUIRED, "Fill it in"),
        ))
        .build();
    field.input(json!(""));
    assert_eq!(field.error_messages(), vec!["Fill it in".to_string()]);

    field.set_input(FieldInput::Messages(
        MessageOverrides::default().with(REQUIRED, MessageTemplate::lazy(|| "Needed".into())),
    ));
    assert_eq!(field.error_messages(), vec!["Needed".to_string()]);
}

#[test]
fn opaque_validators_are_probed_for_required() {
    let mandatory = FieldControl::new(
        Value::Null,
        vec![Validator::new(|value| value.is_null().then(|| error(REQUIRED)))],
    );
    assert!(required_text(&mandatory).is_required());

    let other = FieldControl::new(
        Value::Null,
        vec![Validator::new(|value| (value == "x").then(|| error("no_x")))],
    );
    assert!(!required_text(&other).is_required());

    let marked = FieldBuilder::text()
        .bind(&mandatory)
        .input(FieldInput::Required(Some(false)))
        .build();
    assert!(!marked.is_required());
}

#[test]
fn plain_text_reports_unbound_values() {
    let outer = FieldControl::new(json!({"id": 1}), Vec::new());
    let field = FieldBuilder::plain_text()
        .bind(&outer)
        .input(FieldInput::BindLabel(Some("name".into())))
        .build();

    assert_eq!(field.display_value(), None);
    assert_eq!(field.error_messages(), vec![default_message(FIELD_BINDING)]);

    outer.set_value(json!({"name": "Bret"}), SetValueOptions::default());
    assert_eq!(field.display_value(), Some(json!("Bret")));
    assert!(field.error_messages().is_empty());
}

#[test]
fn labels_and_messages_go_through_the_translator() {
    let translator = CatalogTranslator::default()
        .with_entry("form.name", "Nom")
        .with_entry(default_message(REQUIRED), "Champ obligatoire.");
    let context = FieldContext::new().with_translator(Rc::new(translator));
    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = FieldBuilder::text()
        .context(context)
        .bind(&outer)
        .inputs(FieldOptions::new().label("form.name"))
        .build();

    assert_eq!(field.label().as_deref(), Some("Nom"));
    field.input(json!(""));
    assert_eq!(field.error_messages(), vec!["Champ obligatoire.".to_string()]);
}

#[test]
fn ids_come_from_input_then_control_name_then_generator() {
    let outer = FieldControl::new(Value::Null, Vec::new());
    let named = required_text(&outer);
    assert_eq!(named.id().as_deref(), Some("name"));

    let explicit = FieldBuilder::text()
        .bind_named(&outer, "name")
        .inputs(FieldOptions::new().id("custom"))
        .build();
    assert_eq!(explicit.id().as_deref(), Some("custom"));

    let context = FieldContext::new();
    let first = FieldBuilder::text().context(context.clone()).build();
    let second = FieldBuilder::text().context(context).build();
    assert_eq!(first.id().as_deref(), Some("pi-field-1"));
    assert_eq!(second.id().as_deref(), Some("pi-field-2"));
}
