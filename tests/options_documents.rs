use std::rc::Rc;

use labeled_fields::control::validators::REQUIRED;
use labeled_fields::io::{DocumentFormat, load_options_str};
use labeled_fields::options::InputKey;
use labeled_fields::prelude::*;
use serde_json::{Value, json};

#[test]
fn document_builds_a_select_field() {
    let options = load_options_str(
        r#"{
            "label": "Country",
            "items": [{"code": "fr", "name": "France"}, {"code": "de", "name": "Germany"}],
            "bindValue": "code",
            "bindLabel": "name",
            "allowInvalid": false
        }"#,
        DocumentFormat::Json,
    )
    .unwrap();
    let outer = FieldControl::new(json!("xx"), Vec::new());
    let field = FieldBuilder::select()
        .context(FieldContext::new().with_queue(Rc::new(ImmediateQueue)))
        .bind_named(&outer, "country")
        .options(options)
        .build();

    assert_eq!(field.label().as_deref(), Some("Country"));
    assert_eq!(field.id().as_deref(), Some("country"));
    assert_eq!(outer.value(), json!("fr"));
    assert_eq!(field.selected_labels(), vec![json!("France")]);
}

#[test]
fn null_messages_suppress_defaults() {
    let options = load_options_str(r#"{"messages": null}"#, DocumentFormat::Json).unwrap();
    assert_eq!(
        options.get(InputKey::Messages),
        Some(&FieldInput::Messages(MessageOverrides::Suppress))
    );

    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = FieldBuilder::text().bind(&outer).inputs(options).build();
    field.input(json!(""));
    assert_eq!(field.error_messages(), vec![REQUIRED.to_string()]);
}

#[test]
fn document_messages_override_defaults() {
    let options = load_options_str(
        r#"{"messages": {"required": "Please choose one"}}"#,
        DocumentFormat::Json,
    )
    .unwrap();
    let outer = FieldControl::new(Value::Null, vec![Validator::required()]);
    let field = FieldBuilder::text().bind(&outer).inputs(options).build();
    field.input(json!(""));
    assert_eq!(field.error_messages(), vec!["Please choose one".to_string()]);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = load_options_str(r#"{"colour": "red"}"#, DocumentFormat::Json).unwrap_err();
    assert!(format!("{err:#}").contains("invalid json options document"));
}

#[test]
fn options_bag_changes_apply_only_what_differs() {
    let outer = FieldControl::new(json!("hello"), Vec::new());
    let field = FieldBuilder::text()
        .bind(&outer)
        .options(FieldOptions::new().label("Greeting").placeholder("Say hi"))
        .build();
    assert_eq!(field.placeholder(), "Say hi");

    field.set_options(FieldOptions::new().label("Greeting").placeholder("Say hello"));
    field.do_check();
    assert_eq!(field.label().as_deref(), Some("Greeting"));
    assert_eq!(field.placeholder(), "Say hello");

    field.set_options(FieldOptions::new().label("Greeting").readonly(true));
    field.do_check();
    assert!(field.readonly());
    // Removed entries are not reported, so the last placeholder stays.
    assert_eq!(field.placeholder(), "Say hello");
}
