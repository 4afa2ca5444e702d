use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FieldError;
use crate::messages::{MessageOverrides, MessageTemplate};

use super::{FieldClasses, FieldInput, FieldOptions, OnOff, TextInputType};

/// Data-only view of an options bag, as written in configuration documents.
///
/// `messages: null` suppresses every message while an absent `messages` key
/// keeps the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsDocument {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub readonly: Option<bool>,
    pub autofocus: Option<OnOff>,
    pub classes: Option<FieldClasses>,
    #[serde(default, deserialize_with = "present")]
    pub messages: Option<Option<IndexMap<String, String>>>,
    pub id: Option<String>,
    pub required: Option<bool>,
    pub items: Option<Vec<Value>>,
    pub bind_value: Option<String>,
    pub bind_label: Option<String>,
    pub multiple: Option<bool>,
    pub clearable: Option<bool>,
    pub auto_default_value: Option<bool>,
    pub allow_invalid: Option<bool>,
    pub loading: Option<bool>,
    pub hide_selected: Option<bool>,
    #[serde(rename = "type")]
    pub input_type: Option<TextInputType>,
    pub autocomplete: Option<OnOff>,
    pub maxlength: Option<MaxLength>,
    pub fixed_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxLength {
    Number(u64),
    Text(String),
}

// Distinguishes `"messages": null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl OptionsDocument {
    pub fn into_options(self) -> FieldOptions {
        let mut options = FieldOptions::new();
        let mut push = |input: Option<FieldInput>| {
            if let Some(input) = input {
                options.insert(input);
            }
        };

        push(self.label.map(|label| FieldInput::Label(Some(label))));
        push(self.placeholder.map(FieldInput::Placeholder));
        push(self.readonly.map(FieldInput::Readonly));
        push(self.autofocus.map(|flag| FieldInput::Autofocus(Some(flag))));
        push(self.classes.map(FieldInput::Classes));
        push(self.messages.map(|messages| {
            FieldInput::Messages(match messages {
                None => MessageOverrides::Suppress,
                Some(entries) => MessageOverrides::Merge(
                    entries
                        .into_iter()
                        .map(|(key, text)| (key, MessageTemplate::Text(text)))
                        .collect(),
                ),
            })
        }));
        push(self.id.map(|id| FieldInput::Id(Some(id))));
        push(self.required.map(|flag| FieldInput::Required(Some(flag))));
        push(self.items.map(|items| FieldInput::Items(Some(items))));
        push(self.bind_value.map(|path| FieldInput::BindValue(Some(path))));
        push(self.bind_label.map(|path| FieldInput::BindLabel(Some(path))));
        push(self.multiple.map(FieldInput::Multiple));
        push(self.clearable.map(|flag| FieldInput::Clearable(Some(flag))));
        push(self.auto_default_value.map(FieldInput::AutoDefaultValue));
        push(self.allow_invalid.map(|flag| FieldInput::AllowInvalid(Some(flag))));
        push(self.loading.map(|flag| FieldInput::Loading(Some(flag))));
        push(self.hide_selected.map(|flag| FieldInput::HideSelected(Some(flag))));
        push(self.input_type.map(FieldInput::InputType));
        push(self.autocomplete.map(|flag| FieldInput::Autocomplete(Some(flag))));
        push(self.maxlength.map(|max| {
            FieldInput::MaxLength(Some(match max {
                MaxLength::Number(n) => n.to_string(),
                MaxLength::Text(text) => text,
            }))
        }));
        push(self.fixed_value.map(|value| FieldInput::FixedValue(Some(value))));

        options
    }
}

impl FieldOptions {
    /// Reads an options bag from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, FieldError> {
        serde_json::from_value::<OptionsDocument>(value)
            .map(OptionsDocument::into_options)
            .map_err(|err| FieldError::invalid_options(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::options::InputKey;

    #[test]
    fn document_maps_to_inputs_in_declaration_order() {
        let options = FieldOptions::from_value(json!({
            "items": [{"id": 1}],
            "label": "User",
            "bindValue": "id",
            "maxlength": 20
        }))
        .unwrap();
        let keys: Vec<_> = options.iter().map(FieldInput::key).collect();
        assert_eq!(
            keys,
            vec![
                InputKey::Label,
                InputKey::Items,
                InputKey::BindValue,
                InputKey::MaxLength
            ]
        );
        assert_eq!(
            options.get(InputKey::MaxLength),
            Some(&FieldInput::MaxLength(Some("20".into())))
        );
    }

    #[test]
    fn null_messages_suppress_while_absent_messages_do_not() {
        let suppressed = FieldOptions::from_value(json!({"messages": null})).unwrap();
        assert_eq!(
            suppressed.get(InputKey::Messages),
            Some(&FieldInput::Messages(MessageOverrides::Suppress))
        );
        let absent = FieldOptions::from_value(json!({"label": "x"})).unwrap();
        assert_eq!(absent.get(InputKey::Messages), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FieldOptions::from_value(json!({"lable": "typo"})).unwrap_err();
        assert!(matches!(err, FieldError::InvalidOptions { .. }));
        assert!(err.to_string().contains("lable"));
    }

    #[test]
    fn classes_accept_every_shape() {
        let options = FieldOptions::from_value(json!({
            "classes": {"label": "bold", "control": ["a", "b"], "hint": {"muted": true}}
        }))
        .unwrap();
        let Some(FieldInput::Classes(classes)) = options.get(InputKey::Classes) else {
            panic!("classes missing");
        };
        assert_eq!(classes.len(), 3);
    }
}
