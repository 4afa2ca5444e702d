//! Field inputs and the options bag they can be grouped into.
//!
//! Each configurable property of a field is one [`FieldInput`] variant. The
//! same value can reach a field as a direct property set or through a
//! [`FieldOptions`] bag that is diffed on every check cycle.

mod changes;
mod document;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::Validator;
use crate::messages::MessageOverrides;
use crate::utils::ElementMatcher;

pub use changes::{InputChanges, OptionsDiffer, SimpleChange};
pub use document::OptionsDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextInputType {
    #[default]
    Text,
    Password,
    Email,
    Search,
}

/// CSS class value(s) for one class slot (`label`, `control`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassValue {
    Single(String),
    Many(Vec<String>),
    Toggles(IndexMap<String, bool>),
}

pub type FieldClasses = IndexMap<String, ClassValue>;

/// Veto consulted before a user selection is accepted.
#[derive(Clone)]
pub struct ChangeGuard(Rc<dyn Fn(&Value) -> bool>);

impl ChangeGuard {
    pub fn new(guard: impl Fn(&Value) -> bool + 'static) -> Self {
        Self(Rc::new(guard))
    }

    pub fn allows(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl PartialEq for ChangeGuard {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ChangeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeGuard(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    Label,
    Placeholder,
    Readonly,
    Autofocus,
    Classes,
    Messages,
    Validators,
    Id,
    Required,
    Items,
    BindValue,
    BindLabel,
    CompareWith,
    Multiple,
    Clearable,
    AutoDefaultValue,
    AllowInvalid,
    Loading,
    ConfirmChange,
    HideSelected,
    InputType,
    Autocomplete,
    MaxLength,
    FixedValue,
}

impl InputKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Placeholder => "placeholder",
            Self::Readonly => "readonly",
            Self::Autofocus => "autofocus",
            Self::Classes => "classes",
            Self::Messages => "messages",
            Self::Validators => "validators",
            Self::Id => "id",
            Self::Required => "required",
            Self::Items => "items",
            Self::BindValue => "bindValue",
            Self::BindLabel => "bindLabel",
            Self::CompareWith => "compareWith",
            Self::Multiple => "multiple",
            Self::Clearable => "clearable",
            Self::AutoDefaultValue => "autoDefaultValue",
            Self::AllowInvalid => "allowInvalid",
            Self::Loading => "loading",
            Self::ConfirmChange => "confirmChange",
            Self::HideSelected => "hideSelected",
            Self::InputType => "type",
            Self::Autocomplete => "autocomplete",
            Self::MaxLength => "maxlength",
            Self::FixedValue => "fixedValue",
        }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configurable property and its value. `None` payloads stand for an
/// input that was never given a value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Label(Option<String>),
    Placeholder(String),
    Readonly(bool),
    Autofocus(Option<OnOff>),
    Classes(FieldClasses),
    Messages(MessageOverrides),
    Validators(Vec<Validator>),
    Id(Option<String>),
    Required(Option<bool>),
    Items(Option<Vec<Value>>),
    BindValue(Option<String>),
    BindLabel(Option<String>),
    CompareWith(Option<ElementMatcher>),
    Multiple(bool),
    Clearable(Option<bool>),
    AutoDefaultValue(bool),
    AllowInvalid(Option<bool>),
    Loading(Option<bool>),
    ConfirmChange(Option<ChangeGuard>),
    HideSelected(Option<bool>),
    InputType(TextInputType),
    Autocomplete(Option<OnOff>),
    MaxLength(Option<String>),
    FixedValue(Option<String>),
}

impl FieldInput {
    pub fn key(&self) -> InputKey {
        match self {
            Self::Label(_) => InputKey::Label,
            Self::Placeholder(_) => InputKey::Placeholder,
            Self::Readonly(_) => InputKey::Readonly,
            Self::Autofocus(_) => InputKey::Autofocus,
            Self::Classes(_) => InputKey::Classes,
            Self::Messages(_) => InputKey::Messages,
            Self::Validators(_) => InputKey::Validators,
            Self::Id(_) => InputKey::Id,
            Self::Required(_) => InputKey::Required,
            Self::Items(_) => InputKey::Items,
            Self::BindValue(_) => InputKey::BindValue,
            Self::BindLabel(_) => InputKey::BindLabel,
            Self::CompareWith(_) => InputKey::CompareWith,
            Self::Multiple(_) => InputKey::Multiple,
            Self::Clearable(_) => InputKey::Clearable,
            Self::AutoDefaultValue(_) => InputKey::AutoDefaultValue,
            Self::AllowInvalid(_) => InputKey::AllowInvalid,
            Self::Loading(_) => InputKey::Loading,
            Self::ConfirmChange(_) => InputKey::ConfirmChange,
            Self::HideSelected(_) => InputKey::HideSelected,
            Self::InputType(_) => InputKey::InputType,
            Self::Autocomplete(_) => InputKey::Autocomplete,
            Self::MaxLength(_) => InputKey::MaxLength,
            Self::FixedValue(_) => InputKey::FixedValue,
        }
    }
}

/// Options bag: at most one input per key, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    inputs: IndexMap<InputKey, FieldInput>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, input: FieldInput) -> Self {
        self.insert(input);
        self
    }

    pub fn insert(&mut self, input: FieldInput) -> Option<FieldInput> {
        self.inputs.insert(input.key(), input)
    }

    pub fn remove(&mut self, key: InputKey) -> Option<FieldInput> {
        self.inputs.shift_remove(&key)
    }

    pub fn get(&self, key: InputKey) -> Option<&FieldInput> {
        self.inputs.get(&key)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInput> {
        self.inputs.values()
    }

    pub fn into_inputs(self) -> Vec<FieldInput> {
        self.inputs.into_values().collect()
    }

    pub fn label(self, label: impl Into<String>) -> Self {
        self.with(FieldInput::Label(Some(label.into())))
    }

    pub fn placeholder(self, placeholder: impl Into<String>) -> Self {
        self.with(FieldInput::Placeholder(placeholder.into()))
    }

    pub fn readonly(self, readonly: bool) -> Self {
        self.with(FieldInput::Readonly(readonly))
    }

    pub fn autofocus(self, autofocus: OnOff) -> Self {
        self.with(FieldInput::Autofocus(Some(autofocus)))
    }

    pub fn classes(self, classes: FieldClasses) -> Self {
        self.with(FieldInput::Classes(classes))
    }

    pub fn messages(self, messages: MessageOverrides) -> Self {
        self.with(FieldInput::Messages(messages))
    }

    pub fn validators(self, validators: Vec<Validator>) -> Self {
        self.with(FieldInput::Validators(validators))
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.with(FieldInput::Id(Some(id.into())))
    }

    pub fn required(self, required: bool) -> Self {
        self.with(FieldInput::Required(Some(required)))
    }

    pub fn items(self, items: Vec<Value>) -> Self {
        self.with(FieldInput::Items(Some(items)))
    }

    pub fn bind_value(self, path: impl Into<String>) -> Self {
        self.with(FieldInput::BindValue(Some(path.into())))
    }

    pub fn bind_label(self, path: impl Into<String>) -> Self {
        self.with(FieldInput::BindLabel(Some(path.into())))
    }

    pub fn compare_with(self, matcher: ElementMatcher) -> Self {
        self.with(FieldInput::CompareWith(Some(matcher)))
    }

    pub fn multiple(self, multiple: bool) -> Self {
        self.with(FieldInput::Multiple(multiple))
    }

    pub fn clearable(self, clearable: bool) -> Self {
        self.with(FieldInput::Clearable(Some(clearable)))
    }

    pub fn auto_default_value(self, enabled: bool) -> Self {
        self.with(FieldInput::AutoDefaultValue(enabled))
    }

    pub fn allow_invalid(self, allow: bool) -> Self {
        self.with(FieldInput::AllowInvalid(Some(allow)))
    }

    pub fn loading(self, loading: bool) -> Self {
        self.with(FieldInput::Loading(Some(loading)))
    }

    pub fn confirm_change(self, guard: ChangeGuard) -> Self {
        self.with(FieldInput::ConfirmChange(Some(guard)))
    }

    pub fn hide_selected(self, hide: bool) -> Self {
        self.with(FieldInput::HideSelected(Some(hide)))
    }

    pub fn input_type(self, input_type: TextInputType) -> Self {
        self.with(FieldInput::InputType(input_type))
    }

    pub fn autocomplete(self, autocomplete: OnOff) -> Self {
        self.with(FieldInput::Autocomplete(Some(autocomplete)))
    }

    pub fn maxlength(self, maxlength: impl ToString) -> Self {
        self.with(FieldInput::MaxLength(Some(maxlength.to_string())))
    }

    pub fn fixed_value(self, value: impl Into<String>) -> Self {
        self.with(FieldInput::FixedValue(Some(value.into())))
    }
}
