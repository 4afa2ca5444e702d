mod plain;
mod select;
mod text;

use serde_json::Value;

use crate::control::{ValidationErrors, Validator};
use crate::options::FieldInput;

pub use plain::PlainTextField;
pub use select::{SelectField, ValidationData};
pub(crate) use select::{SnapshotScope, VALIDITY_INPUTS, WATCHED_INPUTS};
pub use text::TextField;

/// What applying an input did to a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputEffect {
    /// The input is not meaningful for this kind.
    Ignored,
    Stored,
    /// Stored, and the kind's validators must be recomputed.
    Revalidate,
}

/// Per-kind strategy plugged into the field core.
pub(crate) trait FieldBehavior {
    fn kind_name(&self) -> &'static str;

    /// Validators installed on the internal control.
    fn compute_validators(&self) -> Vec<Validator>;

    fn apply_input(&mut self, _input: &FieldInput) -> InputEffect {
        InputEffect::Ignored
    }

    /// Replacement for a value pushed from outside, if the kind rejects it.
    fn transform_incoming_value(&self, _value: &Value) -> Option<Value> {
        None
    }

    /// Validation contributed to the bound outer control.
    fn validate(&self, _value: &Value) -> Option<ValidationErrors> {
        None
    }

    /// Removes errors that must never reach the display.
    fn filter_actual_errors(&self, _errors: &mut ValidationErrors) {}
}

#[derive(Debug)]
pub enum FieldKind {
    Text(TextField),
    Select(SelectField),
    PlainText(PlainTextField),
}

impl FieldKind {
    pub fn text() -> Self {
        Self::Text(TextField::default())
    }

    pub fn select() -> Self {
        Self::Select(SelectField::default())
    }

    pub fn plain_text() -> Self {
        Self::PlainText(PlainTextField::default())
    }

    pub fn as_select(&self) -> Option<&SelectField> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }

    pub(crate) fn as_select_mut(&mut self) -> Option<&mut SelectField> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextField> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn as_text_mut(&mut self) -> Option<&mut TextField> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_plain_text(&self) -> Option<&PlainTextField> {
        match self {
            Self::PlainText(plain) => Some(plain),
            _ => None,
        }
    }

    fn behavior(&self) -> &dyn FieldBehavior {
        match self {
            Self::Text(text) => text,
            Self::Select(select) => select,
            Self::PlainText(plain) => plain,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn FieldBehavior {
        match self {
            Self::Text(text) => text,
            Self::Select(select) => select,
            Self::PlainText(plain) => plain,
        }
    }
}

impl FieldBehavior for FieldKind {
    fn kind_name(&self) -> &'static str {
        self.behavior().kind_name()
    }

    fn compute_validators(&self) -> Vec<Validator> {
        self.behavior().compute_validators()
    }

    fn apply_input(&mut self, input: &FieldInput) -> InputEffect {
        self.behavior_mut().apply_input(input)
    }

    fn transform_incoming_value(&self, value: &Value) -> Option<Value> {
        self.behavior().transform_incoming_value(value)
    }

    fn validate(&self, value: &Value) -> Option<ValidationErrors> {
        self.behavior().validate(value)
    }

    fn filter_actual_errors(&self, errors: &mut ValidationErrors) {
        self.behavior().filter_actual_errors(errors)
    }
}
