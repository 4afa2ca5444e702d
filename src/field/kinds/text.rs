use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{FieldBehavior, InputEffect};
use crate::control::validators::{FIELD_FORBID, FIELD_SHORT, error};
use crate::control::{ValidationErrors, Validator};
use crate::options::{FieldInput, OnOff, TextInputType};

const FORBIDDEN_VALUE: &str = "o";
const SHORT_LIMIT: f64 = 2.0;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?\s*$").expect("numeric pattern")
});

/// Free text input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextField {
    pub(crate) input_type: TextInputType,
    pub(crate) autocomplete: Option<OnOff>,
    pub(crate) maxlength: Option<String>,
}

impl TextField {
    pub fn input_type(&self) -> TextInputType {
        self.input_type
    }

    pub fn autocomplete(&self) -> Option<OnOff> {
        self.autocomplete
    }

    pub fn maxlength(&self) -> Option<&str> {
        self.maxlength.as_deref()
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) if NUMERIC.is_match(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Rejects the literal `"o"` and numeric-like values not above two.
fn check_text(value: &Value) -> Option<ValidationErrors> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) if text == FORBIDDEN_VALUE => Some(error(FIELD_FORBID)),
        other => numeric_value(other)
            .filter(|number| *number <= SHORT_LIMIT)
            .map(|_| error(FIELD_SHORT)),
    }
}

impl FieldBehavior for TextField {
    fn kind_name(&self) -> &'static str {
        "text"
    }

    fn compute_validators(&self) -> Vec<Validator> {
        vec![Validator::new(check_text)]
    }

    fn apply_input(&mut self, input: &FieldInput) -> InputEffect {
        match input {
            FieldInput::InputType(input_type) => self.input_type = *input_type,
            FieldInput::Autocomplete(autocomplete) => self.autocomplete = *autocomplete,
            FieldInput::MaxLength(maxlength) => self.maxlength = maxlength.clone(),
            _ => return InputEffect::Ignored,
        }
        InputEffect::Stored
    }
}
