use serde_json::Value;

use super::{FieldBehavior, InputEffect};
use crate::control::validators::{FIELD_BINDING, error};
use crate::control::{ValidationErrors, Validator};
use crate::options::FieldInput;
use crate::utils::resolve_nested;

/// Read-only display of a value, optionally projected through `bindLabel`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainTextField {
    pub(crate) fixed_value: Option<String>,
    pub(crate) bind_label: Option<String>,
}

impl PlainTextField {
    pub fn fixed_value(&self) -> Option<&str> {
        self.fixed_value.as_deref()
    }

    pub fn bind_label(&self) -> Option<&str> {
        self.bind_label.as_deref()
    }

    /// Text to show: the fixed value when set, otherwise `value`, each
    /// resolved through `bindLabel`.
    pub fn display_value(&self, value: &Value) -> Option<Value> {
        let source = match &self.fixed_value {
            Some(fixed) => Value::String(fixed.clone()),
            None => value.clone(),
        };
        resolve_nested(&source, self.bind_label.as_deref()).cloned()
    }
}

fn check_binding(value: &Value, bind_label: Option<&str>) -> Option<ValidationErrors> {
    if value.is_null() {
        return None;
    }
    let zero = value.as_f64() == Some(0.0);
    let unbound = bind_label.is_some_and(|path| resolve_nested(value, Some(path)).is_none());
    (zero || unbound).then(|| error(FIELD_BINDING))
}

impl FieldBehavior for PlainTextField {
    fn kind_name(&self) -> &'static str {
        "plain_text"
    }

    fn compute_validators(&self) -> Vec<Validator> {
        let bind_label = self.bind_label.clone();
        vec![Validator::new(move |value| {
            check_binding(value, bind_label.as_deref())
        })]
    }

    fn apply_input(&mut self, input: &FieldInput) -> InputEffect {
        match input {
            FieldInput::FixedValue(fixed) => {
                self.fixed_value = fixed.clone();
                InputEffect::Stored
            }
            FieldInput::BindLabel(path) => {
                self.bind_label = path.clone();
                InputEffect::Revalidate
            }
            _ => InputEffect::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_is_always_valid() {
        assert_eq!(check_binding(&Value::Null, Some("name")), None);
    }

    #[test]
    fn zero_and_missing_label_fail_binding() {
        assert_eq!(check_binding(&json!(0), None), Some(error(FIELD_BINDING)));
        assert_eq!(
            check_binding(&json!({"id": 1}), Some("name")),
            Some(error(FIELD_BINDING))
        );
        assert_eq!(check_binding(&json!({"name": "Bret"}), Some("name")), None);
        assert_eq!(check_binding(&json!("plain"), None), None);
    }

    #[test]
    fn display_prefers_fixed_value() {
        let mut plain = PlainTextField::default();
        assert_eq!(
            plain.display_value(&json!("shown")),
            Some(json!("shown"))
        );
        plain.apply_input(&FieldInput::BindLabel(Some("user.name".into())));
        assert_eq!(
            plain.display_value(&json!({"user": {"name": "Bret"}})),
            Some(json!("Bret"))
        );
        plain.apply_input(&FieldInput::FixedValue(Some("fixed".into())));
        assert_eq!(plain.display_value(&json!({"user": {"name": "Bret"}})), None);
    }

    #[test]
    fn bind_label_change_requires_new_validators() {
        let mut plain = PlainTextField::default();
        assert_eq!(
            plain.apply_input(&FieldInput::BindLabel(Some("name".into()))),
            InputEffect::Revalidate
        );
        let validators = plain.compute_validators();
        assert_eq!(
            validators[0].validate(&json!({"id": 1})),
            Some(error(FIELD_BINDING))
        );
    }
}
