use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::utils::object::is_empty;

/// Error-key to error-detail mapping produced by validators.
///
/// A key mapped to `true` carries no further detail.
pub type ValidationErrors = IndexMap<String, Value>;

pub const REQUIRED: &str = "required";
pub const EMPTY: &str = "empty";
pub const FIELD_BINDING: &str = "field_binding";
pub const FIELD_EXISTS: &str = "field_exists";
pub const LOADING: &str = "loading";
pub const FIELD_SHORT: &str = "field_short";
pub const FIELD_FORBID: &str = "field_forbid";

/// Builds a single-key error map flagged with `true`.
pub fn error(key: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.insert(key.to_string(), Value::Bool(true));
    errors
}

/// Declared metadata of a validator, inspectable without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    Required,
    NotEmpty,
    Custom,
}

type CheckFn = dyn Fn(&Value) -> Option<ValidationErrors>;

#[derive(Clone)]
pub struct Validator {
    kind: ValidatorKind,
    check: Rc<CheckFn>,
}

impl Validator {
    /// Opaque validator. Its constraints can only be discovered by probing.
    pub fn new(check: impl Fn(&Value) -> Option<ValidationErrors> + 'static) -> Self {
        Self {
            kind: ValidatorKind::Custom,
            check: Rc::new(check),
        }
    }

    /// Reports `required` for `null`, `""` and `[]`.
    pub fn required() -> Self {
        Self {
            kind: ValidatorKind::Required,
            check: Rc::new(|value| {
                let missing = match value {
                    Value::Null => true,
                    Value::String(text) => text.is_empty(),
                    Value::Array(items) => items.is_empty(),
                    _ => false,
                };
                missing.then(|| error(REQUIRED))
            }),
        }
    }

    /// Reports `empty` for a present but structurally empty value.
    pub fn not_empty() -> Self {
        Self {
            kind: ValidatorKind::NotEmpty,
            check: Rc::new(|value| (!value.is_null() && is_empty(value)).then(|| error(EMPTY))),
        }
    }

    pub fn kind(&self) -> ValidatorKind {
        self.kind
    }

    pub fn validate(&self, value: &Value) -> Option<ValidationErrors> {
        (self.check)(value)
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && Rc::ptr_eq(&self.check, &other.check)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("kind", &self.kind).finish()
    }
}

/// Runs every validator in order and merges their error maps.
///
/// Later validators overwrite keys reported by earlier ones. Returns `None`
/// when no validator reports anything.
pub fn compose<'a>(
    validators: impl IntoIterator<Item = &'a Validator>,
    value: &Value,
) -> Option<ValidationErrors> {
    let mut merged: Option<ValidationErrors> = None;
    for validator in validators {
        if let Some(errors) = validator.validate(value) {
            merged.get_or_insert_with(ValidationErrors::new).extend(errors);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn required_rejects_missing_values() {
        let required = Validator::required();
        assert_eq!(required.validate(&Value::Null), Some(error(REQUIRED)));
        assert_eq!(required.validate(&json!("")), Some(error(REQUIRED)));
        assert_eq!(required.validate(&json!([])), Some(error(REQUIRED)));
        assert_eq!(required.validate(&json!(0)), None);
        assert_eq!(required.validate(&json!({})), None);
    }

    #[test]
    fn not_empty_ignores_null() {
        let not_empty = Validator::not_empty();
        assert_eq!(not_empty.validate(&Value::Null), None);
        assert_eq!(not_empty.validate(&json!({})), Some(error(EMPTY)));
        assert_eq!(not_empty.validate(&json!({"a": 1})), None);
    }

    #[test]
    fn compose_merges_in_order() {
        let first = Validator::new(|_| Some(error("a")));
        let second = Validator::new(|_| {
            let mut errors = error("b");
            errors.insert("a".into(), json!({"detail": 2}));
            Some(errors)
        });
        let merged = compose([&first, &second], &Value::Null).unwrap();
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(merged["a"], json!({"detail": 2}));
    }

    #[test]
    fn compose_of_nothing_is_valid() {
        let none: [&Validator; 0] = [];
        assert_eq!(compose(none, &json!(1)), None);
        let passing = Validator::new(|_| None);
        assert_eq!(compose([&passing], &json!(1)), None);
    }
}
