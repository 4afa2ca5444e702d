use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::{FieldBehavior, InputEffect};
use crate::control::validators::{FIELD_EXISTS, LOADING, error};
use crate::control::{ValidationErrors, Validator};
use crate::options::{ChangeGuard, FieldInput, InputKey};
use crate::utils::{ElementMatcher, find_element, intersection, resolve_nested};

/// Inputs whose change is reacted to by the select kind.
pub(crate) const WATCHED_INPUTS: [InputKey; 7] = [
    InputKey::Loading,
    InputKey::Items,
    InputKey::BindValue,
    InputKey::CompareWith,
    InputKey::AllowInvalid,
    InputKey::Multiple,
    InputKey::AutoDefaultValue,
];

/// Inputs whose effective change invalidates the current selection.
pub(crate) const VALIDITY_INPUTS: [InputKey; 5] = [
    InputKey::Loading,
    InputKey::Items,
    InputKey::BindValue,
    InputKey::CompareWith,
    InputKey::Multiple,
];

/// Everything membership validation reads.
///
/// Deferred updates validate against a snapshot of this taken when the
/// update was scheduled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationData {
    pub items: Option<Vec<Value>>,
    pub bind_value: Option<String>,
    pub compare_with: Option<ElementMatcher>,
    pub multiple: bool,
    pub loading: Option<bool>,
    /// Loading was switched on because the items were not there yet.
    pub forced_loading: bool,
}

impl ValidationData {
    pub fn is_loading(&self) -> bool {
        self.loading == Some(true)
    }

    /// The value seen as a list of selections, `None` for no selection.
    pub fn selections(&self, value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::Null => None,
            Value::Array(values) if self.multiple => Some(values.clone()),
            other => Some(vec![other.clone()]),
        }
    }

    /// Projection of an item onto the value space.
    pub fn bound_value<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        resolve_nested(item, self.bind_value.as_deref())
    }

    /// Members of `values` that are present among the items, in item order.
    ///
    /// With a matcher the matching items themselves are returned.
    pub fn intersect_with_items(&self, values: &[Value]) -> Vec<Value> {
        let Some(items) = &self.items else {
            return Vec::new();
        };
        match &self.compare_with {
            Some(matcher) => intersection(items, values, Some(matcher)),
            None => {
                let bound: Vec<Value> = items
                    .iter()
                    .map(|item| self.bound_value(item).cloned().unwrap_or(Value::Null))
                    .collect();
                intersection(&bound, values, None)
            }
        }
    }

    fn membership_errors(&self, value: &Value) -> Option<ValidationErrors> {
        if self.is_loading() {
            return Some(error(LOADING));
        }
        let selections = self.selections(value)?;
        if selections.is_empty() {
            return None;
        }
        let found = self.intersect_with_items(&selections);
        (found.len() != selections.len()).then(|| error(FIELD_EXISTS))
    }
}

/// Selection among a list of items.
pub struct SelectField {
    data: Rc<RefCell<ValidationData>>,
    pub(crate) bind_label: Option<String>,
    pub(crate) allow_invalid: Option<bool>,
    pub(crate) auto_default_value: bool,
    pub(crate) clearable: Option<bool>,
    pub(crate) hide_selected: Option<bool>,
    pub(crate) confirm_change: Option<ChangeGuard>,
    pub(crate) initializing: bool,
}

impl Default for SelectField {
    fn default() -> Self {
        Self {
            data: Rc::new(RefCell::new(ValidationData::default())),
            bind_label: None,
            allow_invalid: None,
            auto_default_value: true,
            clearable: None,
            hide_selected: None,
            confirm_change: None,
            initializing: true,
        }
    }
}

impl fmt::Debug for SelectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectField")
            .field("data", &self.data.borrow())
            .field("bind_label", &self.bind_label)
            .field("allow_invalid", &self.allow_invalid)
            .field("auto_default_value", &self.auto_default_value)
            .field("initializing", &self.initializing)
            .finish_non_exhaustive()
    }
}

impl SelectField {
    pub fn validation_data(&self) -> ValidationData {
        self.data.borrow().clone()
    }

    pub(crate) fn shared_data(&self) -> Rc<RefCell<ValidationData>> {
        Rc::clone(&self.data)
    }

    pub fn loading(&self) -> bool {
        self.data.borrow().is_loading()
    }

    pub fn multiple(&self) -> bool {
        self.data.borrow().multiple
    }

    pub fn clearable(&self) -> Option<bool> {
        self.clearable
    }

    pub fn hide_selected(&self) -> Option<bool> {
        self.hide_selected
    }

    pub fn allow_invalid(&self) -> Option<bool> {
        self.allow_invalid
    }

    pub fn bind_label(&self) -> Option<&str> {
        self.bind_label.as_deref()
    }

    /// Only values present among the items may be selected.
    pub fn only_valid(&self) -> bool {
        !self.allow_invalid.unwrap_or(false)
    }

    pub(crate) fn allows_change(&self, value: &Value) -> bool {
        self.confirm_change
            .as_ref()
            .is_none_or(|guard| guard.allows(value))
    }

    /// Item labels for the current selection, resolved through `bindLabel`.
    pub fn selected_labels(&self, value: &Value) -> Vec<Value> {
        let data = self.data.borrow();
        let Some(selections) = data.selections(value) else {
            return Vec::new();
        };
        let items = data.items.as_deref().unwrap_or_default();
        selections
            .iter()
            .filter_map(|selection| {
                let item = match &data.compare_with {
                    Some(matcher) => items.iter().find(|item| matcher.matches(selection, item)),
                    None => find_element(items, selection, data.bind_value.as_deref(), None),
                }?;
                resolve_nested(item, self.bind_label.as_deref()).cloned()
            })
            .collect()
    }

    /// The value the selection should hold given the current items.
    ///
    /// Invalid selections are pruned when only valid values are allowed. An
    /// empty selection, or a single-item list with auto-default enabled,
    /// falls back to the first item.
    pub fn figure_new_value(&self, candidate: &Value) -> Value {
        let data = self.data.borrow();
        let only_valid = self.only_valid();
        let selections = data.selections(candidate);
        let kept = if only_valid {
            selections
                .as_ref()
                .map(|values| data.intersect_with_items(values))
        } else {
            selections.clone()
        };
        let empty_intersect = kept.as_ref().is_none_or(Vec::is_empty);
        let single_item = data.items.as_ref().is_some_and(|items| items.len() == 1);

        if (empty_intersect && selections.is_some()) || (self.auto_default_value && single_item) {
            let first_item = data.items.as_ref().and_then(|items| items.first());
            let first_value = first_item.and_then(|item| data.bound_value(item));
            let (Some(first_item), Some(first_value)) = (first_item, first_value) else {
                return if only_valid {
                    Value::Null
                } else {
                    candidate.clone()
                };
            };
            if first_value.is_null() {
                return candidate.clone();
            }
            let current = selections.unwrap_or_default();
            let already_selected = match &data.compare_with {
                Some(matcher) => current.iter().any(|value| matcher.matches(value, first_item)),
                None => current.contains(first_value),
            };
            if already_selected {
                return candidate.clone();
            }
            if data.multiple {
                let mut values = if empty_intersect {
                    Vec::new()
                } else {
                    kept.unwrap_or_default()
                };
                values.push(first_value.clone());
                return Value::Array(values);
            }
            return first_value.clone();
        }

        if let (Some(selections), Some(kept)) = (&selections, kept)
            && kept.len() != selections.len()
        {
            return Value::Array(kept);
        }
        candidate.clone()
    }
}

impl FieldBehavior for SelectField {
    fn kind_name(&self) -> &'static str {
        "select"
    }

    fn compute_validators(&self) -> Vec<Validator> {
        let data = Rc::clone(&self.data);
        vec![Validator::new(move |value| {
            data.borrow().membership_errors(value)
        })]
    }

    fn apply_input(&mut self, input: &FieldInput) -> InputEffect {
        let mut data = self.data.borrow_mut();
        match input {
            FieldInput::Items(items) => data.items = items.clone(),
            FieldInput::BindValue(path) => data.bind_value = path.clone(),
            FieldInput::CompareWith(matcher) => data.compare_with = matcher.clone(),
            FieldInput::Multiple(multiple) => data.multiple = *multiple,
            FieldInput::Loading(loading) => {
                data.loading = *loading;
                data.forced_loading = false;
            }
            FieldInput::BindLabel(path) => self.bind_label = path.clone(),
            FieldInput::AllowInvalid(allow) => self.allow_invalid = *allow,
            FieldInput::AutoDefaultValue(enabled) => self.auto_default_value = *enabled,
            FieldInput::Clearable(clearable) => self.clearable = *clearable,
            FieldInput::HideSelected(hide) => self.hide_selected = *hide,
            FieldInput::ConfirmChange(guard) => self.confirm_change = guard.clone(),
            _ => return InputEffect::Ignored,
        }
        InputEffect::Stored
    }

    fn transform_incoming_value(&self, value: &Value) -> Option<Value> {
        if self.loading() {
            return None;
        }
        let figured = self.figure_new_value(value);
        (figured != *value).then_some(figured)
    }

    fn validate(&self, value: &Value) -> Option<ValidationErrors> {
        self.data.borrow().membership_errors(value)
    }

    fn filter_actual_errors(&self, errors: &mut ValidationErrors) {
        errors.shift_remove(LOADING);
    }
}

/// Swaps a snapshot into shared validation data and puts the live data back
/// when dropped, even if the update in between unwinds.
pub(crate) struct SnapshotScope {
    data: Rc<RefCell<ValidationData>>,
    live: Option<ValidationData>,
}

impl SnapshotScope {
    pub(crate) fn enter(data: Rc<RefCell<ValidationData>>, snapshot: ValidationData) -> Self {
        let live = data.replace(snapshot);
        Self {
            data,
            live: Some(live),
        }
    }
}

impl Drop for SnapshotScope {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            self.data.replace(live);
        }
    }
}
