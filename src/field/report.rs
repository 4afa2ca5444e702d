use serde::Serialize;
use serde_json::Value;

use super::{FieldKind, LabeledField};
use crate::control::{ControlStatus, ValidationErrors};

/// Snapshot of a field's observable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub kind: &'static str,
    pub id: Option<String>,
    pub label: Option<String>,
    pub value: Value,
    /// Selected item labels or the plain-text display value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,
    pub errors: Option<ValidationErrors>,
    pub messages: Vec<String>,
    pub status: ControlStatus,
    pub dirty: bool,
    pub touched: bool,
    pub required: bool,
}

impl LabeledField {
    pub fn report(&self) -> FieldReport {
        let control = self
            .outer_control()
            .unwrap_or_else(|| self.internal_control());
        let value = self.value();
        let display = self.with_kind(|kind| match kind {
            FieldKind::Select(select) => Some(Value::Array(select.selected_labels(&value))),
            FieldKind::PlainText(plain) => plain.display_value(&value),
            FieldKind::Text(_) => None,
        });
        FieldReport {
            kind: self.kind_name(),
            id: self.id(),
            label: self.label(),
            value,
            display,
            errors: self.actual_errors(),
            messages: self.error_messages(),
            status: control.status(),
            dirty: control.dirty(),
            touched: control.touched(),
            required: self.is_required(),
        }
    }
}
