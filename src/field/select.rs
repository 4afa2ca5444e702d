use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use super::LabeledField;
use super::kinds::{
    FieldKind, SelectField, SnapshotScope, VALIDITY_INPUTS, ValidationData, WATCHED_INPUTS,
};
use crate::control::SetValueOptions;
use crate::options::InputChanges;

impl LabeledField {
    pub(super) fn on_select_changes(&self, changes: &InputChanges) {
        if !changes.contains_any(&WATCHED_INPUTS) {
            return;
        }
        let Some((data, initializing)) = self
            .state()
            .kind
            .as_select()
            .map(|select| (select.shared_data(), select.initializing))
        else {
            return;
        };

        let force = initializing && self.needs_forced_loading();
        let mut validity_changed = changes.any_effective(&VALIDITY_INPUTS);
        {
            let mut data = data.borrow_mut();
            if force {
                debug!("items not available yet, forcing loading state");
                data.forced_loading = true;
                data.loading = Some(true);
                validity_changed = true;
            } else if data.forced_loading {
                debug!("items available, releasing forced loading state");
                data.forced_loading = false;
                data.loading = Some(false);
                validity_changed = true;
            }
        }

        if initializing || !validity_changed {
            return;
        }
        let current = self.value();
        let candidate = match self.state().kind.as_select() {
            Some(select) if !select.loading() => select.figure_new_value(&current),
            _ => current.clone(),
        };
        let new_value = (candidate != current).then_some(candidate);
        self.schedule_select_update(new_value);
    }

    // Loading was never given by the caller (or was forced earlier) and the
    // items cannot be validated against yet.
    fn needs_forced_loading(&self) -> bool {
        let Some((loading_unset, items_missing, items_empty)) =
            self.state().kind.as_select().map(|select| {
                let data = select.validation_data();
                (
                    data.loading.is_none() || data.forced_loading,
                    data.items.is_none(),
                    data.items.as_ref().is_some_and(Vec::is_empty),
                )
            })
        else {
            return false;
        };
        loading_unset && (items_missing || (items_empty && self.is_required()))
    }

    /// Applies a selection update on the next turn of the task queue, against
    /// the validation data as it is now.
    fn schedule_select_update(&self, new_value: Option<Value>) {
        let Some(snapshot) = self
            .state()
            .kind
            .as_select()
            .map(SelectField::validation_data)
        else {
            return;
        };
        let queue = self.state().context.queue.clone();
        let weak = self.downgrade();
        debug!(new_value = ?new_value, "select update scheduled");
        queue.schedule(Box::new(move || {
            let Some(field) = LabeledField::upgrade(&weak) else {
                debug!("select update dropped: field released");
                return;
            };
            if field.is_destroyed() {
                debug!("select update dropped: no control attached");
                return;
            }
            field.apply_select_update(snapshot, new_value);
        }));
    }

    fn apply_select_update(&self, snapshot: ValidationData, new_value: Option<Value>) {
        let Some(data) = self.state().kind.as_select().map(SelectField::shared_data) else {
            return;
        };
        let _scope = SnapshotScope::enter(data, snapshot);
        let outer = self.outer_control();
        match (new_value, outer) {
            (Some(value), Some(outer)) => outer.set_value(value, SetValueOptions::default()),
            (Some(value), None) => self.write_value(value),
            (None, Some(outer)) => {
                self.internal_control().update_validity(false);
                outer.update_validity(true);
            }
            (None, None) => {
                self.internal_control().update_validity(false);
                self.refresh_error_display();
            }
        }
    }

    /// Item labels for the current selection. Empty for other kinds.
    pub fn selected_labels(&self) -> Vec<Value> {
        let value = self.value();
        self.state()
            .kind
            .as_select()
            .map(|select| select.selected_labels(&value))
            .unwrap_or_default()
    }

    /// Resets the selection as a user change. Returns whether it happened.
    pub fn clear(&self) -> bool {
        let clearable = match &self.state().kind {
            FieldKind::Select(select) => select.clearable() != Some(false),
            _ => false,
        };
        if !clearable || !self.input(Value::Null) {
            return false;
        }
        let listeners = self.state().clear_listeners.clone();
        for listener in listeners {
            listener();
        }
        true
    }

    pub fn register_clear_listener(&self, listener: impl Fn() + 'static) {
        self.state_mut().clear_listeners.push(Rc::new(listener));
    }
}
