//! Reactive value holder shared by fields and the forms that bind them.
//!
//! A [`FieldControl`] owns a value, an ordered validator list and the
//! validity/touch state derived from them. Every mutation that changes
//! validity can notify listeners synchronously. Listeners are always invoked
//! after the control's own state is released, so they may read or mutate the
//! control again.

mod listeners;
pub mod validators;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;

use listeners::{Listeners, notify};

pub use listeners::ListenerId;
pub use validators::{ValidationErrors, Validator, ValidatorKind, compose};

pub type ValidatorId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlStatus {
    Valid,
    Invalid,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValueOptions {
    /// Emit value and status changes to subscribers.
    pub emit_event: bool,
    /// Push the value to registered model-to-view callbacks (bound fields).
    pub emit_model_to_view: bool,
}

impl Default for SetValueOptions {
    fn default() -> Self {
        Self {
            emit_event: true,
            emit_model_to_view: true,
        }
    }
}

impl SetValueOptions {
    pub fn silent() -> Self {
        Self {
            emit_event: false,
            emit_model_to_view: false,
        }
    }

    pub fn view_to_model() -> Self {
        Self {
            emit_event: true,
            emit_model_to_view: false,
        }
    }
}

struct ControlState {
    value: Value,
    validators: Vec<(ValidatorId, Validator)>,
    errors: Option<ValidationErrors>,
    status: ControlStatus,
    disabled: bool,
    pristine: bool,
    touched: bool,
    next_id: u64,
    value_changes: Listeners<Value>,
    status_changes: Listeners<ControlStatus>,
    model_changes: Listeners<Value>,
    disabled_changes: Listeners<bool>,
}

impl ControlState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone)]
pub struct FieldControl {
    state: Rc<RefCell<ControlState>>,
}

/// Non-owning handle to a [`FieldControl`].
#[derive(Clone)]
pub struct WeakControl {
    state: Weak<RefCell<ControlState>>,
}

impl WeakControl {
    pub fn upgrade(&self) -> Option<FieldControl> {
        self.state.upgrade().map(|state| FieldControl { state })
    }
}

impl fmt::Debug for WeakControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakControl")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Value,
    Status,
}

/// Handle returned by the `subscribe_*` methods.
#[derive(Debug)]
pub struct Subscription {
    control: WeakControl,
    channel: Channel,
    id: ListenerId,
}

impl Subscription {
    /// Detaches the listener. Returns `false` when it was already gone or the
    /// control has been dropped.
    pub fn unsubscribe(self) -> bool {
        let Some(control) = self.control.upgrade() else {
            return false;
        };
        let mut state = control.state.borrow_mut();
        match self.channel {
            Channel::Value => state.value_changes.remove(self.id),
            Channel::Status => state.status_changes.remove(self.id),
        }
    }
}

impl FieldControl {
    pub fn new(value: Value, validators: Vec<Validator>) -> Self {
        let mut state = ControlState {
            value,
            validators: Vec::new(),
            errors: None,
            status: ControlStatus::Valid,
            disabled: false,
            pristine: true,
            touched: false,
            next_id: 0,
            value_changes: Listeners::new(),
            status_changes: Listeners::new(),
            model_changes: Listeners::new(),
            disabled_changes: Listeners::new(),
        };
        for validator in validators {
            let id = state.next_id();
            state.validators.push((id, validator));
        }
        let control = Self {
            state: Rc::new(RefCell::new(state)),
        };
        control.recompute();
        control
    }

    pub fn downgrade(&self) -> WeakControl {
        WeakControl {
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn ptr_eq(&self, other: &FieldControl) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn value(&self) -> Value {
        self.state.borrow().value.clone()
    }

    pub fn errors(&self) -> Option<ValidationErrors> {
        self.state.borrow().errors.clone()
    }

    pub fn has_error(&self, key: &str) -> bool {
        self.state
            .borrow()
            .errors
            .as_ref()
            .is_some_and(|errors| errors.contains_key(key))
    }

    pub fn status(&self) -> ControlStatus {
        self.state.borrow().status
    }

    pub fn valid(&self) -> bool {
        self.status() == ControlStatus::Valid
    }

    pub fn invalid(&self) -> bool {
        self.status() == ControlStatus::Invalid
    }

    pub fn disabled(&self) -> bool {
        self.state.borrow().disabled
    }

    pub fn pristine(&self) -> bool {
        self.state.borrow().pristine
    }

    pub fn dirty(&self) -> bool {
        !self.pristine()
    }

    pub fn touched(&self) -> bool {
        self.state.borrow().touched
    }

    /// Stores `value`, pushes it to model-to-view callbacks when asked, then
    /// re-runs validation.
    pub fn set_value(&self, value: Value, options: SetValueOptions) {
        let model_listeners = {
            let mut state = self.state.borrow_mut();
            state.value = value.clone();
            if options.emit_model_to_view {
                state.model_changes.snapshot()
            } else {
                Vec::new()
            }
        };
        notify(model_listeners, &value);
        self.update_value_and_validity(options.emit_event);
    }

    /// Re-runs validators against the current value.
    pub fn update_value_and_validity(&self, emit_event: bool) {
        let status = self.recompute();
        if emit_event {
            self.emit(status);
        }
    }

    /// Re-runs validators and reports the status only; value subscribers are
    /// not told about a value that did not change.
    pub fn update_validity(&self, emit_event: bool) {
        let status = self.recompute();
        if emit_event {
            let listeners = self.state.borrow().status_changes.snapshot();
            notify(listeners, &status);
        }
    }

    /// Overrides the computed errors until the next validation run.
    pub fn set_errors(&self, errors: Option<ValidationErrors>, emit_event: bool) {
        let (status, listeners) = {
            let mut state = self.state.borrow_mut();
            if !state.disabled {
                state.status = if errors.is_some() {
                    ControlStatus::Invalid
                } else {
                    ControlStatus::Valid
                };
            }
            state.errors = errors;
            (state.status, state.status_changes.snapshot())
        };
        if emit_event {
            notify(listeners, &status);
        }
    }

    /// Replaces the validator list. Validity is not recomputed until the next
    /// value or validity update.
    pub fn set_validators(&self, validators: Vec<Validator>) {
        let mut state = self.state.borrow_mut();
        state.validators.clear();
        for validator in validators {
            let id = state.next_id();
            state.validators.push((id, validator));
        }
    }

    pub fn add_validator(&self, validator: Validator) -> ValidatorId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.validators.push((id, validator));
        id
    }

    pub fn remove_validator(&self, id: ValidatorId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.validators.len();
        state.validators.retain(|(entry, _)| *entry != id);
        before != state.validators.len()
    }

    pub fn validator_kinds(&self) -> Vec<ValidatorKind> {
        self.state
            .borrow()
            .validators
            .iter()
            .map(|(_, validator)| validator.kind())
            .collect()
    }

    /// Evaluates the composed validator against a hypothetical value.
    ///
    /// Nothing is stored and nobody is notified.
    pub fn probe(&self, value: &Value) -> Option<ValidationErrors> {
        let validators = self.validators();
        compose(&validators, value)
    }

    pub fn mark_as_dirty(&self) {
        self.state.borrow_mut().pristine = false;
    }

    pub fn mark_as_pristine(&self) {
        self.state.borrow_mut().pristine = true;
    }

    pub fn mark_as_touched(&self) {
        self.state.borrow_mut().touched = true;
    }

    pub fn mark_as_untouched(&self) {
        self.state.borrow_mut().touched = false;
    }

    pub fn disable(&self, emit_event: bool) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.disabled = true;
            state.status = ControlStatus::Disabled;
            state.errors = None;
            state.disabled_changes.snapshot()
        };
        if emit_event {
            self.emit(ControlStatus::Disabled);
        }
        notify(listeners, &true);
    }

    pub fn enable(&self, emit_event: bool) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.disabled = false;
            state.disabled_changes.snapshot()
        };
        self.update_value_and_validity(emit_event);
        notify(listeners, &false);
    }

    pub fn subscribe_value_changes(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.value_changes.add(id, Rc::new(listener));
        Subscription {
            control: self.downgrade(),
            channel: Channel::Value,
            id,
        }
    }

    pub fn subscribe_status_changes(
        &self,
        listener: impl Fn(&ControlStatus) + 'static,
    ) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.status_changes.add(id, Rc::new(listener));
        Subscription {
            control: self.downgrade(),
            channel: Channel::Status,
            id,
        }
    }

    /// Registers a model-to-view callback, invoked by `set_value` when
    /// `emit_model_to_view` is set.
    pub fn register_on_change(&self, listener: impl Fn(&Value) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.model_changes.add(id, Rc::new(listener));
        id
    }

    pub fn remove_on_change(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().model_changes.remove(id)
    }

    pub fn register_on_disabled_change(&self, listener: impl Fn(&bool) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.disabled_changes.add(id, Rc::new(listener));
        id
    }

    pub fn remove_on_disabled_change(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().disabled_changes.remove(id)
    }

    /// Drops every model-to-view and disabled-state callback.
    pub fn clear_change_fns(&self) {
        let mut state = self.state.borrow_mut();
        state.model_changes.clear();
        state.disabled_changes.clear();
    }

    /// Number of callbacks and subscriptions currently held by the control.
    pub fn listener_count(&self) -> usize {
        let state = self.state.borrow();
        state.value_changes.len()
            + state.status_changes.len()
            + state.model_changes.len()
            + state.disabled_changes.len()
    }

    pub fn validator_count(&self) -> usize {
        self.state.borrow().validators.len()
    }

    fn validators(&self) -> Vec<Validator> {
        self.state
            .borrow()
            .validators
            .iter()
            .map(|(_, validator)| validator.clone())
            .collect()
    }

    // Validators run without the state borrowed: they may read other fields
    // that are themselves in the middle of talking to this control.
    fn recompute(&self) -> ControlStatus {
        let (disabled, value) = {
            let state = self.state.borrow();
            (state.disabled, state.value.clone())
        };
        let errors = if disabled {
            None
        } else {
            compose(&self.validators(), &value)
        };
        let mut state = self.state.borrow_mut();
        state.status = if disabled {
            ControlStatus::Disabled
        } else if errors.is_some() {
            ControlStatus::Invalid
        } else {
            ControlStatus::Valid
        };
        state.errors = errors;
        state.status
    }

    fn emit(&self, status: ControlStatus) {
        let (value, value_listeners, status_listeners) = {
            let state = self.state.borrow();
            (
                state.value.clone(),
                state.value_changes.snapshot(),
                state.status_changes.snapshot(),
            )
        };
        notify(value_listeners, &value);
        notify(status_listeners, &status);
    }
}

impl Default for FieldControl {
    fn default() -> Self {
        Self::new(Value::Null, Vec::new())
    }
}

impl fmt::Debug for FieldControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FieldControl")
            .field("value", &state.value)
            .field("status", &state.status)
            .field("errors", &state.errors)
            .field("pristine", &state.pristine)
            .field("touched", &state.touched)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::validators::{REQUIRED, error};
    use super::*;

    #[test]
    fn construction_validates_without_emitting() {
        let control = FieldControl::new(Value::Null, vec![Validator::required()]);
        assert_eq!(control.status(), ControlStatus::Invalid);
        assert_eq!(control.errors(), Some(error(REQUIRED)));
        assert!(control.pristine());
    }

    #[test]
    fn set_value_emits_value_then_status_synchronously() {
        let control = FieldControl::new(Value::Null, vec![Validator::required()]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let values = Rc::clone(&log);
        let _v = control.subscribe_value_changes(move |value| {
            values.borrow_mut().push(format!("value:{value}"))
        });
        let statuses = Rc::clone(&log);
        let _s = control.subscribe_status_changes(move |status| {
            statuses.borrow_mut().push(format!("status:{status:?}"))
        });

        control.set_value(json!("x"), SetValueOptions::default());
        assert_eq!(*log.borrow(), vec!["value:\"x\"", "status:Valid"]);
    }

    #[test]
    fn silent_set_value_notifies_nobody() {
        let control = FieldControl::default();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let _v = control.subscribe_value_changes(move |_| *counter.borrow_mut() += 1);
        let model = Rc::clone(&hits);
        control.register_on_change(move |_| *model.borrow_mut() += 1);

        control.set_value(json!(1), SetValueOptions::silent());
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(control.value(), json!(1));
    }

    #[test]
    fn listeners_may_reenter_the_control() {
        let control = FieldControl::new(json!(1), Vec::new());
        let inner = control.clone();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let _s = control.subscribe_status_changes(move |_| {
            *sink.borrow_mut() = Some(inner.value());
            inner.mark_as_dirty();
        });
        control.set_value(json!(2), SetValueOptions::default());
        assert_eq!(*seen.borrow(), Some(json!(2)));
        assert!(control.dirty());
    }

    #[test]
    fn disabling_clears_errors_and_reenabling_revalidates() {
        let control = FieldControl::new(Value::Null, vec![Validator::required()]);
        control.disable(false);
        assert_eq!(control.status(), ControlStatus::Disabled);
        assert_eq!(control.errors(), None);
        control.set_value(Value::Null, SetValueOptions::default());
        assert_eq!(control.errors(), None);
        control.enable(false);
        assert_eq!(control.errors(), Some(error(REQUIRED)));
    }

    #[test]
    fn disabled_change_callbacks_fire_regardless_of_emit() {
        let control = FieldControl::default();
        let flags = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&flags);
        control.register_on_disabled_change(move |flag| sink.borrow_mut().push(*flag));
        control.disable(false);
        control.enable(false);
        assert_eq!(*flags.borrow(), vec![true, false]);
    }

    #[test]
    fn unsubscribe_detaches_listener() {
        let control = FieldControl::default();
        let subscription = control.subscribe_status_changes(|_| {});
        assert_eq!(control.listener_count(), 1);
        assert!(subscription.unsubscribe());
        assert_eq!(control.listener_count(), 0);
    }

    #[test]
    fn probe_leaves_state_untouched() {
        let control = FieldControl::new(json!("kept"), vec![Validator::required()]);
        assert_eq!(control.probe(&Value::Null), Some(error(REQUIRED)));
        assert_eq!(control.value(), json!("kept"));
        assert_eq!(control.errors(), None);
    }

    #[test]
    fn validators_can_be_added_and_removed() {
        let control = FieldControl::new(Value::Null, Vec::new());
        let id = control.add_validator(Validator::required());
        assert_eq!(control.validator_kinds(), vec![ValidatorKind::Required]);
        control.update_value_and_validity(false);
        assert!(control.invalid());
        assert!(control.remove_validator(id));
        control.update_value_and_validity(false);
        assert!(control.valid());
    }

    #[test]
    fn set_errors_overrides_status() {
        let control = FieldControl::default();
        control.set_errors(Some(error("custom")), false);
        assert!(control.invalid());
        assert!(control.has_error("custom"));
        control.set_errors(None, false);
        assert!(control.valid());
    }
}
