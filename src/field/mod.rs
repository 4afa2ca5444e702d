//! Labeled fields: an internal control kept in step with an outer one.
//!
//! A [`LabeledField`] owns an internal [`FieldControl`] holding the value the
//! view edits. When attached to an outer control (the one a form owns), the
//! two are synchronised in both directions: the outer pushes model values
//! through [`LabeledField::write_value`], the field bridges internal changes
//! back without marking the outer dirty, and the field contributes its own
//! validation to the outer control.
//!
//! Error display is timed by the outer control's pristine state: a pristine
//! control never shows `required`, and any other error found on a pristine
//! control marks it dirty so the error becomes visible.

mod binding;
mod builder;
mod kinds;
mod report;
mod select;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::context::{FieldContext, RANDOM_ID_PREFIX};
use crate::control::validators::REQUIRED;
use crate::control::{
    FieldControl, SetValueOptions, Subscription, ValidationErrors, Validator, ValidatorKind,
};
use crate::messages::{MessageOverrides, MessageRegistry, build_error_messages, translate_messages};
use crate::options::{
    FieldClasses, FieldInput, FieldOptions, InputChanges, InputKey, OnOff, OptionsDiffer,
    SimpleChange,
};

use binding::OuterLink;
use kinds::{FieldBehavior, InputEffect};

pub use builder::FieldBuilder;
pub use kinds::{FieldKind, PlainTextField, SelectField, TextField, ValidationData};
pub use report::FieldReport;

/// Whether validation errors are currently shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisplay {
    /// The control is pristine; `required` is hidden.
    PristineSuppressed,
    DirtyVisible,
}

type Callback = Rc<dyn Fn()>;

struct FieldState {
    context: FieldContext,
    kind: FieldKind,
    internal: FieldControl,
    label: Option<String>,
    placeholder: String,
    readonly: bool,
    autofocus: Option<OnOff>,
    classes: FieldClasses,
    message_overrides: MessageOverrides,
    messages: MessageRegistry,
    error_messages: Vec<String>,
    validators: Vec<Validator>,
    required: Option<bool>,
    id: Option<String>,
    inputs: IndexMap<InputKey, FieldInput>,
    options: Option<FieldOptions>,
    differ: OptionsDiffer,
    link: Option<OuterLink>,
    touch_listeners: Vec<Callback>,
    clear_listeners: Vec<Callback>,
    skip_refresh: bool,
    initialized: bool,
    destroyed: bool,
}

/// Handle to a field. Clones share the same field.
#[derive(Clone)]
pub struct LabeledField {
    inner: Rc<RefCell<FieldState>>,
}

impl LabeledField {
    pub fn new(kind: FieldKind, context: FieldContext) -> Self {
        let internal = FieldControl::new(Value::Null, kind.compute_validators());
        let state = FieldState {
            context,
            kind,
            internal,
            label: None,
            placeholder: String::new(),
            readonly: false,
            autofocus: None,
            classes: FieldClasses::new(),
            message_overrides: MessageOverrides::default(),
            messages: MessageRegistry::new(),
            error_messages: Vec::new(),
            validators: Vec::new(),
            required: None,
            id: None,
            inputs: IndexMap::new(),
            options: None,
            differ: OptionsDiffer::new(),
            link: None,
            touch_listeners: Vec::new(),
            clear_listeners: Vec::new(),
            skip_refresh: false,
            initialized: false,
            destroyed: false,
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    fn state(&self) -> Ref<'_, FieldState> {
        self.inner.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, FieldState> {
        self.inner.borrow_mut()
    }

    fn downgrade(&self) -> Weak<RefCell<FieldState>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<FieldState>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn ptr_eq(&self, other: &LabeledField) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> Option<String> {
        self.state().id.clone()
    }

    pub fn label(&self) -> Option<String> {
        self.state().label.clone()
    }

    pub fn placeholder(&self) -> String {
        self.state().placeholder.clone()
    }

    pub fn readonly(&self) -> bool {
        self.state().readonly
    }

    pub fn autofocus(&self) -> Option<OnOff> {
        self.state().autofocus
    }

    pub fn classes(&self) -> FieldClasses {
        self.state().classes.clone()
    }

    /// Translated message registry used for error display.
    pub fn messages(&self) -> MessageRegistry {
        self.state().messages.clone()
    }

    /// Messages for the errors currently on display.
    pub fn error_messages(&self) -> Vec<String> {
        self.state().error_messages.clone()
    }

    pub fn internal_control(&self) -> FieldControl {
        self.state().internal.clone()
    }

    pub fn outer_control(&self) -> Option<FieldControl> {
        self.state().link.as_ref().and_then(OuterLink::control)
    }

    pub fn control_name(&self) -> Option<String> {
        self.state()
            .link
            .as_ref()
            .and_then(|link| link.name.clone())
    }

    pub fn value(&self) -> Value {
        self.internal_control().value()
    }

    pub fn kind_name(&self) -> &'static str {
        self.state().kind.kind_name()
    }

    /// Runs `f` against the kind-specific state.
    pub fn with_kind<R>(&self, f: impl FnOnce(&FieldKind) -> R) -> R {
        f(&self.state().kind)
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Current options bag, if one was set.
    pub fn options(&self) -> Option<FieldOptions> {
        self.state().options.clone()
    }

    /// Sets a single input and reacts to the change.
    pub fn set_input(&self, input: FieldInput) {
        self.apply_inputs([input]);
    }

    /// Sets several inputs, then reacts to all of them at once.
    pub fn apply_inputs(&self, inputs: impl IntoIterator<Item = FieldInput>) {
        if self.is_destroyed() {
            debug!("inputs ignored: field is destroyed");
            return;
        }
        let mut changes = InputChanges::new();
        let mut revalidate = false;
        for input in inputs {
            let (change, effect) = self.store_input(input, None);
            revalidate |= effect == InputEffect::Revalidate;
            changes.record(change);
        }
        if !changes.is_empty() {
            self.on_changes(&changes, revalidate);
        }
    }

    /// Replaces the options bag. The next [`do_check`](Self::do_check)
    /// applies only the entries that differ from the last checked bag, so a
    /// deep-equal replacement changes nothing.
    pub fn set_options(&self, options: FieldOptions) {
        self.state_mut().options = Some(options);
    }

    /// Diffs the options bag against the last check and applies what changed.
    pub fn do_check(&self) {
        if self.is_destroyed() {
            return;
        }
        let diff = {
            let mut guard = self.state_mut();
            let state = &mut *guard;
            match &state.options {
                Some(options) => state.differ.diff(options),
                None => return,
            }
        };
        if diff.is_empty() {
            return;
        }
        trace!(changed = diff.len(), "options bag changed");
        let mut changes = InputChanges::new();
        let mut revalidate = false;
        for change in diff {
            let (change, effect) = self.store_input(change.current, Some(change.previous));
            revalidate |= effect == InputEffect::Revalidate;
            changes.record(change);
        }
        self.on_changes(&changes, revalidate);
    }

    // Stores one input. Changes from the options differ carry their own
    // previous value and are never first changes.
    fn store_input(
        &self,
        input: FieldInput,
        previous: Option<Option<FieldInput>>,
    ) -> (SimpleChange, InputEffect) {
        let mut guard = self.state_mut();
        let state = &mut *guard;
        let effect = match &input {
            FieldInput::Label(label) => {
                state.label = label
                    .as_deref()
                    .map(|label| state.context.translate(label));
                InputEffect::Stored
            }
            FieldInput::Placeholder(placeholder) => {
                state.placeholder = state.context.translate(placeholder);
                InputEffect::Stored
            }
            FieldInput::Readonly(readonly) => {
                state.readonly = *readonly;
                InputEffect::Stored
            }
            FieldInput::Autofocus(autofocus) => {
                state.autofocus = *autofocus;
                InputEffect::Stored
            }
            FieldInput::Classes(classes) => {
                state.classes = classes.clone();
                InputEffect::Stored
            }
            FieldInput::Messages(overrides) => {
                state.message_overrides = overrides.clone();
                InputEffect::Stored
            }
            FieldInput::Validators(validators) => {
                state.validators = validators.clone();
                InputEffect::Revalidate
            }
            FieldInput::Id(id) => {
                state.id = id.clone();
                InputEffect::Stored
            }
            FieldInput::Required(required) => {
                state.required = *required;
                InputEffect::Revalidate
            }
            other => state.kind.apply_input(other),
        };
        if effect == InputEffect::Ignored {
            trace!(input = %input.key(), kind = state.kind.kind_name(), "input not used by this field kind");
        }
        let recorded = state.inputs.insert(input.key(), input.clone());
        let change = match previous {
            Some(previous) => SimpleChange {
                previous,
                current: input,
                first_change: false,
            },
            None => SimpleChange {
                first_change: recorded.is_none(),
                previous: recorded,
                current: input,
            },
        };
        (change, effect)
    }

    fn on_changes(&self, changes: &InputChanges, revalidate: bool) {
        if revalidate {
            self.recompose_validators();
        }
        if changes.is_later_change(InputKey::Messages) {
            self.translate_messages();
            if self.is_initialized() {
                self.refresh_error_display();
            }
        }
        self.on_select_changes(changes);
    }

    fn recompose_validators(&self) {
        let internal = {
            let state = self.state();
            let mut validators = state.kind.compute_validators();
            validators.extend(state.validators.iter().cloned());
            if state.required == Some(true) {
                validators.push(Validator::required());
            }
            state.internal.set_validators(validators);
            state.internal.clone()
        };
        internal.update_value_and_validity(false);
        if self.is_initialized() {
            self.refresh_error_display();
        }
    }

    fn translate_messages(&self) {
        let mut guard = self.state_mut();
        let state = &mut *guard;
        state.messages = translate_messages(
            &state.message_overrides,
            state.context.translator.as_ref(),
        );
    }

    /// Completes set-up once the first inputs are in.
    pub fn init(&self) {
        {
            let state = self.state();
            if state.initialized || state.destroyed {
                return;
            }
        }
        self.translate_messages();
        self.assign_id();
        self.init_kind();
        if let Some(outer) = self.outer_control() {
            // Validated at attach time, before the first inputs arrived.
            outer.update_validity(false);
            self.write_value(outer.value());
        }
        self.state_mut().initialized = true;
        self.setup_validation();
        debug!(id = ?self.id(), kind = self.kind_name(), "field initialized");
    }

    fn assign_id(&self) {
        let mut guard = self.state_mut();
        let state = &mut *guard;
        if state.id.is_some() {
            return;
        }
        let name = state.link.as_ref().and_then(|link| link.name.clone());
        state.id = Some(name.unwrap_or_else(|| state.context.ids.next_id(RANDOM_ID_PREFIX)));
    }

    fn init_kind(&self) {
        let required = self.is_required();
        let mut guard = self.state_mut();
        let state = &mut *guard;
        match &mut state.kind {
            FieldKind::Select(select) => {
                let multiple = select.multiple();
                select.clearable.get_or_insert(!required);
                select.allow_invalid.get_or_insert(!required);
                select.hide_selected.get_or_insert(multiple);
                select.initializing = false;
            }
            FieldKind::Text(text) => {
                let generated = state
                    .id
                    .as_deref()
                    .is_some_and(|id| id.starts_with(RANDOM_ID_PREFIX));
                if generated && text.autocomplete != Some(OnOff::Off) {
                    text.autocomplete = Some(OnOff::Off);
                }
            }
            FieldKind::PlainText(_) => {}
        }
    }

    fn setup_validation(&self) {
        let Some(outer) = self.outer_control() else {
            self.refresh_error_display();
            return;
        };
        let weak = self.downgrade();
        let subscription = outer.subscribe_status_changes(move |_| {
            if let Some(field) = LabeledField::upgrade(&weak) {
                field.try_refresh_error_display();
            }
        });
        if let Some(link) = self.state_mut().link.as_mut() {
            link.replace_status(subscription);
        }
        self.try_refresh_error_display();
    }

    /// Tears the field down and releases everything the outer control holds
    /// on its behalf.
    pub fn destroy(&self) {
        let link = {
            let mut state = self.state_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.touch_listeners.clear();
            state.clear_listeners.clear();
            state.link.take()
        };
        if let Some(link) = link {
            link.release();
        }
        debug!(id = ?self.id(), "field destroyed");
    }

    /// Accepts a value from the model side. Never marks the outer control
    /// dirty.
    pub fn write_value(&self, value: Value) {
        if self.is_destroyed() {
            debug!("write_value ignored: no control attached");
            return;
        }
        let replacement = self.state().kind.transform_incoming_value(&value);
        match replacement {
            Some(figured) => {
                debug!(incoming = %value, replaced_by = %figured, "incoming value replaced");
                self.update_control(Some(figured), false);
            }
            None => self
                .internal_control()
                .set_value(value, SetValueOptions::default()),
        }
    }

    /// Accepts a value edited by the user. Returns `false` when the change
    /// was vetoed.
    pub fn input(&self, value: Value) -> bool {
        if self.is_destroyed() {
            debug!("input ignored: no control attached");
            return false;
        }
        let guard = self
            .state()
            .kind
            .as_select()
            .and_then(|select| select.confirm_change.clone());
        if guard.is_some_and(|guard| !guard.allows(&value)) {
            debug!(value = %value, "change vetoed by confirmChange");
            return false;
        }
        if let Some(outer) = self.outer_control() {
            outer.mark_as_dirty();
        }
        self.internal_control()
            .set_value(value, SetValueOptions::default());
        true
    }

    /// Marks the field as visited.
    pub fn touch(&self) {
        let listeners = self.state().touch_listeners.clone();
        for listener in listeners {
            listener();
        }
        if let Some(outer) = self.outer_control() {
            outer.mark_as_touched();
        }
    }

    /// Subscribes to every internal value change, model writes included.
    pub fn register_value_change_listener(
        &self,
        listener: impl Fn(&Value) + 'static,
    ) -> Subscription {
        self.internal_control().subscribe_value_changes(listener)
    }

    pub fn register_touch_listener(&self, listener: impl Fn() + 'static) {
        self.state_mut().touch_listeners.push(Rc::new(listener));
    }

    pub fn set_disabled_state(&self, disabled: bool) {
        let internal = self.internal_control();
        if disabled {
            internal.disable(false);
        } else {
            internal.enable(false);
        }
    }

    /// Pushes `value` (or just revalidates) without letting intermediate
    /// status events refresh the display. Unless `mark_as_dirty`, a pristine
    /// outer control stays pristine and the display is refreshed once.
    pub fn update_control(&self, value: Option<Value>, mark_as_dirty: bool) {
        let outer = self.outer_control();
        let was_pristine = outer.as_ref().is_some_and(FieldControl::pristine);
        self.state_mut().skip_refresh = !mark_as_dirty;
        let internal = self.internal_control();
        match value {
            Some(value) => internal.set_value(value, SetValueOptions::default()),
            None => internal.update_value_and_validity(true),
        }
        self.state_mut().skip_refresh = false;

        if !mark_as_dirty {
            if let Some(outer) = outer.as_ref().filter(|_| was_pristine) {
                outer.mark_as_pristine();
            }
            self.refresh_error_display();
        } else if outer.is_none() {
            self.refresh_error_display();
        }
    }

    /// Whether a value is mandatory for this field.
    ///
    /// Decided by the declarative marker when set, then by a required
    /// validator on the outer control, and finally by probing the outer
    /// control's opaque validators with `null`.
    pub fn is_required(&self) -> bool {
        let marker = self.state().required;
        if let Some(required) = marker {
            return required;
        }
        let Some(outer) = self.outer_control() else {
            return false;
        };
        let kinds = outer.validator_kinds();
        if kinds.contains(&ValidatorKind::Required) {
            return true;
        }
        kinds.contains(&ValidatorKind::Custom)
            && outer
                .probe(&Value::Null)
                .is_some_and(|errors| errors.contains_key(REQUIRED))
    }

    /// Displayed text of a plain-text field.
    pub fn display_value(&self) -> Option<Value> {
        let value = self.value();
        self.state()
            .kind
            .as_plain_text()
            .and_then(|plain| plain.display_value(&value))
    }

    /// Validation the field contributes to its outer control.
    pub fn validate(&self, value: &Value) -> Option<ValidationErrors> {
        self.state().kind.validate(value)
    }

    /// Outer and internal errors merged, minus what is never displayed.
    pub fn actual_errors(&self) -> Option<ValidationErrors> {
        let outer_errors = self.outer_control().and_then(|outer| outer.errors());
        let internal_errors = self.internal_control().errors();
        let mut merged = match (outer_errors, internal_errors) {
            (None, None) => return None,
            (outer, internal) => {
                let mut merged = outer.unwrap_or_default();
                merged.extend(internal.unwrap_or_default());
                merged
            }
        };
        self.state().kind.filter_actual_errors(&mut merged);
        Some(merged)
    }

    pub fn error_display(&self) -> ErrorDisplay {
        let control = self
            .outer_control()
            .unwrap_or_else(|| self.internal_control());
        if control.pristine() {
            ErrorDisplay::PristineSuppressed
        } else {
            ErrorDisplay::DirtyVisible
        }
    }

    fn try_refresh_error_display(&self) {
        if self.state().skip_refresh {
            trace!("error display refresh deferred");
            return;
        }
        self.refresh_error_display();
    }

    /// Recomputes the displayed messages from the current errors.
    pub fn refresh_error_display(&self) {
        let mut errors = self.actual_errors();
        if let (Some(outer), Some(errors)) = (self.outer_control(), errors.as_mut())
            && outer.pristine()
        {
            errors.shift_remove(REQUIRED);
            if !errors.is_empty() {
                debug!(errors = ?errors.keys().collect::<Vec<_>>(), "errors on a pristine control, marking dirty");
                outer.mark_as_dirty();
            }
        }
        let messages = build_error_messages(errors.as_ref(), &self.state().messages);
        trace!(?messages, "error display refreshed");
        self.state_mut().error_messages = messages;
    }
}

impl fmt::Debug for LabeledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("LabeledField")
            .field("id", &state.id)
            .field("label", &state.label)
            .field("kind", &state.kind)
            .field("internal", &state.internal)
            .field("error_messages", &state.error_messages)
            .field("destroyed", &state.destroyed)
            .finish_non_exhaustive()
    }
}
