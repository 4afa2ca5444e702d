use serde_json::Value;
use tracing::debug;

use super::LabeledField;
use crate::control::{
    FieldControl, ListenerId, SetValueOptions, Subscription, Validator, ValidatorId, WeakControl,
};

/// Everything a field registered on its outer control.
pub(super) struct OuterLink {
    control: WeakControl,
    pub(super) name: Option<String>,
    validator: ValidatorId,
    on_change: ListenerId,
    on_disabled: ListenerId,
    bridge: Subscription,
    status: Option<Subscription>,
}

impl OuterLink {
    pub(super) fn control(&self) -> Option<FieldControl> {
        self.control.upgrade()
    }

    pub(super) fn replace_status(&mut self, subscription: Subscription) {
        if let Some(previous) = self.status.replace(subscription) {
            previous.unsubscribe();
        }
    }

    /// Undoes every registration. The outer control keeps nothing pointing
    /// back at the field.
    pub(super) fn release(self) {
        self.bridge.unsubscribe();
        if let Some(status) = self.status {
            status.unsubscribe();
        }
        let Some(control) = self.control.upgrade() else {
            return;
        };
        control.remove_validator(self.validator);
        control.remove_on_change(self.on_change);
        control.remove_on_disabled_change(self.on_disabled);
        control.update_validity(false);
    }
}

impl LabeledField {
    /// Binds the field to the control a form owns for it.
    ///
    /// A field already bound elsewhere is detached first.
    pub fn attach(&self, control: &FieldControl, name: Option<String>) {
        if self.is_destroyed() {
            debug!("attach ignored: field is destroyed");
            return;
        }
        self.detach();

        let weak = self.downgrade();
        let validator = control.add_validator(Validator::new({
            let weak = weak.clone();
            move |value| LabeledField::upgrade(&weak).and_then(|field| field.validate(value))
        }));
        let on_change = control.register_on_change({
            let weak = weak.clone();
            move |value| match LabeledField::upgrade(&weak) {
                Some(field) => field.write_value(value.clone()),
                None => debug!("model change dropped: field released"),
            }
        });
        let on_disabled = control.register_on_disabled_change({
            let weak = weak.clone();
            move |disabled| {
                if let Some(field) = LabeledField::upgrade(&weak) {
                    field.set_disabled_state(*disabled);
                }
            }
        });
        let bridge = self.register_value_change_listener(move |value| {
            if let Some(field) = LabeledField::upgrade(&weak) {
                field.push_to_outer(value);
            }
        });

        self.state_mut().link = Some(OuterLink {
            control: control.downgrade(),
            name,
            validator,
            on_change,
            on_disabled,
            bridge,
            status: None,
        });
        debug!(name = ?self.control_name(), "field attached to outer control");

        if control.disabled() {
            self.set_disabled_state(true);
        }
        control.update_validity(false);

        if self.is_initialized() {
            self.write_value(control.value());
            self.setup_validation();
        }
    }

    /// Releases the outer control without tearing the field down.
    pub fn detach(&self) {
        let link = self.state_mut().link.take();
        if let Some(link) = link {
            link.release();
            debug!("field detached from outer control");
        }
    }

    // View-to-model direction: only real differences reach the outer
    // control, so model writes echo nothing back.
    fn push_to_outer(&self, value: &Value) {
        let Some(outer) = self.outer_control() else {
            return;
        };
        if outer.value() != *value {
            outer.set_value(value.clone(), SetValueOptions::view_to_model());
        }
    }
}
