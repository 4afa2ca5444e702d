use crate::context::FieldContext;
use crate::control::FieldControl;
use crate::options::{FieldInput, FieldOptions};

use super::{FieldKind, LabeledField};

/// Assembles a field and runs its set-up in the canonical order: attach,
/// direct inputs, the first check of the options bag, then init.
#[derive(Debug)]
pub struct FieldBuilder {
    kind: FieldKind,
    context: FieldContext,
    inputs: Vec<FieldInput>,
    options: Option<FieldOptions>,
    control: Option<(FieldControl, Option<String>)>,
}

impl FieldBuilder {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            context: FieldContext::default(),
            inputs: Vec::new(),
            options: None,
            control: None,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::text())
    }

    pub fn select() -> Self {
        Self::new(FieldKind::select())
    }

    pub fn plain_text() -> Self {
        Self::new(FieldKind::plain_text())
    }

    pub fn context(mut self, context: FieldContext) -> Self {
        self.context = context;
        self
    }

    /// A direct input, applied before `init`.
    pub fn input(mut self, input: FieldInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Every entry of `options` as direct inputs.
    pub fn inputs(mut self, options: FieldOptions) -> Self {
        self.inputs.extend(options.into_inputs());
        self
    }

    /// An options bag, checked once before `init`.
    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn bind(mut self, control: &FieldControl) -> Self {
        self.control = Some((control.clone(), None));
        self
    }

    pub fn bind_named(mut self, control: &FieldControl, name: impl Into<String>) -> Self {
        self.control = Some((control.clone(), Some(name.into())));
        self
    }

    pub fn build(self) -> LabeledField {
        let field = LabeledField::new(self.kind, self.context);
        if let Some((control, name)) = self.control {
            field.attach(&control, name);
        }
        if !self.inputs.is_empty() {
            field.apply_inputs(self.inputs);
        }
        if let Some(options) = self.options {
            field.set_options(options);
            field.do_check();
        }
        field.init();
        field
    }
}
