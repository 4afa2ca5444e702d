#![deny(rust_2018_idioms)]

pub mod context;
pub mod control;
pub mod error;
pub mod field;
pub mod io;
pub mod messages;
pub mod options;
pub mod scheduler;
pub mod utils;

pub use context::{FieldContext, Translator};
pub use control::{ControlStatus, FieldControl, SetValueOptions, ValidationErrors, Validator};
pub use error::FieldError;
pub use field::{ErrorDisplay, FieldBuilder, FieldKind, FieldReport, LabeledField};
pub use options::{FieldInput, FieldOptions};

pub mod prelude {
    pub use super::context::{CatalogTranslator, FieldContext, IdentityTranslator, Translator};
    pub use super::control::{
        ControlStatus, FieldControl, SetValueOptions, ValidationErrors, Validator, ValidatorKind,
    };
    pub use super::field::{ErrorDisplay, FieldBuilder, FieldKind, FieldReport, LabeledField};
    pub use super::messages::{MessageOverrides, MessageTemplate};
    pub use super::options::{ChangeGuard, FieldInput, FieldOptions, OnOff, TextInputType};
    pub use super::scheduler::{ImmediateQueue, MicrotaskQueue, TaskQueue};
    pub use super::utils::ElementMatcher;
}
