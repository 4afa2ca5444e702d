//! Validation-message registry and error-key to display-text mapping.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::context::Translator;
use crate::control::ValidationErrors;
use crate::control::validators::{EMPTY, FIELD_BINDING, FIELD_EXISTS, REQUIRED};

/// Built-in messages, merged underneath caller overrides.
pub const DEFAULT_MESSAGES: [(&str, &str); 4] = [
    (REQUIRED, "This field is mandatory."),
    (EMPTY, "This field cannot be empty."),
    (FIELD_BINDING, "The value does not expose the expected property."),
    (FIELD_EXISTS, "The value is not one of the available choices."),
];

#[derive(Clone)]
pub enum MessageTemplate {
    Text(String),
    Lazy(Rc<dyn Fn() -> String>),
}

impl MessageTemplate {
    pub fn lazy(producer: impl Fn() -> String + 'static) -> Self {
        Self::Lazy(Rc::new(producer))
    }

    pub fn resolve(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lazy(producer) => producer(),
        }
    }
}

impl PartialEq for MessageTemplate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Lazy(a), Self::Lazy(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Caller-supplied message configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOverrides {
    /// Entries layered over [`DEFAULT_MESSAGES`].
    Merge(IndexMap<String, MessageTemplate>),
    /// No message at all, not even the defaults.
    Suppress,
}

impl Default for MessageOverrides {
    fn default() -> Self {
        Self::Merge(IndexMap::new())
    }
}

impl MessageOverrides {
    pub fn with(self, key: impl Into<String>, template: impl Into<MessageTemplate>) -> Self {
        let mut entries = match self {
            Self::Merge(entries) => entries,
            Self::Suppress => IndexMap::new(),
        };
        entries.insert(key.into(), template.into());
        Self::Merge(entries)
    }
}

/// Translated key to display-text mapping.
pub type MessageRegistry = IndexMap<String, String>;

/// Default registry with overrides applied on top. Overridden defaults keep
/// their position; new keys follow.
pub fn prepare_messages(overrides: &MessageOverrides) -> IndexMap<String, MessageTemplate> {
    let MessageOverrides::Merge(entries) = overrides else {
        return IndexMap::new();
    };
    let mut merged: IndexMap<String, MessageTemplate> = DEFAULT_MESSAGES
        .iter()
        .map(|(key, text)| (key.to_string(), MessageTemplate::from(*text)))
        .collect();
    for (key, template) in entries {
        merged.insert(key.clone(), template.clone());
    }
    merged
}

pub fn translate_messages(
    overrides: &MessageOverrides,
    translator: &dyn Translator,
) -> MessageRegistry {
    prepare_messages(overrides)
        .into_iter()
        .map(|(key, template)| {
            let text = translator.translate(&template.resolve());
            (key, text)
        })
        .collect()
}

/// One display string per active error key, in error order. Keys without a
/// (non-empty) message display as themselves.
pub fn build_error_messages(
    errors: Option<&ValidationErrors>,
    messages: &MessageRegistry,
) -> Vec<String> {
    let Some(errors) = errors else {
        return Vec::new();
    };
    errors
        .keys()
        .map(|key| {
            messages
                .get(key)
                .filter(|text| !text.is_empty())
                .cloned()
                .unwrap_or_else(|| key.clone())
        })
        .collect()
}
