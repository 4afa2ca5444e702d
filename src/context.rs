use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::scheduler::{ImmediateQueue, TaskQueue};

pub const RANDOM_ID_PREFIX: &str = "pi-field-";

/// Hands out `prefix + n` identifiers, `n` starting at 1.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Cell<u64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, prefix: &str) -> String {
        let next = self.last.get() + 1;
        self.last.set(next);
        format!("{prefix}{next}")
    }
}

/// Source of display text for labels, placeholders and messages.
pub trait Translator {
    fn translate(&self, key: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Looks keys up in a fixed catalogue and falls back to the key itself.
#[derive(Debug, Default, Clone)]
pub struct CatalogTranslator {
    entries: IndexMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(entries: IndexMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Everything a field needs from its surroundings, passed at construction.
///
/// The default context runs deferred work as soon as it is scheduled. Hosts
/// that want it deferred pass a [`MicrotaskQueue`](crate::scheduler::MicrotaskQueue)
/// they keep a handle to and drain.
#[derive(Clone)]
pub struct FieldContext {
    pub ids: Rc<IdGenerator>,
    pub queue: Rc<dyn TaskQueue>,
    pub translator: Rc<dyn Translator>,
}

impl Default for FieldContext {
    fn default() -> Self {
        Self {
            ids: Rc::new(IdGenerator::new()),
            queue: Rc::new(ImmediateQueue),
            translator: Rc::new(IdentityTranslator),
        }
    }
}

impl FieldContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: Rc<IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_queue(mut self, queue: Rc<dyn TaskQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_translator(mut self, translator: Rc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub(crate) fn translate(&self, key: &str) -> String {
        self.translator.translate(key)
    }
}

impl fmt::Debug for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_per_generator() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(RANDOM_ID_PREFIX), "pi-field-1");
        assert_eq!(ids.next_id(RANDOM_ID_PREFIX), "pi-field-2");
        assert_eq!(IdGenerator::new().next_id("x-"), "x-1");
    }

    #[test]
    fn catalogue_falls_back_to_key() {
        let translator = CatalogTranslator::default().with_entry("name", "Name");
        assert_eq!(translator.translate("name"), "Name");
        assert_eq!(translator.translate("email"), "email");
    }
}
