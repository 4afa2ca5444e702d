use indexmap::IndexMap;

use super::{FieldInput, FieldOptions, InputKey};

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleChange {
    pub previous: Option<FieldInput>,
    pub current: FieldInput,
    pub first_change: bool,
}

impl SimpleChange {
    /// The value actually differs from the previous one.
    pub fn is_effective(&self) -> bool {
        self.previous.as_ref() != Some(&self.current)
    }
}

/// Inputs changed during one reaction, keyed by input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputChanges {
    entries: IndexMap<InputKey, SimpleChange>,
}

impl InputChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, change: SimpleChange) {
        self.entries.insert(change.current.key(), change);
    }

    pub fn contains(&self, key: InputKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&self, key: InputKey) -> Option<&SimpleChange> {
        self.entries.get(&key)
    }

    pub fn contains_any(&self, keys: &[InputKey]) -> bool {
        keys.iter().any(|key| self.contains(*key))
    }

    /// Some of `keys` changed to a different value.
    pub fn any_effective(&self, keys: &[InputKey]) -> bool {
        keys.iter()
            .filter_map(|key| self.get(*key))
            .any(SimpleChange::is_effective)
    }

    /// `key` changed and this is not its first assignment.
    pub fn is_later_change(&self, key: InputKey) -> bool {
        self.get(key).is_some_and(|change| !change.first_change)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = InputKey> + '_ {
        self.entries.keys().copied()
    }
}

/// Deep-equality differ for an options bag.
///
/// The first diff after creation reports every entry; later diffs report only
/// entries whose value changed since the previous diff. Removed entries are
/// forgotten and not reported.
#[derive(Debug, Clone, Default)]
pub struct OptionsDiffer {
    previous: IndexMap<InputKey, FieldInput>,
}

impl OptionsDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diff(&mut self, current: &FieldOptions) -> Vec<SimpleChange> {
        let mut changes = Vec::new();
        for input in current.iter() {
            let previous = self.previous.get(&input.key());
            if previous != Some(input) {
                changes.push(SimpleChange {
                    previous: previous.cloned(),
                    current: input.clone(),
                    first_change: false,
                });
            }
        }
        self.previous = current
            .iter()
            .map(|input| (input.key(), input.clone()))
            .collect();
        changes
    }
}
