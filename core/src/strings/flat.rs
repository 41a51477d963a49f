/// iOS strings file: a single key/value dictionary
use super::{contains_key, remove_key, sorted_entries, EntryConflict, KeyAndValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatStrings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    strings: BTreeMap<String, String>,
}

impl FlatStrings {
    pub fn new(strings: BTreeMap<String, String>) -> Self {
        Self {
            language: None,
            strings,
        }
    }

    pub fn strings(&self) -> &BTreeMap<String, String> {
        &self.strings
    }

    pub fn contains(&self, key: &str) -> bool {
        contains_key(&self.strings, key)
    }

    fn add(&mut self, key: &str, value: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.strings.insert(key.to_string(), value.to_string());
        true
    }

    pub fn add_entries(&mut self, entries: &[KeyAndValue]) -> Result<(), EntryConflict> {
        for entry in entries {
            if !self.add(&entry.key, &entry.value) {
                return Err(EntryConflict::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(())
    }

    pub fn edit_entries(&mut self, edits: &BTreeMap<String, KeyAndValue>) {
        for (old_key, replacement) in edits {
            remove_key(&mut self.strings, old_key);
            self.strings
                .insert(replacement.key.clone(), replacement.value.clone());
        }
    }

    pub fn display_entries(&self) -> Vec<KeyAndValue> {
        sorted_entries(&self.strings, None).collect()
    }
}
