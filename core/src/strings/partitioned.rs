/// Android strings file: one dictionary per language plus a content version
use super::{
    contains_key, remove_key, sorted_entries, EntryConflict, KeyAndValue, Language,
    CONTENT_VERSION_KEY,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationDictionary {
    pub lang: String,
    pub map: BTreeMap<String, String>,
}

impl TranslationDictionary {
    pub fn new(language: Language, map: BTreeMap<String, String>) -> Self {
        Self {
            lang: language.code().to_string(),
            map,
        }
    }

    pub fn language(&self) -> Option<Language> {
        Language::from_code(&self.lang)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedStrings {
    content_version: i64,
    translation_dictionaries: Vec<TranslationDictionary>,
}

impl PartitionedStrings {
    pub fn new(content_version: i64, translation_dictionaries: Vec<TranslationDictionary>) -> Self {
        Self {
            content_version,
            translation_dictionaries,
        }
    }

    pub fn content_version(&self) -> i64 {
        self.content_version
    }

    pub fn dictionaries(&self) -> &[TranslationDictionary] {
        &self.translation_dictionaries
    }

    pub fn dictionary(&self, language: Language) -> Option<&TranslationDictionary> {
        self.translation_dictionaries
            .iter()
            .find(|dictionary| dictionary.lang == language.code())
    }

    fn dictionary_mut(&mut self, language: Language) -> Option<&mut TranslationDictionary> {
        self.translation_dictionaries
            .iter_mut()
            .find(|dictionary| dictionary.lang == language.code())
    }

    pub fn add_entries(&mut self, entries: &[KeyAndValue]) -> Result<(), EntryConflict> {
        for entry in entries {
            let Some(language) = entry.language else {
                return Err(EntryConflict::MissingLanguage {
                    key: entry.key.clone(),
                });
            };
            let Some(dictionary) = self.dictionary_mut(language) else {
                return Err(EntryConflict::UnknownLanguage {
                    key: entry.key.clone(),
                    language,
                });
            };
            if contains_key(&dictionary.map, &entry.key) {
                return Err(EntryConflict::DuplicateKey(entry.key.clone()));
            }
            dictionary.map.insert(entry.key.clone(), entry.value.clone());
        }
        Ok(())
    }

    pub fn edit_entries(&mut self, edits: &BTreeMap<String, KeyAndValue>) {
        for (old_key, replacement) in edits {
            if old_key == CONTENT_VERSION_KEY {
                match replacement.value.parse::<i64>() {
                    Ok(version) => self.content_version = version,
                    Err(_) => warn!(
                        "ignoring non-numeric content version {:?}, keeping {}",
                        replacement.value, self.content_version
                    ),
                }
                continue;
            }

            let Some(dictionary) = replacement
                .language
                .and_then(|language| self.dictionary_mut(language))
            else {
                warn!("skipping edit of {old_key:?}: no matching language dictionary");
                continue;
            };
            remove_key(&mut dictionary.map, old_key);
            dictionary
                .map
                .insert(replacement.key.clone(), replacement.value.clone());
        }
    }

    /// Content version first, then each dictionary in file order behind its separator.
    pub fn display_entries(&self) -> Vec<KeyAndValue> {
        let mut entries = vec![KeyAndValue::content_version(
            self.content_version.to_string(),
        )];
        for dictionary in &self.translation_dictionaries {
            let language = dictionary.language();
            if let Some(language) = language {
                entries.push(KeyAndValue::separator(language));
            }
            entries.extend(sorted_entries(&dictionary.map, language));
        }
        entries
    }
}
