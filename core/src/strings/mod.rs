//! Translation file model.
//!
//! A [`StringsFile`] is either the flat iOS dictionary or the Android file
//! that partitions its keys per language and carries a content version.
//! Both variants share the same add/edit/serialize surface so the sync
//! engine never needs to know which one it is holding.

mod flat;
mod partitioned;

pub use flat::FlatStrings;
pub use partitioned::{PartitionedStrings, TranslationDictionary};

use crate::config::Platform;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Synthetic key under which the Android content version is displayed and edited.
pub const CONTENT_VERSION_KEY: &str = "content_version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "fr")]
    Fr,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::EnGb,
        Language::EnUs,
        Language::De,
        Language::Fr,
    ];

    /// Code used in the `lang` field of a translation dictionary.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::EnGb => "en-GB",
            Language::EnUs => "en-US",
            Language::De => "de",
            Language::Fr => "fr",
        }
    }

    /// Case-insensitive lookup used for user-entered titles.
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(title))
    }

    /// Exact lookup used for dictionary codes read from the wire.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| language.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One displayable entry of a strings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAndValue {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl KeyAndValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn content_version(value: impl Into<String>) -> Self {
        Self::new(CONTENT_VERSION_KEY, value)
    }

    /// Display-only row that opens a language section.
    pub fn separator(language: Language) -> Self {
        Self::new(language.code().to_uppercase(), "").with_language(language)
    }

    pub fn is_separator(&self) -> bool {
        self.language
            .map(|language| language.code().to_uppercase() == self.key)
            .unwrap_or(false)
    }
}

/// Reason an `add_entries` call stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryConflict {
    #[error("\"{0}\" already exists in the json")]
    DuplicateKey(String),
    #[error("\"{key}\" is missing a language")]
    MissingLanguage { key: String },
    #[error("no dictionary exists for language {language} (key \"{key}\")")]
    UnknownLanguage { key: String, language: Language },
}

impl EntryConflict {
    pub fn key(&self) -> &str {
        match self {
            EntryConflict::DuplicateKey(key) => key,
            EntryConflict::MissingLanguage { key } | EntryConflict::UnknownLanguage { key, .. } => {
                key
            }
        }
    }
}

/// The translation file currently checked out of the repository.
///
/// Serialization goes through the inner types, whose fields are declared in
/// alphabetical order and whose dictionaries are `BTreeMap`s, so the JSON
/// output always has sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StringsFile {
    Flat(FlatStrings),
    Partitioned(PartitionedStrings),
}

impl StringsFile {
    /// Decodes a response body using the shape the platform stores.
    pub fn from_json(platform: Platform, body: &[u8]) -> Result<Self, serde_json::Error> {
        match platform {
            Platform::Ios => serde_json::from_slice(body).map(StringsFile::Flat),
            Platform::Android => serde_json::from_slice(body).map(StringsFile::Partitioned),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            StringsFile::Flat(_) => Platform::Ios,
            StringsFile::Partitioned(_) => Platform::Android,
        }
    }

    /// Inserts new keys, stopping at the first entry that cannot be placed.
    ///
    /// Entries before the failing one stay applied.
    pub fn add_entries(&mut self, entries: &[KeyAndValue]) -> Result<(), EntryConflict> {
        match self {
            StringsFile::Flat(file) => file.add_entries(entries),
            StringsFile::Partitioned(file) => file.add_entries(entries),
        }
    }

    /// Applies `old key -> replacement` edits. Edits may overwrite existing keys.
    pub fn edit_entries(&mut self, edits: &BTreeMap<String, KeyAndValue>) {
        match self {
            StringsFile::Flat(file) => file.edit_entries(edits),
            StringsFile::Partitioned(file) => file.edit_entries(edits),
        }
    }

    pub fn display_entries(&self) -> Vec<KeyAndValue> {
        match self {
            StringsFile::Flat(file) => file.display_entries(),
            StringsFile::Partitioned(file) => file.display_entries(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Builds the form body for a `POST src` commit.
    pub fn serialize_for_push(
        &self,
        form_key: &str,
        commit_message: &str,
        branch: &str,
    ) -> Result<Vec<u8>, serde_json::Error> {
        let json = self.to_json()?;
        let body = format!(
            "{form_key}={}&message={}&branch={}",
            percent_encode(&json),
            percent_encode(commit_message),
            percent_encode(branch)
        );
        Ok(body.into_bytes())
    }
}

fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, NON_ALPHANUMERIC).to_string()
}

/// Key lookup that ignores surrounding whitespace on both sides.
pub(crate) fn contains_key(map: &BTreeMap<String, String>, key: &str) -> bool {
    let wanted = key.trim();
    map.keys().any(|existing| existing.trim() == wanted)
}

/// Removes `key`, falling back to a stored key that only differs by surrounding whitespace.
pub(crate) fn remove_key(map: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    if let Some(value) = map.remove(key) {
        return Some(value);
    }
    let wanted = key.trim();
    let stored = map.keys().find(|existing| existing.trim() == wanted).cloned()?;
    map.remove(&stored)
}

pub(crate) fn sorted_entries(
    map: &BTreeMap<String, String>,
    language: Option<Language>,
) -> impl Iterator<Item = KeyAndValue> + '_ {
    map.iter().map(move |(key, value)| KeyAndValue {
        key: key.clone(),
        value: value.clone(),
        language,
    })
}
