//! Plugin language configuration.
//!
//! Passed explicitly to the engine; nothing here is process-global.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no languages configured")]
    NoLanguages,
    #[error("default language `{0}` is not one of the configured languages")]
    UnknownDefault(String),
    #[error("failed to read language config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid language config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Display metadata for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub title: String,
    /// ICU locale such as `nl_NL`; the region part selects the flag.
    pub icu: String,
}

impl LanguageInfo {
    pub fn new(title: impl Into<String>, icu: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icu: icu.into(),
        }
    }

    /// Region code of the ICU locale (`nl_NL` -> `NL`), if it has one.
    pub fn country(&self) -> Option<&str> {
        self.icu
            .split(['_', '-'])
            .nth(1)
            .filter(|region| !region.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesConfig {
    pub languages: BTreeMap<String, LanguageInfo>,
    pub default_language: String,
}

impl LanguagesConfig {
    pub fn new(languages: BTreeMap<String, LanguageInfo>, default_language: impl Into<String>) -> Self {
        Self {
            languages,
            default_language: default_language.into(),
        }
    }

    /// Load from a JSON file shaped like
    /// `{"languages": {"nl": {"title": "Nederlands", "icu": "nl_NL"}}, "defaultLanguage": "nl"}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::NoLanguages);
        }
        if !self.contains(&self.default_language) {
            return Err(ConfigError::UnknownDefault(self.default_language.clone()));
        }
        Ok(())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.languages.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages.get(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }
}
