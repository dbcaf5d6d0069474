//! Schema introspection.
//!
//! The engine only needs one question answered about a content type: does it
//! take part in translation, i.e. does it carry both `language` and
//! `translationId`? Everything else about the studio schema stays opaque.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::LanguagesConfig;
use crate::document::model::{LANGUAGE_FIELD, TRANSLATION_ID_FIELD};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A type carries exactly one of `language` / `translationId`.
    #[error("schema type `{0}` cannot have only one of `language` and `translationId`")]
    Violation(String),
    /// An opted-in type declares the language fields itself.
    #[error("schema type `{0}` already contains a `language` or `translationId` field")]
    LanguageFieldsDeclared(String),
    #[error("schema type `{0}` is defined more than once")]
    DuplicateType(String),
}

/// The parts of a content type definition the plugin cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub required: Vec<String>,
    /// Opt-in: the plugin adds the language fields when loading the schema.
    #[serde(default)]
    pub multi_language: bool,
}

impl SchemaType {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            required: Vec::new(),
            multi_language: false,
        }
    }

    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn has_language(&self) -> bool {
        self.has_field(LANGUAGE_FIELD) && self.has_field(TRANSLATION_ID_FIELD)
    }

    /// Fails when exactly one of the paired fields is declared.
    pub fn check_language_fields(&self) -> Result<(), SchemaError> {
        if self.has_field(LANGUAGE_FIELD) != self.has_field(TRANSLATION_ID_FIELD) {
            return Err(SchemaError::Violation(self.name.clone()));
        }
        Ok(())
    }

    /// Add the `language` / `translationId` pair in front of the type's own
    /// fields. The type must not declare either of them.
    pub fn with_language_fields(mut self) -> Result<Self, SchemaError> {
        if self.has_field(LANGUAGE_FIELD) || self.has_field(TRANSLATION_ID_FIELD) {
            return Err(SchemaError::LanguageFieldsDeclared(self.name));
        }
        let mut fields = vec![LANGUAGE_FIELD.to_string(), TRANSLATION_ID_FIELD.to_string()];
        fields.append(&mut self.fields);
        self.fields = fields;
        Ok(self)
    }
}

/// Initial values for a newly created multi-language document.
pub fn initial_value(config: &LanguagesConfig, language: Option<&str>) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert(
        LANGUAGE_FIELD.to_string(),
        Value::String(language.unwrap_or(&config.default_language).to_string()),
    );
    values.insert(
        TRANSLATION_ID_FIELD.to_string(),
        Value::String(uuid::Uuid::new_v4().to_string()),
    );
    values
}

/// Lookup of content types by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, SchemaType>,
}

impl SchemaRegistry {
    /// Build the registry, adding language fields to opted-in types and
    /// rejecting types that carry only half of the pair.
    pub fn new(types: impl IntoIterator<Item = SchemaType>) -> Result<Self, SchemaError> {
        let mut registry = HashMap::new();
        for schema_type in types {
            let schema_type = if schema_type.multi_language {
                schema_type.with_language_fields()?
            } else {
                schema_type.check_language_fields()?;
                schema_type
            };
            if registry.contains_key(&schema_type.name) {
                return Err(SchemaError::DuplicateType(schema_type.name));
            }
            registry.insert(schema_type.name.clone(), schema_type);
        }
        tracing::debug!(types = registry.len(), "schema registry loaded");
        Ok(Self { types: registry })
    }

    pub fn get(&self, type_name: &str) -> Option<&SchemaType> {
        self.types.get(type_name)
    }

    /// Whether documents of this type take part in translation. Unknown
    /// types (assets, system documents) do not.
    pub fn type_has_language(&self, type_name: &str) -> bool {
        self.get(type_name).is_some_and(SchemaType::has_language)
    }

    pub fn translatable_types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values().filter(|t| t.has_language())
    }
}
