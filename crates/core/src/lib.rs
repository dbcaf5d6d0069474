//! Document-level translation for a Sanity-style content lake.
//!
//! Every translatable document carries a `language` and a `translationId`
//! shared by all of its language variants. [`TranslationEngine`] creates new
//! variants, either empty or as a clone whose references are rewritten to
//! point at the matching variant of each referenced document.

pub mod config;
pub mod document;
pub mod events;
pub mod mutation;
pub mod reference;
pub mod schema;
pub mod store;
pub mod translation;

pub use config::{LanguageInfo, LanguagesConfig};
pub use document::model::Document;
pub use events::bus::EventBus;
pub use schema::{SchemaRegistry, SchemaType};
pub use store::{ContentLakeClient, DocumentStore, MemoryStore, StoreError};
pub use translation::{DuplicateResult, TranslationEngine, TranslationError};
