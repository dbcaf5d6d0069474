pub mod health;
pub mod translations;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(translations::routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state(store: std::sync::Arc<multi_language_core::store::MemoryStore>) -> AppState {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use multi_language_core::config::{LanguageInfo, LanguagesConfig};
    use multi_language_core::events::bus::EventBus;
    use multi_language_core::schema::{SchemaRegistry, SchemaType};
    use multi_language_core::translation::TranslationEngine;

    use crate::config::AppConfig;

    let mut languages = BTreeMap::new();
    languages.insert("en".to_string(), LanguageInfo::new("English", "en_US"));
    languages.insert("fr".to_string(), LanguageInfo::new("Français", "fr_FR"));
    languages.insert("de".to_string(), LanguageInfo::new("Deutsch", "de_DE"));

    let schema = SchemaRegistry::new([SchemaType {
        multi_language: true,
        ..SchemaType::new("page", ["title", "related"])
    }])
    .unwrap();

    let event_bus = EventBus::new(16);
    let engine = TranslationEngine::new(
        store,
        Arc::new(schema),
        Arc::new(LanguagesConfig::new(languages, "en")),
    )
    .with_event_bus(event_bus.clone());
    AppState::new(engine, AppConfig::default(), event_bus)
}
