use std::sync::Arc;

use multi_language_core::events::bus::EventBus;
use multi_language_core::translation::TranslationEngine;

use crate::config::AppConfig;

/// Handler state. Every field is cheap to clone, so axum clones the whole
/// struct per request.
#[derive(Clone)]
pub struct AppState {
    engine: TranslationEngine,
    config: Arc<AppConfig>,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(engine: TranslationEngine, config: AppConfig, event_bus: EventBus) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            event_bus,
        }
    }

    pub fn engine(&self) -> &TranslationEngine {
        &self.engine
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The bus the engine announces on; health reports its subscriber count.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
