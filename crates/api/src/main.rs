mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use multi_language_core::config::{LanguageInfo, LanguagesConfig};
use multi_language_core::events::bus::EventBus;
use multi_language_core::events::types::TranslationEvent;
use multi_language_core::schema::{SchemaRegistry, SchemaType};
use multi_language_core::store::{ContentLakeClient, DocumentStore, MemoryStore};
use multi_language_core::translation::TranslationEngine;
use tokio::sync::broadcast::error::RecvError;
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Documents travel whole in request bodies.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting multi-language API server");

    let languages = load_languages(config.languages_file.as_deref())?;
    let schema = load_schema(config.schema_file.as_deref())?;
    let store = build_store(&config);

    let event_bus = EventBus::new(config.event_bus_capacity);
    spawn_event_log(&event_bus);

    let engine = TranslationEngine::new(store, Arc::new(schema), Arc::new(languages))
        .with_event_bus(event_bus.clone())
        .with_clean_duplicate_validation(config.validate_clean_duplicates);

    let state = state::AppState::new(engine, config.clone(), event_bus);

    let app = routes::build_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn load_languages(path: Option<&Path>) -> anyhow::Result<LanguagesConfig> {
    let Some(path) = path else {
        tracing::warn!("LANGUAGES_FILE not set, only English is configured");
        let mut languages = BTreeMap::new();
        languages.insert("en".to_string(), LanguageInfo::new("English", "en_US"));
        return Ok(LanguagesConfig::new(languages, "en"));
    };
    let languages = LanguagesConfig::from_file(path)
        .with_context(|| format!("failed to load languages from {}", path.display()))?;
    tracing::info!(languages = ?languages.codes().collect::<Vec<_>>(), "languages loaded");
    Ok(languages)
}

fn load_schema(path: Option<&Path>) -> anyhow::Result<SchemaRegistry> {
    let Some(path) = path else {
        tracing::warn!("SCHEMA_FILE not set, no type takes part in translation");
        return Ok(SchemaRegistry::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema from {}", path.display()))?;
    let types: Vec<SchemaType> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse schema from {}", path.display()))?;
    let registry = SchemaRegistry::new(types)?;
    tracing::info!(
        translatable = registry.translatable_types().count(),
        "schema loaded"
    );
    Ok(registry)
}

fn build_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    match &config.content_lake {
        Some(lake) => {
            let mut client = ContentLakeClient::new(&lake.url, &lake.dataset)
                .with_api_version(&lake.api_version);
            if let Some(token) = &lake.token {
                client = client.with_token(token);
            }
            tracing::info!(url = %lake.url, dataset = %lake.dataset, "using content lake");
            Arc::new(client)
        }
        None => {
            tracing::warn!("CONTENT_LAKE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Log every created translation; the studio subscribes for navigation.
fn spawn_event_log(event_bus: &EventBus) {
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TranslationEvent::Created(created)) => tracing::info!(
                    document_id = %created.document_id,
                    language = %created.language,
                    mode = ?created.mode,
                    "translation created"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
