use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use multi_language_core::config::LanguagesConfig;
use multi_language_core::document::model::Document;
use multi_language_core::translation::{DuplicateResult, TranslationSlot};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Translation routes: the calls the studio's language switcher makes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/languages", get(languages))
        .route("/v1/initial-value/{type_name}", get(initial_value))
        .route("/v1/translations/{translation_id}", get(list_translations))
        .route("/v1/translations/overview", post(overview))
        .route("/v1/translations/fresh", post(create_fresh))
        .route("/v1/translations/duplicate", post(create_duplicate))
        .route("/v1/translations/duplicate/confirm", post(confirm_duplicate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialValueQuery {
    language: Option<String>,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverviewRequest {
    document: Document,
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    document: Document,
    language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmRequest {
    clean_duplicate: Document,
    language: String,
}

async fn languages(State(state): State<AppState>) -> Json<LanguagesConfig> {
    Json(state.engine().config().clone())
}

/// Field values for a new document of a translatable type. `parentId` names
/// the document whose reference field the new one is created from.
async fn initial_value(
    State(state): State<AppState>,
    Path(type_name): Path<String>,
    Query(query): Query<InitialValueQuery>,
) -> ApiResult<Json<Map<String, Value>>> {
    let values = state
        .engine()
        .initial_value_for(
            &type_name,
            query.parent_id.as_deref(),
            query.language.as_deref(),
        )
        .await?;
    Ok(Json(values))
}

async fn list_translations(
    State(state): State<AppState>,
    Path(translation_id): Path<String>,
) -> ApiResult<Json<BTreeMap<String, Document>>> {
    let translations = state.engine().list_translations(&translation_id).await?;
    Ok(Json(translations))
}

async fn overview(
    State(state): State<AppState>,
    payload: Result<Json<OverviewRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<TranslationSlot>>> {
    let Json(request) = payload?;
    let slots = state.engine().translation_overview(&request.document).await?;
    Ok(Json(slots))
}

async fn create_fresh(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Json(request) = payload?;
    let created = state
        .engine()
        .create_fresh_translation(&request.document, &request.language)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_duplicate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DuplicateResult>)> {
    let Json(request) = payload?;
    let result = state
        .engine()
        .create_duplicate_translation(&request.document, &request.language)
        .await?;
    Ok(duplicate_response(result))
}

async fn confirm_duplicate(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DuplicateResult>)> {
    let Json(request) = payload?;
    let result = state
        .engine()
        .confirm_duplicate_without_references(&request.clean_duplicate, &request.language)
        .await?;
    Ok(duplicate_response(result))
}

/// 201 when a document was written, 200 when the caller has to decide.
fn duplicate_response(result: DuplicateResult) -> (StatusCode, Json<DuplicateResult>) {
    let status = if result.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(result))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use multi_language_core::store::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::{build_router, test_state};

    fn seeded() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_documents([
            json!({"_id": "a", "_type": "page", "translationId": "t1", "language": "en", "related": {"_ref": "b"}}),
            json!({"_id": "b", "_type": "page", "translationId": "t2", "language": "en"}),
            json!({"_id": "c", "_type": "page", "translationId": "t3", "language": "en", "related": {"_ref": "d"}}),
            json!({"_id": "d", "_type": "page", "translationId": "t4", "language": "en"}),
            json!({"_id": "d-fr", "_type": "page", "translationId": "t4", "language": "fr"}),
        ]))
    }

    async fn send(store: Arc<MemoryStore>, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state(store)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn languages_lists_configuration() {
        let (status, body) = send(seeded(), get("/v1/languages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["defaultLanguage"], "en");
        assert_eq!(body["languages"]["fr"]["icu"], "fr_FR");
    }

    #[tokio::test]
    async fn initial_value_for_translatable_types_only() {
        let (status, body) = send(seeded(), get("/v1/initial-value/page?language=fr")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "fr");
        assert!(body["translationId"].as_str().is_some_and(|id| !id.is_empty()));

        let (_, body) = send(seeded(), get("/v1/initial-value/page")).await;
        assert_eq!(body["language"], "en");

        let (status, _) = send(seeded(), get("/v1/initial-value/category")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(seeded(), get("/v1/initial-value/page?language=xx")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn initial_value_inherits_the_parent_language() {
        let (status, body) = send(seeded(), get("/v1/initial-value/page?parentId=d-fr")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "fr");

        let (_, body) = send(seeded(), get("/v1/initial-value/page?parentId=gone&language=de")).await;
        assert_eq!(body["language"], "de");
    }

    #[tokio::test]
    async fn duplicate_reports_untranslated_references() {
        let store = seeded();
        let document = store.get("a").await.unwrap();
        let (status, body) = send(
            store.clone(),
            post("/v1/translations/duplicate", json!({"document": document, "language": "fr"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "untranslatedReferencesFound");
        assert_eq!(body["references"][0]["_id"], "b");
        assert!(body["cleanDuplicate"].get("related").is_none());
        assert_eq!(store.create_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_then_confirm_creates_document() {
        let store = seeded();
        let document = store.get("a").await.unwrap();
        let (_, found) = send(
            store.clone(),
            post("/v1/translations/duplicate", json!({"document": document, "language": "fr"})),
        )
        .await;

        let (status, body) = send(
            store.clone(),
            post(
                "/v1/translations/duplicate/confirm",
                json!({"cleanDuplicate": found["cleanDuplicate"], "language": "fr"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["document"]["language"], "fr");
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_rewrites_translated_reference() {
        let store = seeded();
        let document = store.get("c").await.unwrap();
        let (status, body) = send(
            store,
            post("/v1/translations/duplicate", json!({"document": document, "language": "fr"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["document"]["related"], json!({"_ref": "d-fr"}));
        assert_eq!(body["document"]["translationId"], "t3");
    }

    #[tokio::test]
    async fn fresh_translation_is_created() {
        let store = seeded();
        let document = store.get("a").await.unwrap();
        let (status, body) = send(
            store,
            post("/v1/translations/fresh", json!({"document": document, "language": "de"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["language"], "de");
        assert_eq!(body["translationId"], "t1");
        assert!(body.get("related").is_none());
    }

    #[tokio::test]
    async fn group_listing_and_overview() {
        let store = seeded();
        let (status, body) = send(store.clone(), get("/v1/translations/t4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fr"]["_id"], "d-fr");
        assert_eq!(body["en"]["_id"], "d");

        let document = store.get("d").await.unwrap();
        let (status, body) = send(
            store,
            post("/v1/translations/overview", json!({"document": document})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["language"], "de");
        assert_eq!(body[0]["translation"], Value::Null);
        assert_eq!(body[1]["language"], "fr");
        assert_eq!(body[1]["country"], "FR");
        assert_eq!(body[1]["translation"]["_id"], "d-fr");
    }

    #[tokio::test]
    async fn unknown_language_is_bad_request() {
        let store = seeded();
        let document = store.get("a").await.unwrap();
        let (status, body) = send(
            store,
            post("/v1/translations/duplicate", json!({"document": document, "language": "xx"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "badRequest");
        assert_eq!(body["error"]["statusCode"], 400);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (status, body) = send(
            seeded(),
            post("/v1/translations/fresh", json!({"document": "not an object", "language": "fr"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "badRequest");
    }

    #[tokio::test]
    async fn store_outage_is_bad_gateway() {
        let store = seeded();
        let document = store.get("a").await.unwrap();
        store.set_fail_queries(true);
        let (status, body) = send(
            store,
            post("/v1/translations/duplicate", json!({"document": document, "language": "fr"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "upstreamError");
    }
}
