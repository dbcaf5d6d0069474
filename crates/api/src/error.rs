use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use multi_language_core::translation::TranslationError;
use serde_json::json;

/// API error type that maps to Sanity-compatible JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The content lake failed or could not be reached.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TranslationError> for ApiError {
    fn from(err: TranslationError) -> Self {
        match &err {
            TranslationError::UnknownLanguage(_)
            | TranslationError::NotTranslatable(_)
            | TranslationError::InvalidDocument(_) => {
                ApiError::BadRequest(err.to_string())
            }
            TranslationError::UnresolvableReference(_) => ApiError::Conflict(err.to_string()),
            TranslationError::CreateFailed(store) if store.is_conflict() => {
                ApiError::Conflict(err.to_string())
            }
            TranslationError::QueryFailed(_)
            | TranslationError::CreateFailed(_)
            | TranslationError::PatchFailed(_) => ApiError::Upstream(err.to_string()),
            TranslationError::SchemaViolation(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "upstreamError", msg.clone())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use multi_language_core::schema::SchemaError;
    use multi_language_core::store::StoreError;

    fn status(err: TranslationError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn translation_errors_map_to_statuses() {
        assert_eq!(
            status(TranslationError::QueryFailed(StoreError::Query("bad".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(TranslationError::CreateFailed(StoreError::Conflict("drafts.x".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(TranslationError::CreateFailed(StoreError::Status {
                status: 500,
                message: "boom".into(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(TranslationError::UnresolvableReference("b".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(TranslationError::UnknownLanguage("xx".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(TranslationError::NotTranslatable("category".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(TranslationError::SchemaViolation(SchemaError::Violation("page".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
