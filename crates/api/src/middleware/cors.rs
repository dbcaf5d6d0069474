use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The studio calls from its own origin; only JSON GET/POST are served.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
