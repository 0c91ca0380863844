//! CORS layer for the REST API and the session upgrade endpoint.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsSettings;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer. An empty list or a `"*"` entry allows any origin;
/// entries that are not valid header values are skipped with a warning.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    match allowed_origins(settings) {
        None => base.allow_origin(Any),
        Some(origins) => base
            .allow_origin(AllowOrigin::list(origins))
            .max_age(Duration::from_secs(settings.max_age_secs)),
    }
}

fn allowed_origins(settings: &CorsSettings) -> Option<Vec<HeaderValue>> {
    if settings.allowed_origins.iter().any(|o| o.trim() == "*") {
        return None;
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    (!origins.is_empty()).then_some(origins)
}
