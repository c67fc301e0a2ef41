//! HTTP surface of the service.

use crate::i18n::{TOptions, Translation, Translator};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Query parameters of `/translate` that are not interpolation variables.
const RESERVED_PARAMS: [&str; 6] = ["key", "lng", "ns", "count", "context", "defaultValue"];

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
}

/// Errors returned to HTTP clients.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Missing required query parameter '{0}'")]
    MissingParam(&'static str),

    #[error("Invalid value for '{name}': {value}")]
    InvalidParam { name: &'static str, value: String },

    #[error("Namespace '{ns}' is not loaded for language '{lng}'")]
    BundleNotFound { lng: String, ns: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParam(_) | Self::InvalidParam { .. } => StatusCode::BAD_REQUEST,
            Self::BundleNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParam(_) => "MISSING_PARAM",
            Self::InvalidParam { .. } => "INVALID_PARAM",
            Self::BundleNotFound { .. } => "BUNDLE_NOT_FOUND",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "error_code": self.error_code(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub fn router(translator: Arc<Translator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/translate", get(translate))
        .route("/locales/:lng/:ns", get(locale_bundle))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { translator })
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /languages
async fn languages(State(state): State<AppState>) -> Json<Value> {
    let options = state.translator.options();
    Json(json!({
        "default": options.lng,
        "fallback": options.fallback_lng,
        "supported": state.translator.languages(),
        "namespaces": options.ns,
    }))
}

/// GET /translate?key=...&lng=...&ns=...&count=...&context=...&defaultValue=...
///
/// Any other parameter is passed as an interpolation variable.
async fn translate(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Translation>, ApiError> {
    let key = params
        .get("key")
        .filter(|key| !key.trim().is_empty())
        .ok_or(ApiError::MissingParam("key"))?;

    let mut opts = TOptions::new();
    opts.lng = params.get("lng").cloned();
    opts.ns = params.get("ns").cloned();
    opts.context = params.get("context").cloned();
    opts.default_value = params.get("defaultValue").cloned();
    if let Some(count) = params.get("count") {
        opts.count = Some(count.parse().map_err(|_| ApiError::InvalidParam {
            name: "count",
            value: count.clone(),
        })?);
    }
    for (name, value) in &params {
        if !RESERVED_PARAMS.contains(&name.as_str()) {
            opts.replace.insert(name.clone(), Value::String(value.clone()));
        }
    }

    Ok(Json(state.translator.translate(key, &opts)))
}

/// GET /locales/:lng/:ns - raw bundle as loaded at startup
async fn locale_bundle(
    State(state): State<AppState>,
    Path((lng, ns)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .translator
        .bundle(&lng, &ns)
        .cloned()
        .map(Json)
        .ok_or(ApiError::BundleNotFound { lng, ns })
}

/// GET /metrics
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.translator.metrics().report())
}
