// src/api.rs
//! HTTP surface: provider/model menus for the dropdowns, the cached latest
//! headline, and the prediction endpoint. Static UI is served from `static/`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::AppConfig;
use crate::engine;
use crate::error::OracleError;
use crate::llm::build_generator;
use crate::news::{clean_headline, CachedHeadline, NewsdataSource};
use crate::prediction::PredictionResponse;
use crate::provider::{Backend, ALL_PROVIDERS};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub headline: Arc<CachedHeadline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/providers", get(list_providers))
        .route("/headline", get(latest_headline))
        .route("/predict", post(predict))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Build the production router: config from env (fatal on missing keys), the
/// real news client, and the TTL cache.
pub fn app() -> anyhow::Result<Router> {
    let config = AppConfig::from_env()?;
    let source = NewsdataSource::new(&config.news_api_key, config.country.clone())?;
    let headline = CachedHeadline::new(Arc::new(source), config.headline_cache_ttl);
    Ok(router(AppState {
        config: Arc::new(config),
        headline: Arc::new(headline),
    }))
}

#[derive(Serialize)]
struct ProviderInfo {
    name: &'static str,
    models: &'static [&'static str],
}

async fn list_providers() -> Json<Vec<ProviderInfo>> {
    let out = ALL_PROVIDERS
        .iter()
        .map(|p| ProviderInfo {
            name: p.wire_name(),
            models: p.models(),
        })
        .collect();
    Json(out)
}

#[derive(Serialize)]
struct HeadlineOut {
    headline: String,
}

async fn latest_headline(State(state): State<AppState>) -> (HeaderMap, Json<HeadlineOut>) {
    let (headline, hit) = state.headline.get().await;
    let mut headers = HeaderMap::new();
    headers.insert(
        "X-Headline-Cache",
        HeaderValue::from_static(if hit { "HIT" } else { "MISS" }),
    );
    (headers, Json(HeadlineOut { headline }))
}

#[derive(Deserialize)]
struct PredictBody {
    provider: String,
    model: String,
    #[serde(default)]
    headline: Option<String>,
}

#[derive(Serialize)]
struct PredictOut {
    provider: String,
    model: String,
    reference_date: String,
    headline: String,
    prediction: Option<PredictionResponse>,
    raw_output: Option<String>,
    warning: Option<String>,
    date_adjusted: bool,
}

#[derive(Serialize)]
struct ApiError {
    error: String,
}

type ErrorResponse = (StatusCode, Json<ApiError>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictBody>,
) -> Result<Json<PredictOut>, ErrorResponse> {
    // A pasted headline wins; otherwise fall back to the cached fetch. An
    // empty headline never reaches the formatter.
    let headline = match body.headline.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => clean_headline(text),
        _ => state.headline.get().await.0,
    };
    if headline.is_empty() {
        return Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No headline available. Paste a headline or try again in a moment.",
        ));
    }

    let backend = Backend::resolve(&body.provider, &body.model, &state.config.credentials)
        .map_err(|e| {
            // A blanked server-side credential is an operator fault, not a
            // malformed request.
            let status = match e {
                OracleError::MissingCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            error_response(status, e.to_string())
        })?;
    let provider = backend.provider.wire_name().to_string();
    let model = backend.model.clone();
    let generator = build_generator(backend)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    let reference = Utc::now().date_naive();
    let result = engine::run_prediction(generator.as_ref(), &headline, reference)
        .await
        .map_err(|e| error_response(StatusCode::BAD_GATEWAY, format!("{e:#}")))?;

    Ok(Json(PredictOut {
        provider,
        model,
        reference_date: reference.to_string(),
        headline,
        prediction: result.prediction,
        raw_output: result.raw_output,
        warning: result.warning,
        date_adjusted: result.date_adjusted,
    }))
}
