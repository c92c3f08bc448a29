use anyhow::{Context, Result};
use axum::{extract::State, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use phrasify_core::settings::SettingsMap;
use phrasify_core::{DictionaryStats, Payload, PhraseError, Session, SessionConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Serialize, Deserialize)]
pub struct PhrasifyResponse {
    pub payload: Payload,
    /// Tokens across all output segments; fills the host's TokenCount header.
    pub token_count: usize,
    pub took_s: f64,
}

#[derive(Default, Deserialize)]
pub struct ReloadRequest {
    /// New settings map; the current configuration is reused when absent.
    #[serde(default)]
    pub settings: Option<SettingsMap>,
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub admin_token: Option<String>,
}

/// Build the router around a session that has already been initialized
/// (or deliberately left with an empty dictionary).
pub fn build_app(session: Session) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    router(AppState { session: Arc::new(RwLock::new(session)), admin_token })
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dictionary", get(dictionary_handler))
        .route("/phrasify", post(phrasify_handler))
        .route("/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Initialize a session from `config`, refusing to start on failure.
pub fn initialized_session(config: SessionConfig) -> Result<Session> {
    let mut session = Session::new(config);
    let dictionary = session.initialize().context("building phrase dictionary")?;
    tracing::info!(phrases = dictionary.len(), max_length = dictionary.max_length(), "dictionary ready");
    Ok(session)
}

pub async fn dictionary_handler(State(state): State<AppState>) -> Json<DictionaryStats> {
    let dictionary = state.session.read().dictionary();
    Json(dictionary.stats())
}

pub async fn phrasify_handler(State(state): State<AppState>, Json(input): Json<Payload>) -> Json<PhrasifyResponse> {
    let start = std::time::Instant::now();
    // Hold the lock only long enough to take a handle.
    let dictionary = state.session.read().dictionary();
    let payload = phrasify_core::transform_payload(&dictionary, &input);
    let token_count = payload.token_count();
    Json(PhrasifyResponse { payload, token_count, took_s: start.elapsed().as_secs_f64() })
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReloadRequest>,
) -> Result<Json<DictionaryStats>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let config = match &req.settings {
        Some(map) => SessionConfig::import(map).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => state.session.read().config().clone(),
    };

    // Catalog parsing is blocking I/O; keep it off the workers and outside the lock.
    let build_config = config.clone();
    let built = tokio::task::spawn_blocking(move || build_config.build_dictionary())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let settled = {
        let mut session = state.session.write();
        session.set_config(config);
        session.settle(built)
    };
    match settled {
        Ok(dictionary) => Ok(Json(dictionary.stats())),
        Err(e @ (PhraseError::ConfigurationIncomplete | PhraseError::ConfigurationInvalid(_))) => {
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
