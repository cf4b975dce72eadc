//! HTTP API.
//!
//! `POST /generate` runs the pipeline for the authenticated caller. Every
//! response, including panics and wrong methods, is JSON.

use crate::auth::{bearer_token, Authenticator, TokenAuthenticator};
use crate::config::Settings;
use crate::error::{Result, SkrivError};
use crate::pipeline::{Pipeline, PipelineOutcome, Stage, TranscriptRequest};
use crate::store::{ArticleStore, GeneratedArticle, SqliteArticleStore, UserId};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub pipeline: Pipeline,
    pub auth: Arc<dyn Authenticator>,
    pub store: Arc<dyn ArticleStore>,
    /// Include error details in 500 responses.
    pub debug: bool,
}

impl AppState {
    pub fn new(pipeline: Pipeline, auth: Arc<dyn Authenticator>, debug: bool) -> Self {
        let store = pipeline.store();
        Self {
            pipeline,
            auth,
            store,
            debug,
        }
    }

    /// State backed by the configured SQLite store and token table.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn ArticleStore> = Arc::new(SqliteArticleStore::new(&settings.sqlite_path())?);
        let pipeline = Pipeline::from_settings(settings, store)?;

        let auth = TokenAuthenticator::from_settings(&settings.server);
        if auth.is_empty() {
            warn!("No API tokens configured under [server.tokens]; every request will be rejected");
        }

        Ok(Self::new(pipeline, Arc::new(auth), settings.server.debug))
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let debug = state.debug;

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate).fallback(method_not_allowed))
        .route("/articles", get(list_articles).fallback(method_not_allowed))
        .route("/articles/{id}", get(get_article).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(move |payload: Box<dyn Any + Send + 'static>| {
            panic_response(debug, payload)
        }))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

#[derive(Serialize)]
struct ArticleListResponse {
    articles: Vec<ArticleSummary>,
    total: usize,
}

#[derive(Serialize)]
struct ArticleSummary {
    id: String,
    title: String,
    source_link: String,
    created_at: String,
}

impl From<&GeneratedArticle> for ArticleSummary {
    fn from(article: &GeneratedArticle) -> Self {
        Self {
            id: article.id.to_string(),
            title: article.title.clone(),
            source_link: article.source_link.clone(),
            created_at: article.created_at.to_rfc3339(),
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            stage: None,
            trace: None,
        }),
    )
        .into_response()
}

/// Status for an error raised outside the pipeline stages.
fn error_status(err: &SkrivError) -> StatusCode {
    match err {
        SkrivError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        SkrivError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON response for `err`. Server errors keep their detail out of the body
/// unless `debug` is set.
fn api_error(debug: bool, err: SkrivError) -> Response {
    let status = error_status(&err);
    if status != StatusCode::INTERNAL_SERVER_ERROR {
        return error_response(status, &err.to_string());
    }

    error!("Internal server error: {}", err);
    (
        status,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            stage: None,
            trace: debug.then(|| err.to_string()),
        }),
    )
        .into_response()
}

/// Response for a handler panic.
pub fn panic_response(debug: bool, payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    api_error(debug, SkrivError::Internal(format!("panic: {}", detail)))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<UserId> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    state.auth.authenticate(bearer_token(header)?)
}

fn stage_status(stage: Stage) -> StatusCode {
    match stage {
        Stage::TitleLookup => StatusCode::BAD_REQUEST,
        Stage::Transcription | Stage::Summarization | Stage::Persistence => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(owner) = authenticate(&state, &headers) else {
        return api_error(state.debug, SkrivError::AuthenticationRequired);
    };

    let request: GenerateRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!("Rejected malformed request body: {}", e);
            return api_error(state.debug, SkrivError::InvalidInput("body is not valid JSON".into()));
        }
    };

    let link = match request.link.as_deref().map(str::trim) {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => {
            return api_error(state.debug, SkrivError::InvalidInput("missing 'link' field".into()))
        }
    };

    match state.pipeline.run(&TranscriptRequest::new(link), &owner).await {
        PipelineOutcome::Success(article) => Json(GenerateResponse {
            content: article.body,
        })
        .into_response(),
        PipelineOutcome::Failure(failure) => (
            stage_status(failure.stage),
            Json(ErrorResponse {
                error: failure.message(),
                stage: Some(failure.stage),
                trace: state.debug.then(|| failure.reason.clone()),
            }),
        )
            .into_response(),
    }
}

async fn list_articles(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(owner) = authenticate(&state, &headers) else {
        return api_error(state.debug, SkrivError::AuthenticationRequired);
    };

    match state.store.list_for_owner(&owner).await {
        Ok(articles) => Json(ArticleListResponse {
            total: articles.len(),
            articles: articles.iter().map(ArticleSummary::from).collect(),
        })
        .into_response(),
        Err(e) => api_error(state.debug, e),
    }
}

async fn get_article(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(owner) = authenticate(&state, &headers) else {
        return api_error(state.debug, SkrivError::AuthenticationRequired);
    };

    let Ok(id) = uuid::Uuid::parse_str(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Article not found");
    };

    match state.store.get_for_owner(id, &owner).await {
        Ok(Some(article)) => Json(article).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => api_error(state.debug, e),
    }
}
