//! HTTP API server for the question-answering pipeline.
//!
//! Provides a health endpoint and the `/api` answer endpoint.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{AnswerEngine, Query};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Body returned for any request that fails internally.
const GENERIC_FAILURE: &str = "Failed to generate an answer";

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings.snapshot_path()) {
        Output::error(&format!("{}", e));
        Output::info("Run 'course-ta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let engine = Arc::new(AnswerEngine::from_settings(&settings)?);
    let fragments = engine.corpus().len();
    let app = router(engine);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Course TA API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Fragments", &fragments.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Answer", "POST /api");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around a shared engine.
pub fn router(engine: Arc<AnswerEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api", post(answer))
        .layer(cors)
        .with_state(engine)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    fragments: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health(State(engine): State<Arc<AnswerEngine>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        fragments: engine.corpus().len(),
    })
}

async fn answer(
    State(engine): State<Arc<AnswerEngine>>,
    Json(query): Json<Query>,
) -> impl IntoResponse {
    match engine.answer(&query).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) if e.is_client_error() => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to answer question: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: GENERIC_FAILURE.to_string(),
                }),
            )
                .into_response()
        }
    }
}
