//! HTTP surface for the mind map service.
//!
//! This module provides an Axum router exposing generation and lookup.
//! It is only available when the `server` feature is enabled.
//!
//! | Method | Path | Success | Errors |
//! |--------|------|---------|--------|
//! | `POST` | `/mind-maps` | 200 record | 422 invalid input, 500 generation failure |
//! | `GET` | `/mind-maps/{id}` | 200 record | 404 unknown id |
//! | `GET` | `/health` | 200 | |

use crate::service::{GenerateRequest, MindMapService, ServiceError};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mindmap_core::{MindMap, MindMapId};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short, generic label.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorResponse {
    /// Create an error body.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// An error ready to be sent as a response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Generation(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            body: ErrorResponse::new(err.label(), err.user_message()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorResponse::new("Invalid request", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the router.
pub fn router(service: MindMapService) -> Router {
    Router::new()
        .route("/mind-maps", post(generate))
        .route("/mind-maps/{id}", get(show))
        .route("/health", get(health_check))
        .with_state(service)
}

/// Bind and serve until the process is stopped.
pub async fn serve(service: MindMapService, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(e.to_string()))?;

    info!(address = %addr, "Listening for connections");

    axum::serve(listener, router(service))
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    Ok(())
}

/// Server error types.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("Failed to bind to address: {0}")]
    Bind(String),
    /// The server stopped with an error.
    #[error("Server error: {0}")]
    Serve(String),
}

// Handler implementations

/// POST /mind-maps
///
/// The handler future is dropped if the client disconnects, which cancels
/// any in-flight upstream attempt.
async fn generate(
    State(service): State<MindMapService>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<MindMap>, ApiError> {
    let Json(request) = payload?;
    let record = service.generate(request).await?;
    Ok(Json(record))
}

/// GET /mind-maps/{id}
async fn show(
    State(service): State<MindMapService>,
    Path(id): Path<u64>,
) -> Result<Json<MindMap>, ApiError> {
    Ok(Json(service.show(MindMapId::new(id)).await?))
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
