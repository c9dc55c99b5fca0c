//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::planner::{FieldError, PlanError, hint_for};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/plan", post(plan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan rest and fuel stops for a shared route.
async fn plan(State(state): State<AppState>, body: Bytes) -> Result<Json<PlanResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanRequestDto = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "plan request is not valid JSON");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
            fields: Vec::new(),
        }
    })?;

    let include_route_details = req.include_route_details;
    let request = req
        .into_plan_request()
        .map_err(|fields| AppError::from(PlanError::Validation(fields)))?;

    let outcome = state.planner.plan(&request).await?;
    Ok(Json(PlanResponse::from_outcome(outcome, include_route_details)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest {
        message: String,
        fields: Vec<FieldError>,
    },
    Internal {
        message: String,
    },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Validation(fields) => AppError::BadRequest {
                message: "invalid request".to_string(),
                fields,
            },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest { message, fields } => {
                warn!(error = %message, fields = fields.len(), "rejected plan request");
                let body = ErrorResponse {
                    error: message,
                    hint: None,
                    fields: Some(fields),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::Internal { message } => {
                error!(error = %message, "plan failed");
                let body = ErrorResponse {
                    hint: Some(hint_for(&message).to_string()),
                    error: message,
                    fields: None,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
