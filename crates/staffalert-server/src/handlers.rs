use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::{Value, json};
use staffalert_notifications::{DispatchResponse, NotificationError, envelope};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Staff Alert Gateway",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

fn parse_json(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(NotificationError::malformed(format!("request body is not JSON: {e}"))))
}

/// `POST /notification`: the request body is the alert payload.
pub async fn send_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DispatchResponse>, ApiError> {
    let payload = parse_json(&body)?;
    let response = state.handler.handle(&payload).await?;
    Ok(Json(response))
}

/// `POST /invoke`: the request body is a gateway event whose `body` field
/// carries the alert payload, either as an object or as a JSON string.
pub async fn invoke(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DispatchResponse>, ApiError> {
    let event = parse_json(&body)?;
    let payload = envelope::extract_body(&event)?;
    let response = state.handler.handle(&payload).await?;
    Ok(Json(response))
}
