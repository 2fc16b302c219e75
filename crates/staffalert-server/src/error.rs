use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use staffalert_notifications::NotificationError;

/// Dispatch failure rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub NotificationError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            NotificationError::ConcurrentInvocation(_) => StatusCode::CONFLICT,
            NotificationError::DispatchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Alert dispatch failed");
        } else {
            tracing::warn!(error = %self.0, "Alert rejected");
        }
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}
