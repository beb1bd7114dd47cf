use crate::error::SignalingError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tether_core::IdError;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

/// Renders a [`SignalingError`] as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub SignalingError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SignalingError::Validation(_)
            | SignalingError::NonUtf8Payload
            | SignalingError::MalformedBatch(_)
            | SignalingError::UnknownToken
            | SignalingError::RoomNotFound(_) => StatusCode::BAD_REQUEST,
            SignalingError::ContentionExceeded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SignalingError::Store(_) | SignalingError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<SignalingError> for ApiError {
    fn from(err: SignalingError) -> Self {
        Self(err)
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self(SignalingError::Validation(err))
    }
}
