//! Uniform response envelope
//!
//! Every endpoint answers with `{status, message, data}`. Successful
//! cascades put the summary mapping in `data`; failures carry `data: null`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Message sent with every successful response
pub const SUCCESS_MESSAGE: &str = "Your request is successfully executed";

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `SUCCESS`, `FAILURE`, `VALIDATION_ERROR`, `BAD_REQUEST`, `UNAUTHORIZED`
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}
