// src/error.rs
//! HTTP-facing errors for the RSS jobs API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feeds::AggregateError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, blank or unconfigured `country`.
    #[error("Invalid country")]
    InvalidCountry,
    #[error("Failed to fetch RSS jobs")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<AggregateError> for ApiError {
    fn from(e: AggregateError) -> Self {
        match e {
            AggregateError::InvalidCountry(_) => ApiError::InvalidCountry,
            AggregateError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            ApiError::InvalidCountry => (StatusCode::BAD_REQUEST, None),
            ApiError::Internal(msg) => {
                tracing::error!(target: "rss_jobs", error = %msg, "critical error in rss jobs api");
                (StatusCode::INTERNAL_SERVER_ERROR, Some(msg.clone()))
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
