//! HTTP error responses: JSON for the API, HTML pages for the browser.

use std::collections::BTreeMap;

use askama::Template;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::TodosError;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized Access";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Password and password verification do not match";
pub const DUPLICATE_USER_MESSAGE: &str = "User with that username already exists";

/// Errors returned by the `/api/v1` endpoints.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed fields, keyed by field name.
    Validation(BTreeMap<&'static str, String>),
    PasswordMismatch,
    BadRequest(String),
    Unauthenticated,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::PasswordMismatch | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TodosError> for ApiError {
    fn from(err: TodosError) -> Self {
        match err {
            TodosError::AlreadyExists { .. } => ApiError::Conflict(DUPLICATE_USER_MESSAGE.into()),
            TodosError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(fields) => (status, Json(json!({ "message": fields }))).into_response(),
            ApiError::PasswordMismatch => {
                (status, Json(json!({ "error": PASSWORD_MISMATCH_MESSAGE }))).into_response()
            }
            ApiError::Conflict(message) => (status, Json(json!({ "error": message }))).into_response(),
            ApiError::Unauthenticated => (
                status,
                [(
                    header::WWW_AUTHENTICATE,
                    "Basic realm=\"Authentication Required\"",
                )],
                Json(json!({ "message": UNAUTHORIZED_MESSAGE })),
            )
                .into_response(),
            ApiError::BadRequest(message) | ApiError::NotFound(message) => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Internal(reason) => {
                tracing::error!(%reason, "api request failed");
                (status, Json(json!({ "message": "internal server error" }))).into_response()
            }
        }
    }
}

/// Errors returned by the browser routes, rendered as an HTML page.
#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<TodosError> for WebError {
    fn from(err: TodosError) -> Self {
        let status = match &err {
            TodosError::NotFound { .. } => StatusCode::NOT_FOUND,
            TodosError::AlreadyExists { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), message = %self.message, "page request failed");
        }
        let message = if self.status.is_server_error() {
            "Something went wrong."
        } else {
            self.message.as_str()
        };
        let template = super::templates::ErrorTemplate {
            message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, message.to_string()).into_response(),
        }
    }
}
