use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::store::Table;

#[derive(Debug, ThisError)]
pub enum NrcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Malformed {file} at line {line}: {reason}")]
    MalformedCsv {
        file: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Malformed cell {column} in {table}: {reason}")]
    MalformedCell {
        table: Table,
        column: String,
        reason: String,
    },

    #[error("Unknown column {column} for {table}")]
    UnknownColumn { table: Table, column: String },

    #[error("Store actor error: {0}")]
    StoreUnavailable(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing or invalid admin key")]
    Unauthorized,

    #[error("Too many login attempts")]
    RateLimited,
}

impl NrcError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        NrcError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        NrcError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        NrcError::Conflict(msg.into())
    }
}

impl IntoResponse for NrcError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            NrcError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            NrcError::Validation(_)
            | NrcError::UnknownColumn { .. }
            | NrcError::Json(_)
            | NrcError::Body(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", self.to_string()),
            NrcError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", self.to_string()),
            NrcError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", self.to_string())
            }
            NrcError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            NrcError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT",
                self.to_string(),
            ),
            NrcError::Io(_)
            | NrcError::DatabaseError(_)
            | NrcError::MalformedCsv { .. }
            | NrcError::MalformedCell { .. }
            | NrcError::StoreUnavailable(_) => {
                error!(error = %self, "request failed on storage");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
