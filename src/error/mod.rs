//! Centralized API error handling for the users gateway
//!
//! This module provides the closed set of failures a request can end in, with
//! HTTP status code mapping and the JSON envelope returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ApiResponse, ErrorBody, Record};
use crate::store::StoreError;

/// Users API operation, used to shape failure responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Create,
    Replace,
    Patch,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Replace => "replace",
            Operation::Patch => "patch",
            Operation::Delete => "delete",
        }
    }

    /// Message returned when the backend call fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::List => "Error retrieving users",
            Operation::Read => "Error retrieving user",
            Operation::Create => "Error creating user",
            Operation::Replace | Operation::Patch => "Error updating user",
            Operation::Delete => "Error deleting user",
        }
    }

    /// Whether the operation addresses a single record by id
    pub fn targets_record(&self) -> bool {
        !matches!(self, Operation::List | Operation::Create)
    }
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request body is required")]
    MissingBody,

    #[error("Request body must be a JSON object")]
    MalformedBody,

    #[error("Request body could not be read")]
    UnreadableBody,

    #[error("Content-Type must be application/json or application/x-www-form-urlencoded")]
    UnsupportedMediaType,

    #[error("Request body is too large")]
    PayloadTooLarge,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid user id")]
    InvalidId,

    #[error("User not found")]
    NotFound,

    #[error("{}", .operation.failure_message())]
    Backend {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Map a store failure for `operation` onto the boundary taxonomy
    pub fn from_store(operation: Operation, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) if operation.targets_record() => ApiError::NotFound,
            StoreError::InvalidId(_) => ApiError::InvalidId,
            source => ApiError::Backend { operation, source },
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingBody
            | ApiError::MalformedBody
            | ApiError::UnreadableBody
            | ApiError::MissingField(_)
            | ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let error = match &self {
            ApiError::Backend { operation, source } => {
                tracing::error!(
                    operation = operation.as_str(),
                    code = source.code(),
                    error = %source,
                    "Backend call failed"
                );
                Some(ErrorBody {
                    code: source.code().to_string(),
                    message: source.summary(),
                })
            }
            _ => {
                tracing::debug!(status = %status.as_u16(), error = %message, "Request rejected");
                None
            }
        };

        let body = ApiResponse::<Record> {
            message,
            data: None,
            error,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
