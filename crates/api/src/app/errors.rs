//! Consistent JSON error responses.
//!
//! Every error body is `{"error": <stable code>, "message": <human text>}`.
//! The codes are the machine-readable contract; the messages keep the Spanish
//! texts the frontend already displays. Internal failures are logged with
//! detail and returned redacted.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use goodjob_store::StoreError;

use crate::identity::IdentityError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    AuthRequired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Duplicate email/RUT. Kept at HTTP 400, matching what the frontend
    /// expects, but distinguishable by code.
    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "authentication_required",
                "No token".to_string(),
            ),
            ApiError::InvalidToken(detail) => {
                (StatusCode::UNAUTHORIZED, "invalid_token", detail)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Error interno".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Documento no encontrado".to_string()),
            StoreError::Duplicate(field) => ApiError::Conflict(duplicate_message(&field)),
            StoreError::Internal(detail) => ApiError::Internal(anyhow::anyhow!(detail)),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => {
                ApiError::Conflict("El correo ya está registrado.".to_string())
            }
            IdentityError::NotFound => ApiError::NotFound("Cuenta no encontrada".to_string()),
            IdentityError::Provider(detail) => ApiError::Internal(anyhow::anyhow!(detail)),
        }
    }
}

/// Spanish duplicate-field messages the frontend matches on.
pub fn duplicate_message(field: &str) -> String {
    match field {
        "rut" => "El RUT ya está registrado.".to_string(),
        "correo" => "El correo ya está registrado.".to_string(),
        other => format!("Valor duplicado para '{other}'."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rut_maps_to_frontend_message() {
        let err: ApiError = StoreError::Duplicate("rut".to_string()).into();
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "El RUT ya está registrado."),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn email_taken_maps_to_conflict() {
        let err: ApiError = IdentityError::EmailTaken.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
