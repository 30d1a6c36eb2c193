//! Crate-wide error taxonomy and its HTTP mapping.
//!
//! Every ledger, arbitration, and storage failure funnels into
//! [`PalmaresError`] and is translated exactly once, at the axum boundary,
//! into a JSON body with a stable machine-checkable `error` kind and a
//! human-readable `message`. Storage detail is logged server-side and never
//! leaks into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PalmaresError>;

#[derive(Debug, Error)]
pub enum PalmaresError {
    /// No credential, or a presented credential did not resolve to a session.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Role or ownership check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input: missing fields, stake out of range, bad amounts.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Lost a state race, e.g. a second best-answer selection.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Conditional gem debit refused; carries the shortfall for the caller.
    #[error("insufficient gem balance: required {required}, current {current}")]
    InsufficientGems { required: i64, current: i64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl PalmaresError {
    pub fn storage(message: impl Into<String>) -> Self {
        PalmaresError::Storage(message.into())
    }

    /// Stable identifier checked by API clients; never renamed.
    pub fn kind(&self) -> &'static str {
        match self {
            PalmaresError::Authentication(_) => "authentication_error",
            PalmaresError::Forbidden(_) => "authorization_error",
            PalmaresError::NotFound(_) => "not_found",
            PalmaresError::Validation(_) => "validation_error",
            PalmaresError::Conflict(_) => "conflict",
            PalmaresError::InsufficientGems { .. } => "insufficient_gems",
            PalmaresError::Storage(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PalmaresError::Authentication(_) => StatusCode::UNAUTHORIZED,
            PalmaresError::Forbidden(_) => StatusCode::FORBIDDEN,
            PalmaresError::NotFound(_) => StatusCode::NOT_FOUND,
            PalmaresError::Validation(_) => StatusCode::BAD_REQUEST,
            PalmaresError::Conflict(_) => StatusCode::CONFLICT,
            PalmaresError::InsufficientGems { .. } => StatusCode::BAD_REQUEST,
            PalmaresError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for PalmaresError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => PalmaresError::NotFound("record not found".to_string()),
            other => PalmaresError::Storage(format!("database error: {}", other)),
        }
    }
}

impl IntoResponse for PalmaresError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Storage detail stays in the logs.
            PalmaresError::Storage(detail) => {
                tracing::error!(detail = %detail, "storage failure surfaced to client");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let mut body = json!({
            "error": self.kind(),
            "message": message,
        });
        if let PalmaresError::InsufficientGems { required, current } = &self {
            body["required"] = json!(required);
            body["current"] = json!(current);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(PalmaresError::Authentication("x".into()).kind(), "authentication_error");
        assert_eq!(PalmaresError::Forbidden("x".into()).kind(), "authorization_error");
        assert_eq!(PalmaresError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(PalmaresError::Validation("x".into()).kind(), "validation_error");
        assert_eq!(PalmaresError::Conflict("x".into()).kind(), "conflict");
        assert_eq!(
            PalmaresError::InsufficientGems { required: 8, current: 5 }.kind(),
            "insufficient_gems"
        );
        assert_eq!(PalmaresError::Storage("x".into()).kind(), "internal_error");
    }

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            PalmaresError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(PalmaresError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PalmaresError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PalmaresError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PalmaresError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            PalmaresError::InsufficientGems { required: 8, current: 5 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PalmaresError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: PalmaresError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, PalmaresError::NotFound(_)));
    }

    #[test]
    fn test_shortfall_is_reported_in_message() {
        let err = PalmaresError::InsufficientGems { required: 8, current: 5 };
        let text = err.to_string();
        assert!(text.contains("required 8"));
        assert!(text.contains("current 5"));
    }
}
