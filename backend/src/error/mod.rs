//! Centralized API error handling for Loanbook
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::debt::DebtError;
use crate::validation::{LoanRejection, PaymentRejection, Rejection};

/// One failed check, attributed to a request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
    pub message: String,
}

impl Violation {
    pub fn from_rejection<R: Rejection>(rejection: &R) -> Self {
        Self {
            field: rejection.field().to_string(),
            reason: rejection.reason().to_string(),
            message: rejection.to_string(),
        }
    }
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<Violation>),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Violation>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Forbidden and validation errors carry their
    /// detail verbatim.
    fn public_message(&self) -> String {
        match self {
            ApiError::Forbidden(detail) => detail.clone(),
            ApiError::Validation(_) => "Validation failed".to_string(),
            ApiError::DatabaseError(_) => "Database error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let public_message = self.public_message();
        let reasons = match self {
            ApiError::Validation(violations) => violations,
            _ => Vec::new(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: public_message,
                reasons,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from common error types

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut violations: Vec<Violation> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| Violation {
                    field: field.to_string(),
                    reason: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::Validation(violations)
    }
}

/// Body that could not be turned into the request type. The offending field
/// is recovered from the deserializer's message where it names one.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        let violation = match &rejection {
            JsonRejection::JsonDataError(_) => match missing_field(&detail) {
                Some(field) => Violation {
                    message: format!("{} is required", field),
                    field,
                    reason: "missing_field".to_string(),
                },
                None => Violation {
                    field: offending_path(&detail).unwrap_or_else(|| "body".to_string()),
                    reason: "invalid_value".to_string(),
                    message: detail.clone(),
                },
            },
            JsonRejection::MissingJsonContentType(_) => Violation {
                field: "body".to_string(),
                reason: "unsupported_content_type".to_string(),
                message: detail.clone(),
            },
            _ => Violation {
                field: "body".to_string(),
                reason: "malformed_json".to_string(),
                message: detail.clone(),
            },
        };

        ApiError::Validation(vec![violation])
    }
}

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

fn missing_field(detail: &str) -> Option<String> {
    let rest = &detail[detail.find("missing field ")? + "missing field ".len()..];
    let name: String = rest
        .trim_start_matches(['`', '\''])
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// `principal: invalid value ...` yields `principal`
fn offending_path(detail: &str) -> Option<String> {
    let rest = detail.strip_prefix(JSON_DATA_PREFIX).unwrap_or(detail);
    let (path, _) = rest.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}

/// A path segment that is not a well-formed id cannot name a record
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                ApiError::NotFound("Resource not found".to_string())
            }
            other => ApiError::InternalError(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![Violation {
            field: "query".to_string(),
            reason: "invalid_query".to_string(),
            message: rejection.body_text(),
        }])
    }
}

impl From<PaymentRejection> for ApiError {
    fn from(rejection: PaymentRejection) -> Self {
        ApiError::Validation(vec![Violation::from_rejection(&rejection)])
    }
}

impl From<LoanRejection> for ApiError {
    fn from(rejection: LoanRejection) -> Self {
        ApiError::Validation(vec![Violation::from_rejection(&rejection)])
    }
}

impl From<Vec<LoanRejection>> for ApiError {
    fn from(rejections: Vec<LoanRejection>) -> Self {
        ApiError::Validation(rejections.iter().map(Violation::from_rejection).collect())
    }
}

impl From<DebtError> for ApiError {
    fn from(err: DebtError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::Forbidden("test".to_string()).error_code(),
            "FORBIDDEN"
        );
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(ApiError::Validation(vec![]).error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DatabaseError("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_payment_rejection_carries_reason() {
        match ApiError::from(PaymentRejection::PredatesOrigination) {
            ApiError::Validation(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "payment_date");
                assert_eq!(violations[0].reason, "payment_predates_origination");
                assert_eq!(violations[0].message, "payment predates loan origination");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_loan_rejections_aggregate() {
        let err = ApiError::from(vec![
            LoanRejection::NonPositivePrincipal,
            LoanRejection::NonPositiveRate,
        ]);
        assert!(err.to_string().contains("principal must be greater than zero"));
        assert!(err.to_string().contains("rate must be greater than zero"));
    }

    #[test]
    fn test_missing_field_named() {
        let detail = format!("{}missing field `payment_date` at line 1 column 40", JSON_DATA_PREFIX);
        assert_eq!(missing_field(&detail).as_deref(), Some("payment_date"));
        assert_eq!(missing_field("trailing characters"), None);
    }

    #[test]
    fn test_offending_path_named() {
        let detail = format!("{}principal: invalid digit found in string at line 1 column 20", JSON_DATA_PREFIX);
        assert_eq!(offending_path(&detail).as_deref(), Some("principal"));
        assert_eq!(offending_path("expected value at line 1 column 1"), None);
    }
}
