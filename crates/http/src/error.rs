//! Error handling for the carzone HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carzone_db::StoreError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub details: Vec<serde_json::Value>,
    pub message: String,
    pub code: String,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Identifier in the path that the store cannot parse
    pub fn invalid_identifier(raw: &str) -> Self {
        Self::BadRequest {
            message: format!("'{}' is not a valid identifier", raw),
            code: "invalid_identifier".to_string(),
        }
    }

    /// Required query parameter was not supplied
    pub fn missing_parameter(name: &str) -> Self {
        Self::BadRequest {
            message: format!("query parameter '{}' is required", name),
            code: "missing_parameter".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIdentifier(raw) => Self::invalid_identifier(&raw),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, error_code, message) = match self {
            AppError::BadRequest { message, code } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
                format!("{:#}", e),
            ),
        };

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            message = %message,
            "Request error"
        );

        // Internal details stay in the logs for release builds
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let error_response = json!({
            "error": ErrorBody {
                details: Vec::new(),
                message,
                code: error_code,
                trace_id: error_id.to_string(),
                timestamp,
            }
        });

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_response_mapping() {
        let response = AppError::missing_parameter("email").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let error = AppError::Internal(internal_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_mapping() {
        let invalid = AppError::from(StoreError::InvalidIdentifier("abc".into()));
        assert!(matches!(
            invalid,
            AppError::BadRequest { ref code, .. } if code == "invalid_identifier"
        ));

        let backend = AppError::from(StoreError::Backend("connection reset".into()));
        assert!(matches!(backend, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::invalid_identifier("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        let error = &body["error"];
        assert_eq!(error["code"], "invalid_identifier");
        assert_eq!(error["message"], "'nope' is not a valid identifier");
        assert_eq!(error["details"], serde_json::json!([]));
        assert!(error["trace_id"]
            .as_str()
            .is_some_and(|id| Uuid::parse_str(id).is_ok()));
        assert!(error["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_missing_parameter_format() {
        let body = body_json(AppError::missing_parameter("email").into_response()).await;
        assert_eq!(body["error"]["code"], "missing_parameter");
    }
}
