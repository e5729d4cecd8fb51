use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::parsing::ParseError;
use crate::scoring::ScoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            ParseError::CorruptDocument(msg) => AppError::CorruptDocument(msg),
            ParseError::InvalidConfig(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<ScoreError> for AppError {
    fn from(e: ScoreError) -> Self {
        match e {
            ScoreError::InvalidWeights(msg) => AppError::InvalidWeights(msg),
            ScoreError::EmbeddingUnavailable(inner) => {
                AppError::EmbeddingUnavailable(inner.to_string())
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("malformed multipart body: {}", e.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl AppError {
    /// Stable machine-readable code, also used for per-item bulk failures.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
            AppError::InvalidWeights(_) => "INVALID_WEIGHTS",
            AppError::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::CorruptDocument(_) | AppError::InvalidWeights(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::EmbeddingUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to a client. Internal details are logged instead.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::UnsupportedFormat(msg)
            | AppError::CorruptDocument(msg)
            | AppError::InvalidWeights(msg)
            | AppError::Timeout(msg) => msg.clone(),
            AppError::EmbeddingUnavailable(msg) => {
                tracing::error!("Embedding error: {msg}");
                "The semantic encoder is unavailable".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (AppError::from(ParseError::UnsupportedFormat("rtf".into())), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (AppError::from(ParseError::CorruptDocument("bad".into())), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::from(ScoreError::InvalidWeights("neg".into())), StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::from(ScoreError::EmbeddingUnavailable(EmbeddingError::Unusable("down".into()))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::CorruptDocument("not a PDF".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "CORRUPT_DOCUMENT");
        assert_eq!(body["error"]["message"], "not a PDF");
    }
}
