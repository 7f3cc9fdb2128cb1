use crate::error::{DeleteError, WriteError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Failure half of the `{success, message, ...}` envelope.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(&'static str),
    Internal {
        message: &'static str,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn internal(message: &'static str, detail: impl ToString) -> Self {
        Self::Internal {
            message,
            detail: Some(detail.to_string()),
        }
    }

    /// Maps a write-path failure; `failure_message` names the operation.
    pub fn from_write(err: WriteError, failure_message: &'static str) -> Self {
        match err {
            WriteError::MissingField(field) => Self::BadRequest(format!("{} is required", field)),
            WriteError::NotFound(_) => Self::NotFound("Product not found"),
            WriteError::ImageUploadFailed { .. } => Self::Internal {
                message: "Failed to upload some images",
                detail: None,
            },
            WriteError::PersistenceFailed(detail) => Self::internal(failure_message, detail),
        }
    }
}

impl From<DeleteError> for ApiError {
    fn from(err: DeleteError) -> Self {
        match err {
            DeleteError::NotFound(_) => Self::NotFound("Product not found"),
            DeleteError::PersistenceFailed(detail) => {
                Self::internal("Failed to delete product", detail)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": message }),
            ),
            Self::Internal { message, detail } => {
                let mut body = json!({ "success": false, "message": message });
                if let Some(detail) = detail {
                    body["error"] = Value::String(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Success envelope: `success`, `message`, plus any extra top-level keys.
pub fn success(status: StatusCode, message: &str, extra: Value) -> Response {
    let mut body = json!({ "success": true, "message": message });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_errors_map_to_statuses() {
        let cases = [
            (WriteError::MissingField("name"), StatusCode::BAD_REQUEST),
            (WriteError::NotFound(uuid::Uuid::nil()), StatusCode::NOT_FOUND),
            (
                WriteError::ImageUploadFailed { failed: 1, total: 2 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                WriteError::PersistenceFailed("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from_write(err, "Failed to create product").into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_persistence_failure_keeps_detail() {
        let err = ApiError::from_write(
            WriteError::PersistenceFailed("connection reset".to_string()),
            "Failed to update product",
        );

        match err {
            ApiError::Internal { message, detail } => {
                assert_eq!(message, "Failed to update product");
                assert_eq!(detail.as_deref(), Some("connection reset"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
