use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Row '{0}' not found in table '{1}'")]
    RowNotFound(String, String),

    #[error("Field '{0}' not found in table '{1}'")]
    FieldNotFound(String, String),

    #[error("Unrecognized path: {0}")]
    UnrecognizedPath(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl serde::Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Syntax(_)
            | ApiError::Schema(_)
            | ApiError::FieldNotFound(_, _)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::TableNotFound(_)
            | ApiError::RowNotFound(_, _)
            | ApiError::UnrecognizedPath(_) => StatusCode::NOT_FOUND,
            ApiError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::InvalidDataset(_) | ApiError::IoError(_) | ApiError::JsonError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ApiError::TableNotFound("person".to_string());
        assert_eq!(err.to_string(), "Table 'person' not found");

        let err = ApiError::RowNotFound("p1".to_string(), "person".to_string());
        assert_eq!(err.to_string(), "Row 'p1' not found in table 'person'");

        let err = ApiError::Syntax("unexpected token".to_string());
        assert_eq!(err.to_string(), "Syntax error: unexpected token");

        let err = ApiError::Unsupported("LIKE".to_string());
        assert_eq!(err.to_string(), "Operation not supported: LIKE");
    }

    #[test]
    fn test_api_result_type() {
        let ok_result: ApiResult<i32> = Ok(42);
        assert_eq!(ok_result.unwrap(), 42);

        let err_result: ApiResult<i32> = Err(ApiError::Validation("test".to_string()));
        assert!(err_result.is_err());
    }
}
