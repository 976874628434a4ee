use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clipdex_core::CatalogError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The catalog could not be fetched or parsed (503).
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match self {
            ApiError::CatalogUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CATALOG_UNAVAILABLE")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };
        let message = self.to_string();
        if status.is_server_error() {
            error!("{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
